//! Directory-backed definition and export sources
//!
//! Layout of one survey snapshot:
//!
//! ```text
//! <root>/<survey>/questions.json   nested definitions, or flat rows with answers.json
//! <root>/<survey>/answers.json     optional; switches questions.json to flat rows
//! <root>/<survey>/responses.csv    delimited export text
//! <root>/<survey>/responses.b64    base64 envelope around the export text
//! <root>/<survey>/responses.json   already flat rows
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    natural_sort_by_key, AnswerDef, DefinitionPayload, FlatRecord, OrderedMap, QuestionDef,
};
use crate::infrastructure::traits::{
    DefinitionSource, ExportPayload, ExportSource, FileSystem, RealFileSystem,
};
use crate::util::path::is_safe_survey_id;

pub const QUESTIONS_FILE: &str = "questions.json";
pub const ANSWERS_FILE: &str = "answers.json";
pub const RESPONSES_CSV: &str = "responses.csv";
pub const RESPONSES_B64: &str = "responses.b64";
pub const RESPONSES_JSON: &str = "responses.json";

/// Reads survey snapshots from one directory per survey.
pub struct DirectorySource {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_fs(root, Arc::new(RealFileSystem))
    }

    pub fn with_fs(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of `survey`, which must exist.
    pub fn survey_dir(&self, survey: &str) -> ApplicationResult<PathBuf> {
        if !is_safe_survey_id(survey) {
            return Err(ApplicationError::SurveyNotFound(survey.to_string()));
        }
        let dir = self.root.join(survey);
        if !self.fs.is_dir(&dir) {
            debug!("survey_dir: missing {}", dir.display());
            return Err(ApplicationError::SurveyNotFound(survey.to_string()));
        }
        Ok(dir)
    }

    /// Survey ids available under the root, i.e. directories with a definition file.
    pub fn surveys(&self) -> ApplicationResult<Vec<String>> {
        let entries = self
            .fs
            .list_dir(&self.root)
            .with_path_context("list surveys", &self.root)?;
        let mut surveys: Vec<String> = entries
            .into_iter()
            .filter(|path| self.fs.is_file(&path.join(QUESTIONS_FILE)))
            .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        natural_sort_by_key(&mut surveys, |s| s.as_str());
        Ok(surveys)
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> ApplicationResult<T> {
        let content = self.fs.read_to_string(path).with_path_context("read", path)?;
        serde_json::from_str(&content).with_path_context("parse", path)
    }
}

impl DefinitionSource for DirectorySource {
    #[instrument(level = "debug", skip(self))]
    fn definitions(&self, survey: &str) -> ApplicationResult<DefinitionPayload> {
        let dir = self.survey_dir(survey)?;
        let questions_path = dir.join(QUESTIONS_FILE);
        if !self.fs.is_file(&questions_path) {
            return Err(ApplicationError::SurveyNotFound(survey.to_string()));
        }
        let questions: Vec<QuestionDef> = self.read_json(&questions_path)?;

        let answers_path = dir.join(ANSWERS_FILE);
        if self.fs.is_file(&answers_path) {
            let answers: Vec<AnswerDef> = self.read_json(&answers_path)?;
            debug!(
                questions = questions.len(),
                answers = answers.len(),
                "flat definition rows"
            );
            return Ok(DefinitionPayload::Flat { questions, answers });
        }

        debug!(questions = questions.len(), "nested definitions");
        Ok(DefinitionPayload::Nested(questions))
    }
}

impl ExportSource for DirectorySource {
    #[instrument(level = "debug", skip(self))]
    fn export(&self, survey: &str) -> ApplicationResult<ExportPayload> {
        let dir = self.survey_dir(survey)?;

        let csv_path = dir.join(RESPONSES_CSV);
        if self.fs.is_file(&csv_path) {
            let raw = self.fs.read(&csv_path).with_path_context("read", &csv_path)?;
            return Ok(ExportPayload::Bytes(raw));
        }

        let b64_path = dir.join(RESPONSES_B64);
        if self.fs.is_file(&b64_path) {
            let encoded = self
                .fs
                .read_to_string(&b64_path)
                .with_path_context("read", &b64_path)?;
            return Ok(ExportPayload::Encoded(encoded));
        }

        let json_path = dir.join(RESPONSES_JSON);
        if self.fs.is_file(&json_path) {
            let rows: Vec<OrderedMap<Value>> = self.read_json(&json_path)?;
            return Ok(ExportPayload::Rows(rows.into_iter().map(flatten_row).collect()));
        }

        Err(ApplicationError::OperationFailed {
            context: format!("no response export in {}", dir.display()),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "expected responses.csv, responses.b64 or responses.json",
            )),
        })
    }
}

/// JSON row values as export strings: `null` is empty, scalars print as-is.
fn flatten_row(row: OrderedMap<Value>) -> FlatRecord {
    row.into_iter()
        .map(|(column, value)| {
            let text = match value {
                Value::Null => String::new(),
                Value::String(s) => s,
                other => other.to_string(),
            };
            (column, text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_row_stringifies_scalars() {
        let row: OrderedMap<Value> =
            serde_json::from_str(r#"{"id": 3, "Q1": null, "Q2": "Y", "Q3": true}"#).unwrap();
        let record = flatten_row(row);
        assert_eq!(record.id(), Some("3"));
        assert_eq!(record.get("Q1"), Some(""));
        assert_eq!(record.get("Q3"), Some("true"));
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["id", "Q1", "Q2", "Q3"]);
    }

    #[test]
    fn test_unsafe_survey_id_is_not_found() {
        let source = DirectorySource::new("/nonexistent");
        assert!(matches!(
            source.survey_dir("../x"),
            Err(ApplicationError::SurveyNotFound(_))
        ));
    }
}
