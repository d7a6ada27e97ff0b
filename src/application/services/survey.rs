//! Survey service
//!
//! Fetches definitions and exports through the source traits and runs them
//! through the tree builder, the normalizer and the tabulator.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    decode_envelope, normalize_bytes, tabulate, AccessFilter, ChoiceOptions, Choices,
    FlatRecord, Parent, QuestionSet, TabulateOptions, Tabulation, TreeBuilder,
};
use crate::infrastructure::traits::{DefinitionSource, ExportPayload, ExportSource};

/// Human-readable label of a tabulated column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnLabel {
    pub column: String,
    /// `None` when the column does not resolve to a question
    pub label: Option<String>,
}

/// Service tying the sources to the survey core.
pub struct SurveyService {
    definitions: Arc<dyn DefinitionSource>,
    exports: Arc<dyn ExportSource>,
}

impl SurveyService {
    pub fn new(definitions: Arc<dyn DefinitionSource>, exports: Arc<dyn ExportSource>) -> Self {
        Self {
            definitions,
            exports,
        }
    }

    /// Question tree of `survey`; with a filter only matching top-level titles are kept.
    #[instrument(level = "debug", skip(self, filter))]
    pub fn questions(
        &self,
        survey: &str,
        filter: Option<&AccessFilter>,
    ) -> ApplicationResult<QuestionSet> {
        let payload = self.definitions.definitions(survey)?;
        let builder = match filter {
            Some(f) => TreeBuilder::new().with_filter(f.clone()),
            None => TreeBuilder::new(),
        };
        let set = builder.build_payload(payload)?;
        info!(survey, questions = set.len(), "loaded survey definition");
        Ok(set)
    }

    /// Normalized response records of `survey`.
    #[instrument(level = "debug", skip(self))]
    pub fn responses(
        &self,
        survey: &str,
        delimiter: Option<u8>,
    ) -> ApplicationResult<Vec<FlatRecord>> {
        let records = match self.exports.export(survey)? {
            ExportPayload::Bytes(raw) => normalize_bytes(&raw, delimiter)?,
            ExportPayload::Encoded(encoded) => {
                let raw = decode_envelope(&encoded)?;
                normalize_bytes(&raw, delimiter)?
            }
            ExportPayload::Rows(rows) => rows,
        };
        info!(survey, records = records.len(), "loaded responses");
        Ok(records)
    }

    /// The response of `survey` with id `response_id`.
    pub fn response(
        &self,
        survey: &str,
        response_id: &str,
        delimiter: Option<u8>,
    ) -> ApplicationResult<FlatRecord> {
        self.responses(survey, delimiter)?
            .into_iter()
            .find(|r| r.id() == Some(response_id))
            .ok_or_else(|| ApplicationError::ResponseNotFound(response_id.to_string()))
    }

    /// Frequency table of the responses of `survey`.
    #[instrument(level = "debug", skip(self, filter))]
    pub fn tabulate(
        &self,
        survey: &str,
        filter: &AccessFilter,
        options: TabulateOptions,
        delimiter: Option<u8>,
    ) -> ApplicationResult<Tabulation> {
        filter.validate()?;
        let records = self.responses(survey, delimiter)?;
        let tabulation = tabulate(&records, filter, options)?;
        debug!(columns = tabulation.len(), "tabulated");
        Ok(tabulation)
    }

    /// Multiple choice selections of one respondent for question `key` of `set`.
    ///
    /// `key` is a top-level qid or title, or any qid in the tree.
    #[instrument(level = "debug", skip(self, set, options))]
    pub fn choices<'s>(
        &self,
        set: &'s QuestionSet,
        survey: &str,
        key: &str,
        response_id: &str,
        options: ChoiceOptions,
        delimiter: Option<u8>,
    ) -> ApplicationResult<Choices<'s>> {
        let question = set
            .get(key)
            .or_else(|| set.find(key))
            .ok_or_else(|| ApplicationError::QuestionNotFound(key.to_string()))?;
        let response = self.response(survey, response_id, delimiter)?;
        Ok(question.multiple_choice(&response, options)?)
    }
}

/// Label every tabulated column with the question it resolves to in `set`.
///
/// Sub-question columns join the parent label and the sub-question label.
pub fn label_columns(set: &QuestionSet, tabulation: &Tabulation) -> Vec<ColumnLabel> {
    tabulation
        .columns()
        .map(|column| {
            let label = set.resolve_column(column).map(|q| {
                let mut parts = vec![q.label()];
                let mut current = q;
                while let Parent::Question(parent) = current.parent() {
                    parts.push(parent.label());
                    current = parent;
                }
                parts.reverse();
                parts.join(" / ")
            });
            ColumnLabel {
                column: column.to_string(),
                label,
            }
        })
        .collect()
}
