//! Raw survey definition rows as supplied by a definition source.
//!
//! Ids arrive as JSON numbers or strings depending on the backend, so they
//! are normalised to strings on the way in. Every field the model does not
//! name is kept in `extra` and written back out unchanged.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Question type code of multiple choice questions.
pub const MULTIPLE_CHOICE_TYPE: &str = "M";

/// Question type code of dual-scale array questions; their answers sort by `scale_id`.
pub const DUAL_SCALE_TYPE: &str = "1";

/// Marker value of a selected multiple choice option.
pub const SELECTED: &str = "Y";

/// A question or sub-question definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDef {
    #[serde(deserialize_with = "id_string")]
    pub qid: String,
    #[serde(default, deserialize_with = "opt_id_string", skip_serializing_if = "Option::is_none")]
    pub parent_qid: Option<String>,
    #[serde(default, deserialize_with = "id_string")]
    pub title: String,
    #[serde(rename = "type", default)]
    pub qtype: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subquestions: Vec<QuestionDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answers: Vec<AnswerDef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuestionDef {
    pub fn new(qid: impl Into<String>, title: impl Into<String>, qtype: impl Into<String>) -> Self {
        Self {
            qid: qid.into(),
            parent_qid: None,
            title: title.into(),
            qtype: qtype.into(),
            subquestions: Vec::new(),
            answers: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_subquestion(mut self, sub: QuestionDef) -> Self {
        self.subquestions.push(sub);
        self
    }

    pub fn with_answer(mut self, answer: AnswerDef) -> Self {
        self.answers.push(answer);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// True when the row has no parent (`parent_qid` absent, empty or `0`).
    pub fn is_top_level(&self) -> bool {
        matches!(self.parent_qid.as_deref(), None | Some("") | Some("0"))
    }

    /// Scalar fields of the row, without nested children.
    pub(crate) fn raw_fields(&self) -> Map<String, Value> {
        let mut raw = Map::new();
        raw.insert("qid".into(), Value::String(self.qid.clone()));
        if let Some(parent) = &self.parent_qid {
            raw.insert("parent_qid".into(), Value::String(parent.clone()));
        }
        raw.insert("title".into(), Value::String(self.title.clone()));
        raw.insert("type".into(), Value::String(self.qtype.clone()));
        for (k, v) in &self.extra {
            raw.insert(k.clone(), v.clone());
        }
        raw
    }
}

/// An answer option of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerDef {
    #[serde(default, deserialize_with = "opt_id_string", skip_serializing_if = "Option::is_none")]
    pub aid: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string", skip_serializing_if = "Option::is_none")]
    pub qid: Option<String>,
    #[serde(deserialize_with = "id_string")]
    pub code: String,
    #[serde(default, deserialize_with = "opt_id_string", skip_serializing_if = "Option::is_none")]
    pub scale_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnswerDef {
    pub fn new(aid: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            aid: Some(aid.into()),
            qid: None,
            code: code.into(),
            scale_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_scale(mut self, scale_id: impl Into<String>) -> Self {
        self.scale_id = Some(scale_id.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub(crate) fn raw_fields(&self) -> Map<String, Value> {
        let mut raw = Map::new();
        if let Some(aid) = &self.aid {
            raw.insert("aid".into(), Value::String(aid.clone()));
        }
        if let Some(qid) = &self.qid {
            raw.insert("qid".into(), Value::String(qid.clone()));
        }
        raw.insert("code".into(), Value::String(self.code.clone()));
        if let Some(scale) = &self.scale_id {
            raw.insert("scale_id".into(), Value::String(scale.clone()));
        }
        for (k, v) in &self.extra {
            raw.insert(k.clone(), v.clone());
        }
        raw
    }
}

/// Definitions as delivered by a definition source.
#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionPayload {
    /// Top-level questions with sub-questions and answers already attached.
    Nested(Vec<QuestionDef>),
    /// Flat question rows linked by `parent_qid`, plus answer rows linked by `qid`.
    Flat {
        questions: Vec<QuestionDef>,
        answers: Vec<AnswerDef>,
    },
}

fn value_to_id<E: de::Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(E::custom(format!("expected string or number id, got {}", other))),
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_id(value)?.unwrap_or_default())
}

fn opt_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value_to_id(value)
}
