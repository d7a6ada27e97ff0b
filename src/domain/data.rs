//! Read-only, indexed, serializable access to definition data.

use serde::Serialize;
use serde_json::Value;

use crate::domain::error::{DomainError, DomainResult};

/// Uniform read-only view over a survey container.
///
/// `QuestionSet` looks up questions, `Question` and `Answer` look up raw
/// definition fields. Writes always fail: trees are immutable after build.
pub trait DefinitionData: Serialize {
    type Item<'v>
    where
        Self: 'v;

    fn lookup<'v>(&'v self, key: &str) -> Option<Self::Item<'v>>;

    fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    fn assign(&self, key: &str, _value: Value) -> DomainResult<()> {
        Err(DomainError::ReadOnly {
            key: key.to_string(),
        })
    }

    fn remove(&self, key: &str) -> DomainResult<()> {
        Err(DomainError::ReadOnly {
            key: key.to_string(),
        })
    }

    /// Nested JSON form, children in tree order.
    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
