use serde::{Deserialize, Serialize};

use crate::domain::ordered::OrderedMap;

/// Name of the response id column of an export.
pub const ID_COLUMN: &str = "id";

/// One normalized export row: column name to value, in header order.
///
/// Column names may address a sub-question as `question[subquestion]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord {
    fields: OrderedMap<String>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column, value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// The response id, if the row has a non-empty one.
    pub fn id(&self) -> Option<&str> {
        self.get(ID_COLUMN).filter(|id| !id.is_empty())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k, v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Base name of a column: everything before the first `[`.
pub fn base_column(column: &str) -> &str {
    column.split('[').next().unwrap_or(column)
}
