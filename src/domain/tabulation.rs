//! Frequency and percentage tabulation of normalized responses.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::access::AccessFilter;
use crate::domain::error::DomainResult;
use crate::domain::natural::natural_cmp;
use crate::domain::ordered::OrderedMap;
use crate::domain::record::{base_column, FlatRecord};

/// Tabulation switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TabulateOptions {
    /// Skip values that are empty after trimming.
    pub ignore_blanks: bool,
    /// Order columns naturally instead of by first appearance.
    pub sort: bool,
}

impl Default for TabulateOptions {
    fn default() -> Self {
        Self {
            ignore_blanks: true,
            sort: false,
        }
    }
}

/// Occurrences of one value in one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub count: usize,
    pub percent: f64,
}

/// Counts for one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabulationEntry {
    /// Non-skipped occurrences of the column
    pub count: usize,
    /// Observed values in first-seen order
    pub vals: OrderedMap<ValueCount>,
}

impl TabulationEntry {
    fn record(&mut self, value: &str) {
        self.count += 1;
        self.vals
            .get_or_insert_with(value, || ValueCount {
                count: 0,
                percent: 0.0,
            })
            .count += 1;
    }

    fn finish(&mut self) {
        let total = self.count;
        for stat in self.vals.values_mut() {
            stat.percent = percent(stat.count, total);
        }
    }

    pub fn get(&self, value: &str) -> Option<&ValueCount> {
        self.vals.get(value)
    }
}

/// Tabulation of every allowed column, keyed by full column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tabulation {
    columns: OrderedMap<TabulationEntry>,
}

impl Tabulation {
    pub fn get(&self, column: &str) -> Option<&TabulationEntry> {
        self.columns.get(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TabulationEntry)> {
        self.columns.iter()
    }
}

/// Count values per column across `records`.
///
/// Inclusion is decided on the base column name (before any `[`), while
/// counts are kept under the full column name, so `Q1` and `Q1[SQ001]` are
/// distinct entries. Percentages are rounded per value to two decimals and
/// are not adjusted to add up to 100.
///
/// # Errors
/// Fails when the filter holds a pattern that does not compile.
#[instrument(level = "debug", skip(records, filter), fields(records = records.len()))]
pub fn tabulate(
    records: &[FlatRecord],
    filter: &AccessFilter,
    options: TabulateOptions,
) -> DomainResult<Tabulation> {
    let mut columns: OrderedMap<TabulationEntry> = OrderedMap::new();

    for record in records {
        for (column, value) in record.iter() {
            if options.ignore_blanks && value.trim().is_empty() {
                continue;
            }
            if !filter.is_allowed(base_column(column))? {
                continue;
            }
            columns
                .get_or_insert_with(column, TabulationEntry::default)
                .record(value);
        }
    }

    for entry in columns.values_mut() {
        entry.finish();
    }

    if options.sort {
        columns.sort_keys_by(natural_cmp);
    }

    debug!(columns = columns.len(), "tabulation complete");
    Ok(Tabulation { columns })
}

/// `count / total * 100`, rounded half away from zero to two decimals.
fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    // Exact ties like 23/160 = 14.375 are not representable as f64.
    let hundredths = (count as u128 * 20_000 / total as u128 + 1) / 2;
    hundredths as f64 / 100.0
}
