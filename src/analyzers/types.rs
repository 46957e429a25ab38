//! Data types used by the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One reduced value per group key.
pub type Summary = BTreeMap<String, f64>;

/// A validated `(key, value)` pair ready to be folded into an accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: String,
    pub value: f64,
}

impl Record {
    /// Builds a record from raw text fields.
    ///
    /// Returns `None` when the trimmed key is empty or the trimmed value is not
    /// a finite number.
    pub fn parse(key: &str, raw: &str) -> Option<Self> {
        let key = valid_key(key)?;
        let value = parse_finite(raw)?;
        Some(Self {
            key: key.to_string(),
            value,
        })
    }

    /// Builds a record whose value is `a * b`, e.g. quantity times unit price.
    pub fn from_product(key: &str, a: &str, b: &str) -> Option<Self> {
        let key = valid_key(key)?;
        let value = parse_finite(a)? * parse_finite(b)?;
        if !value.is_finite() {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            value,
        })
    }
}

fn valid_key(key: &str) -> Option<&str> {
    let key = key.trim();
    (!key.is_empty()).then_some(key)
}

/// Parses a decimal number, rejecting `NaN` and infinities.
pub fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// How the values collected for one group collapse into a single number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    Mean,
    Sum,
    Min,
    Max,
    Count,
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reduction::Mean => "mean",
            Reduction::Sum => "sum",
            Reduction::Min => "min",
            Reduction::Max => "max",
            Reduction::Count => "count",
        };
        f.write_str(name)
    }
}

/// A reduced group together with the number of values that contributed to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: String,
    pub value: f64,
    pub count: usize,
}

/// Frequency of one category value within a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareRow {
    pub key: String,
    pub count: usize,
    pub percent: f64,
}

/// Serialized result of one aggregation run.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub reduction: Reduction,
    pub groups: Vec<GroupRow>,
}

impl SummaryReport {
    pub fn new(source: impl Into<String>, reduction: Reduction, groups: Vec<GroupRow>) -> Self {
        Self {
            generated_at: Utc::now(),
            source: source.into(),
            reduction,
            groups,
        }
    }

    /// Flattens the report into one history line per group.
    pub fn history_rows(&self) -> impl Iterator<Item = HistoryRow<'_>> {
        self.groups.iter().map(|group| HistoryRow {
            generated_at: self.generated_at,
            source: &self.source,
            reduction: self.reduction,
            key: &group.key,
            value: group.value,
            count: group.count,
        })
    }
}

/// One line of a run history CSV, appended after every run.
#[derive(Debug, Serialize)]
pub struct HistoryRow<'a> {
    pub generated_at: DateTime<Utc>,
    pub source: &'a str,
    pub reduction: Reduction,
    pub key: &'a str,
    pub value: f64,
    pub count: usize,
}
