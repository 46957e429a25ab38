use crate::analyzers::types::{GroupRow, Record, Reduction, Summary};
use crate::analyzers::utility::{max, mean, min};
use std::collections::HashMap;
use tracing::trace;

/// Values collected per group key during a single scan of the input.
///
/// Keys are never overwritten: a repeated key appends to its group.
#[derive(Debug, Default)]
pub struct Accumulator {
    groups: HashMap<String, Vec<f64>>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        self.groups.entry(record.key).or_default().push(record.value);
    }

    /// Collapses every group with `reduction`, sorted by key.
    pub fn into_rows(self, reduction: Reduction) -> Vec<GroupRow> {
        let mut rows: Vec<GroupRow> = self
            .groups
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(key, values)| GroupRow {
                value: reduce(&values, reduction),
                count: values.len(),
                key,
            })
            .collect();
        rows.sort_by(|l, r| l.key.cmp(&r.key));
        rows
    }

    pub fn reduce(self, reduction: Reduction) -> Summary {
        self.into_rows(reduction)
            .into_iter()
            .map(|row| (row.key, row.value))
            .collect()
    }
}

impl Extend<Record> for Accumulator {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

impl FromIterator<Record> for Accumulator {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut acc = Accumulator::new();
        acc.extend(iter);
        acc
    }
}

fn reduce(values: &[f64], reduction: Reduction) -> f64 {
    match reduction {
        Reduction::Mean => mean(values),
        Reduction::Sum => values.iter().sum(),
        Reduction::Min => min(values).unwrap_or(0.0),
        Reduction::Max => max(values).unwrap_or(0.0),
        Reduction::Count => values.len() as f64,
    }
}

/// Validates raw `(key, value)` rows into records, dropping malformed ones.
pub fn valid_records<I, K, V>(rows: I) -> impl Iterator<Item = Record>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    rows.into_iter().filter_map(|(key, raw)| {
        let record = Record::parse(key.as_ref(), raw.as_ref());
        if record.is_none() {
            trace!(key = key.as_ref(), value = raw.as_ref(), "Skipping malformed row");
        }
        record
    })
}

/// Averages the values of every key.
///
/// Rows with a blank key or a value that is not a finite number are skipped.
/// A key whose rows were all skipped does not appear in the result.
pub fn aggregate<I, K, V>(rows: I) -> Summary
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    aggregate_with(rows, Reduction::Mean)
}

/// Same filtering as [`aggregate`], with the reduction chosen by the caller.
pub fn aggregate_with<I, K, V>(rows: I, reduction: Reduction) -> Summary
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    aggregate_records(valid_records(rows), reduction)
}

/// Folds already validated records.
pub fn aggregate_records<I>(records: I, reduction: Reduction) -> Summary
where
    I: IntoIterator<Item = Record>,
{
    records
        .into_iter()
        .collect::<Accumulator>()
        .reduce(reduction)
}
