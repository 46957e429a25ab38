use serde::Serialize;

use crate::analyzers::types::parse_finite;
use crate::analyzers::utility::{max, mean, min, stddev};

/// Descriptive statistics for one numeric column.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub rows: usize,
    pub count: usize,
    pub skipped: usize,

    pub mean: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub stddev: f64,
    /// Row index of the first lowest and highest value, when known.
    pub min_row: Option<usize>,
    pub max_row: Option<usize>,

    // threshold filter
    pub threshold: Option<f64>,
    pub at_or_above: Option<usize>,
}

impl ColumnStats {
    /// Summarizes the raw text of a column. Cells that are not finite numbers
    /// are counted in `skipped` and otherwise ignored.
    pub fn from_raw<S: AsRef<str>>(column: &str, raw: &[S]) -> Self {
        let parsed: Vec<(usize, f64)> = raw
            .iter()
            .enumerate()
            .filter_map(|(row, s)| parse_finite(s.as_ref()).map(|v| (row, v)))
            .collect();
        let values: Vec<f64> = parsed.iter().map(|(_, v)| *v).collect();

        let mut stats = Self::from_values(column, &values, raw.len());
        stats.min_row = first_row_with(&parsed, stats.min);
        stats.max_row = first_row_with(&parsed, stats.max);
        stats
    }

    pub fn from_values(column: &str, values: &[f64], rows: usize) -> Self {
        let avg = mean(values);
        ColumnStats {
            column: column.to_string(),
            rows,
            count: values.len(),
            skipped: rows.saturating_sub(values.len()),
            mean: avg,
            min: min(values),
            max: max(values),
            stddev: stddev(values, avg),
            min_row: None,
            max_row: None,
            threshold: None,
            at_or_above: None,
        }
    }

    /// Records how many of `values` are at or above `threshold`.
    pub fn with_threshold(mut self, values: &[f64], threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self.at_or_above = Some(values.iter().filter(|v| **v >= threshold).count());
        self
    }
}

fn first_row_with(parsed: &[(usize, f64)], target: Option<f64>) -> Option<usize> {
    let target = target?;
    parsed.iter().find(|(_, v)| *v == target).map(|(row, _)| *row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_skips_invalid_cells() {
        let stats = ColumnStats::from_raw("High_Temp_F", &["70", "80", "", "hot", "75"]);

        assert_eq!(stats.rows, 5);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.mean, 75.0);
        assert_eq!(stats.min, Some(70.0));
        assert_eq!(stats.max, Some(80.0));
        assert_eq!(stats.min_row, Some(0));
        assert_eq!(stats.max_row, Some(1));
    }

    #[test]
    fn test_extreme_rows_point_at_first_occurrence() {
        let stats = ColumnStats::from_raw("High_Temp_F", &["n/a", "78", "60", "78", "60"]);
        assert_eq!(stats.max_row, Some(1));
        assert_eq!(stats.min_row, Some(2));
    }

    #[test]
    fn test_from_raw_empty() {
        let raw: [&str; 0] = [];
        let stats = ColumnStats::from_raw("x", &raw);

        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.min, None);
        assert_eq!(stats.max, None);
        assert_eq!(stats.max_row, None);
    }

    #[test]
    fn test_with_threshold() {
        let values = [60.0, 75.0, 78.0, 74.9];
        let stats = ColumnStats::from_values("High_Temp_F", &values, values.len())
            .with_threshold(&values, 75.0);

        assert_eq!(stats.threshold, Some(75.0));
        assert_eq!(stats.at_or_above, Some(2));
    }
}
