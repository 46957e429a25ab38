//! Output formatting and persistence for aggregation results.
//!
//! Supports fixed-width text lines, JSON serialization, and CSV write/append.

use anyhow::Result;
use chrono::Weekday;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::{GroupRow, SummaryReport};
use csv::WriterBuilder;
use std::cmp::Ordering;
use std::fs::{self, File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;

/// Orders keys for display: weekday names in calendar order (Monday first),
/// then every other key lexicographically.
pub fn display_cmp(left: &str, right: &str) -> Ordering {
    let weekday = |key: &str| key.parse::<Weekday>().ok().map(|d| d.num_days_from_monday());
    match (weekday(left), weekday(right)) {
        (Some(l), Some(r)) => l.cmp(&r),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left.cmp(right),
    }
}

pub fn sort_for_display(rows: &mut [GroupRow]) {
    rows.sort_by(|l, r| display_cmp(&l.key, &r.key));
}

/// One fixed-width line per group, e.g. `Monday       : 75.00°F`.
pub fn format_table(rows: &[GroupRow], unit: &str) -> Vec<String> {
    let mut rows = rows.to_vec();
    sort_for_display(&mut rows);
    rows.iter()
        .map(|row| format!("{:12} : {:.2}{}", row.key, row.value, unit))
        .collect()
}

/// Prints a titled table to stdout.
pub fn print_table(title: &str, lines: &[String]) {
    println!("{title}");
    println!("{}", "-".repeat(50));
    for line in lines {
        println!("{line}");
    }
}

/// Writes `value` as pretty-printed JSON, replacing any existing file.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    create_parent(path)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    debug!(path, "JSON written");
    Ok(())
}

/// Writes `rows` to a new CSV file with a header line.
pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    create_parent(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    debug!(path, rows = rows.len(), "CSV written");
    Ok(())
}

/// Writes a header and raw rows to a new CSV file, e.g. a filtered copy of an
/// input table.
pub fn write_rows<'a>(
    path: &str,
    headers: &[String],
    rows: impl IntoIterator<Item = &'a [String]>,
) -> Result<usize> {
    create_parent(path)?;
    let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;
    writer.write_record(headers)?;

    let mut written = 0;
    for row in rows {
        writer.write_record(row)?;
        written += 1;
    }
    writer.flush()?;

    debug!(path, rows = written, "CSV rows written");
    Ok(written)
}

/// Appends records as rows to a CSV file.
///
/// Writes the header only when the file is new or empty.
pub fn append_records<T: Serialize>(path: &str, records: impl IntoIterator<Item = T>) -> Result<usize> {
    let has_content = fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
    debug!(path, has_content, "Appending CSV records");

    create_parent(path)?;
    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!has_content) // IMPORTANT when appending
        .from_writer(file);

    let mut appended = 0;
    for record in records {
        writer.serialize(record)?;
        appended += 1;
    }
    writer.flush()?;

    Ok(appended)
}

/// Appends one history line per group of `report`.
pub fn append_report(path: &str, report: &SummaryReport) -> Result<()> {
    let appended = append_records(path, report.history_rows())?;
    info!(path, rows = appended, "History appended");
    Ok(())
}

pub fn is_json_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Saves a report: the whole report as JSON when `path` ends in `.json`,
/// otherwise the group rows as CSV.
pub fn save_report(path: &str, report: &SummaryReport) -> Result<()> {
    if is_json_path(path) {
        write_json(path, report)?;
    } else {
        write_csv(path, &report.groups)?;
    }
    info!(
        path,
        reduction = %report.reduction,
        groups = report.groups.len(),
        "Report saved"
    );
    Ok(())
}

fn create_parent(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
