//! Loading raw rows from CSV and JSON files.
//!
//! Loaders only open and parse; row-level validation happens in the
//! aggregation layer. A missing file and a file without the expected structure
//! are reported as different [`SourceError`] variants.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::analyzers::types::{Record, parse_finite};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not find '{}'", .path.display())]
    NotFound { path: PathBuf },
    #[error("'{}' is malformed: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SourceError {
    fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        SourceError::Malformed {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    fn from_io(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            SourceError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            SourceError::Io {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }

    fn from_csv(path: &Path, err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(e) => Self::from_io(path, e),
            kind => Self::malformed(path, format!("{kind:?}")),
        }
    }
}

fn open(path: &Path) -> Result<File, SourceError> {
    File::open(path).map_err(|e| SourceError::from_io(path, e))
}

fn find_column<'a>(
    headers: impl IntoIterator<Item = &'a str>,
    path: &Path,
    name: &str,
) -> Result<usize, SourceError> {
    headers
        .into_iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| SourceError::malformed(path, format!("missing required column '{name}'")))
}

/// A header-first delimited file with its header row already resolved.
struct TableReader {
    path: PathBuf,
    headers: csv::StringRecord,
    reader: csv::Reader<File>,
}

impl TableReader {
    fn open(path: &Path, delimiter: u8) -> Result<Self, SourceError> {
        let file = open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| SourceError::from_csv(path, e))?
            .clone();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(SourceError::malformed(path, "file is empty or has no header"));
        }
        debug!(columns = headers.len(), "Header read");

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            reader,
        })
    }

    fn column(&self, name: &str) -> Result<usize, SourceError> {
        find_column(self.headers.iter(), &self.path, name)
    }

/// Visits every data row. Rows that cannot be decoded are skipped.
    fn for_each_row(mut self, mut f: impl FnMut(&csv::StringRecord)) -> Result<(), SourceError> {
        let mut record = csv::StringRecord::new();
        loop {
            match self.reader.read_record(&mut record) {
                Ok(true) => f(&record),
                Ok(false) => break,
                Err(e) if e.is_io_error() => return Err(SourceError::from_csv(&self.path, e)),
                Err(e) => warn!(error = %e, "Skipping undecodable row"),
            }
        }
        Ok(())
    }
}

fn field(record: &csv::StringRecord, index: usize) -> String {
    record.get(index).unwrap_or("").to_string()
}

/// Reads the raw `(key, value)` text of two named columns, in file order.
///
/// Rows shorter than the header yield empty fields.
#[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn read_csv_pairs(
    path: impl AsRef<Path>,
    key_column: &str,
    value_column: &str,
    delimiter: u8,
) -> Result<Vec<(String, String)>, SourceError> {
    let table = TableReader::open(path.as_ref(), delimiter)?;
    let key = table.column(key_column)?;
    let value = table.column(value_column)?;

    let mut pairs = Vec::new();
    table.for_each_row(|row| pairs.push((field(row, key), field(row, value))))?;

    debug!(rows = pairs.len(), "CSV pairs loaded");
    Ok(pairs)
}

/// A whole delimited file held in memory, for callers that need full rows.
#[derive(Debug, Clone)]
pub struct CsvTable {
    path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn column_index(&self, name: &str) -> Result<usize, SourceError> {
        find_column(self.headers.iter().map(String::as_str), &self.path, name)
    }

    /// Raw text of one named column, empty for rows shorter than the header.
    pub fn column(&self, name: &str) -> Result<Vec<&str>, SourceError> {
        let index = self.column_index(name)?;
        Ok((0..self.rows.len()).map(|row| self.cell(row, index)).collect())
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Reads a header-first delimited file into memory.
#[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn read_csv_table(path: impl AsRef<Path>, delimiter: u8) -> Result<CsvTable, SourceError> {
    let reader = TableReader::open(path.as_ref(), delimiter)?;
    let headers: Vec<String> = reader.headers.iter().map(str::to_string).collect();
    let path = reader.path.clone();

    let mut rows = Vec::new();
    reader.for_each_row(|row| rows.push(row.iter().map(str::to_string).collect()))?;

    debug!(rows = rows.len(), "CSV table loaded");
    Ok(CsvTable {
        path,
        headers,
        rows,
    })
}

/// Reads a `product,quantity,price` file into one revenue record per valid row.
#[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn read_csv_sales(path: impl AsRef<Path>, delimiter: u8) -> Result<Vec<Record>, SourceError> {
    let table = TableReader::open(path.as_ref(), delimiter)?;
    let product = table.column("product")?;
    let quantity = table.column("quantity")?;
    let price = table.column("price")?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    table.for_each_row(|row| {
        let record = Record::from_product(
            row.get(product).unwrap_or(""),
            row.get(quantity).unwrap_or(""),
            row.get(price).unwrap_or(""),
        );
        match record {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    })?;

    debug!(rows = records.len(), skipped, "Sales rows loaded");
    Ok(records)
}

/// A person entry from a JSON people file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Person {
    #[serde(default = "unknown_name")]
    pub name: String,
    /// `None` when the age is absent, null, or not a finite number.
    #[serde(default, deserialize_with = "finite_age")]
    pub age: Option<f64>,
}

fn unknown_name() -> String {
    String::from("Unknown")
}

/// Ages show up both as numbers and as numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAge {
    Number(f64),
    Text(String),
}

fn finite_age<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<RawAge>::deserialize(deserializer)? {
        Some(RawAge::Number(n)) => Some(n).filter(|v| v.is_finite()),
        Some(RawAge::Text(s)) => parse_finite(&s),
        None => None,
    })
}

/// Reads people from a JSON file.
///
/// Accepts `{"people": [...]}`, a bare array of people, or a single person
/// object. Array items that do not deserialize as a person are ignored.
#[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn read_people(path: impl AsRef<Path>) -> Result<Vec<Person>, SourceError> {
    let path = path.as_ref();
    let file = open(path)?;
    let data: Value = serde_json::from_reader(io::BufReader::new(file)).map_err(|e| {
        if e.is_io() {
            SourceError::Io {
                path: path.to_path_buf(),
                source: e.into(),
            }
        } else {
            SourceError::malformed(path, format!("invalid JSON: {e}"))
        }
    })?;

    let items = match &data {
        Value::Object(object) => match object.get("people") {
            Some(Value::Array(items)) => items.as_slice(),
            Some(_) => return Err(SourceError::malformed(path, "'people' is not an array")),
            None => std::slice::from_ref(&data),
        },
        Value::Array(items) => items.as_slice(),
        _ => {
            return Err(SourceError::malformed(
                path,
                "expected an object or an array of people",
            ));
        }
    };

    let people: Vec<Person> = items
        .iter()
        .filter_map(|item| Person::deserialize(item).ok())
        .collect();
    debug!(people = people.len(), "People loaded");
    Ok(people)
}
