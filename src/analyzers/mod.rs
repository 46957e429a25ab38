//! Grouped aggregation over tabular rows.
//!
//! Raw `(key, value)` rows are validated into records, collected per key in a
//! single pass, then reduced to one value per group (mean, sum, min, max or
//! count).

pub mod aggregate;
pub mod analyzer;
pub mod category;
pub mod types;
pub mod utility;
