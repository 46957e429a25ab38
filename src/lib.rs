pub mod analyzers;
pub mod config;
pub mod output;
pub mod source;
pub mod stats;

pub use analyzers::aggregate::{aggregate, aggregate_records, aggregate_with};
pub use analyzers::types::{GroupRow, Record, Reduction, Summary};
pub use source::SourceError;
