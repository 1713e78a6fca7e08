//! Ingestion Error Types

use thiserror::Error;

/// Errors raised while loading or validating raw sensor rows
#[derive(Debug, Error)]
pub enum IngestError {
    /// Header does not carry exactly the required column set
    #[error("Invalid input schema: missing columns {missing:?}, unexpected columns {unexpected:?}")]
    Schema {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// Same column name appears more than once in the header
    #[error("Duplicate column in input header: {0}")]
    DuplicateColumn(String),

    /// A cell could not be parsed into its column type
    #[error("Row {row}, column {column}: invalid value {value:?} ({reason})")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
        reason: String,
    },

    /// Record has a different field count than the header
    #[error("Row {row}: expected {expected} fields, found {actual}")]
    FieldCount {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Underlying CSV reader failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
