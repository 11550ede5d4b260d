//! Error types for input tables.

/// Errors that can occur while loading input tables.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Missing column.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// Security name appears more than once.
    #[error("duplicate security: {0}")]
    DuplicateSecurity(String),

    /// Table content cannot be interpreted.
    #[error("invalid table: {0}")]
    InvalidTable(String),

    /// Column lengths disagree.
    #[error("column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        /// Column label.
        column: String,
        /// Expected number of rows.
        expected: usize,
        /// Actual number of rows.
        actual: usize,
    },
}
