//! Error types for factor model fitting.

use fremantle_traits::ExtractionError;

/// Errors that can occur while fitting a quarter's factor model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Extractor error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// The extractor returned output that does not match the input matrix.
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected size.
        expected: usize,
        /// Actual size.
        actual: usize,
        /// Which output disagreed.
        context: String,
    },
}

impl ModelError {
    /// Returns whether this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Extraction(err) => err.is_recoverable(),
            Self::DimensionMismatch { .. } => false,
        }
    }
}
