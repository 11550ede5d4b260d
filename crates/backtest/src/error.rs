//! Error types for the backtest.

use fremantle_data::DataError;
use fremantle_model::ModelError;
use fremantle_traits::ExtractionError;

/// Errors that abort a backtest run.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Model error that cannot be absorbed by skipping a quarter.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Input table error.
    #[error("data error: {0}")]
    Data(#[from] DataError),
}

impl From<ExtractionError> for BacktestError {
    fn from(err: ExtractionError) -> Self {
        Self::Model(ModelError::from(err))
    }
}

impl BacktestError {
    /// Returns whether a batch runner may move on to the next input set.
    ///
    /// Configuration errors affect every run and are not recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidConfig(_) => false,
            Self::Model(err) => err.is_recoverable(),
            Self::Data(_) => true,
        }
    }
}
