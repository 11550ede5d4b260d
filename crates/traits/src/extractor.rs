//! Factor extraction trait definitions.

use fremantle_math::MathError;
use ndarray::{Array1, Array2};

/// Errors that can occur during factor extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// Too few securities to fit a factor model.
    #[error("insufficient data: need at least {required} securities, got {actual}")]
    InsufficientData {
        /// Required number of securities.
        required: usize,
        /// Actual number of securities.
        actual: usize,
    },

    /// The indicator matrix has no columns.
    #[error("no indicator columns to extract factors from")]
    NoIndicators,

    /// Input carries no usable variance (e.g. every indicator is constant).
    #[error("degenerate input: {0}")]
    Degenerate(String),

    /// Fitting produced non-finite values.
    #[error("numerical failure: {0}")]
    Numerical(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Lower-level math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),
}

impl ExtractionError {
    /// Returns whether the caller may skip the period and carry on.
    ///
    /// Only a bad configuration is fatal; every data-dependent failure just means the
    /// period produced no ranking.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidConfig(_))
    }
}

/// Result of a single factor extraction.
#[derive(Debug, Clone)]
pub struct FactorSolution {
    /// Loadings (n_indicators x n_factors).
    pub loadings: Array2<f64>,
    /// Explained-variance share per retained factor, summing to one.
    pub weights: Array1<f64>,
    /// Factor scores (n_securities x n_factors).
    pub scores: Array2<f64>,
    /// Composite score per security: `scores . weights`.
    pub composite: Array1<f64>,
    /// Explained-variance shares of the candidate fit used to choose the factor count.
    pub candidate_shares: Array1<f64>,
}

impl FactorSolution {
    /// Number of retained factors.
    #[must_use]
    pub fn n_factors(&self) -> usize {
        self.weights.len()
    }

    /// Number of scored securities.
    #[must_use]
    pub fn n_securities(&self) -> usize {
        self.composite.len()
    }
}

/// Trait for reducing an indicator matrix to weighted latent factors.
pub trait FactorExtractor: Send + Sync {
    /// Configuration type for this extractor.
    type Config: Default + Clone + Send + Sync;

    /// Create a new extractor with the given configuration.
    fn with_config(config: Self::Config) -> Self;

    /// Get the configuration.
    fn config(&self) -> &Self::Config;

    /// Extract factors from an indicator matrix.
    ///
    /// # Arguments
    /// * `features` - Indicator values (n_securities x n_indicators), no missing values
    ///
    /// # Errors
    /// Returns `ExtractionError` when no actionable factor model can be fitted.
    fn extract(&self, features: &Array2<f64>) -> Result<FactorSolution, ExtractionError>;
}
