//! Variance-targeted factor extraction.

use fremantle_math::{FactorAnalysis, MathError, Rotation, min_factors_for_share, standardize_columns};
use fremantle_traits::{ExtractionError, FactorExtractor, FactorSolution};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Configuration for variance-targeted extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Cumulative explained-variance share the retained factors must reach.
    pub min_cumulative_variance: f64,
    /// Upper bound on the candidate factor count.
    pub max_factors: usize,
    /// Maximum EM iterations per fit.
    pub max_iter: usize,
    /// EM log-likelihood tolerance.
    pub tol: f64,
    /// Whether loadings are varimax-rotated.
    pub varimax: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self { min_cumulative_variance: 0.8, max_factors: 10, max_iter: 1000, tol: 1e-2, varimax: true }
    }
}

impl ExtractorConfig {
    /// Check that every setting is usable.
    ///
    /// # Errors
    /// Returns `ExtractionError::InvalidConfig` naming the first bad setting.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        let threshold = self.min_cumulative_variance;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ExtractionError::InvalidConfig(format!(
                "min_cumulative_variance must be in (0, 1], got {threshold}"
            )));
        }
        if self.max_factors == 0 {
            return Err(ExtractionError::InvalidConfig("max_factors must be positive".to_string()));
        }
        if self.max_iter == 0 {
            return Err(ExtractionError::InvalidConfig("max_iter must be positive".to_string()));
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(ExtractionError::InvalidConfig(format!(
                "tol must be positive, got {}",
                self.tol
            )));
        }
        Ok(())
    }

    const fn rotation(&self) -> Rotation {
        if self.varimax { Rotation::Varimax } else { Rotation::None }
    }

    fn factor_analysis(&self, n_components: usize) -> FactorAnalysis {
        FactorAnalysis::new(n_components)
            .with_rotation(self.rotation())
            .with_iterations(self.max_iter, self.tol)
    }
}

/// Factor extractor that keeps the fewest factors reaching a variance threshold.
///
/// Indicators are standardized, a candidate model with up to `max_factors` factors
/// ranks factors by explained-variance share, and the model is refitted with the
/// smallest count whose cumulative share reaches `min_cumulative_variance`. The
/// composite score weights each factor by its share in the refitted model.
#[derive(Debug, Clone, Default)]
pub struct VarianceTargetedExtractor {
    config: ExtractorConfig,
}

impl VarianceTargetedExtractor {
    /// Create a new extractor with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ExtractorConfig::default())
    }

    /// Get the variance threshold.
    #[must_use]
    pub const fn min_cumulative_variance(&self) -> f64 {
        self.config.min_cumulative_variance
    }
}

impl FactorExtractor for VarianceTargetedExtractor {
    type Config = ExtractorConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn extract(&self, features: &Array2<f64>) -> Result<FactorSolution, ExtractionError> {
        self.config.validate()?;

        let (n_securities, n_indicators) = features.dim();
        if n_indicators == 0 {
            return Err(ExtractionError::NoIndicators);
        }
        if n_securities < 2 {
            return Err(ExtractionError::InsufficientData { required: 2, actual: n_securities });
        }
        if features.iter().any(|v| !v.is_finite()) {
            return Err(ExtractionError::Degenerate("indicator matrix has missing values".to_string()));
        }

        let standardized = standardize_columns(features);
        if standardized.iter().all(|v| *v == 0.0) {
            return Err(ExtractionError::Degenerate("every indicator is constant".to_string()));
        }

        let candidates = self.config.max_factors.min(n_indicators);
        let candidate_fit = self.config.factor_analysis(candidates).fit(&standardized)?;
        let candidate_shares = candidate_fit.variance_shares().map_err(degenerate)?;

        let n_factors = min_factors_for_share(&candidate_shares, self.config.min_cumulative_variance)
            .min(candidate_fit.n_factors());

        let fit = self.config.factor_analysis(n_factors).fit(&standardized)?;
        if !fit.converged {
            tracing::warn!(n_factors, n_iter = fit.n_iter, "factor analysis did not converge");
        }

        let weights = fit.variance_shares().map_err(degenerate)?;
        let scores = fit.transform(&standardized)?;
        let composite = scores.dot(&weights);
        if composite.iter().any(|v| !v.is_finite()) {
            return Err(ExtractionError::Numerical("non-finite composite score".to_string()));
        }

        tracing::debug!(
            n_securities,
            n_indicators,
            candidates,
            n_factors,
            "extracted factors"
        );

        Ok(FactorSolution { loadings: fit.loadings(), weights, scores, composite, candidate_shares })
    }
}

fn degenerate(err: MathError) -> ExtractionError {
    match err {
        MathError::NumericalInstability(msg) => ExtractionError::Degenerate(msg),
        other => ExtractionError::Math(other),
    }
}
