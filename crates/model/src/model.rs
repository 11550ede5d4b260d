//! Per-quarter factor model.

use fremantle_data::IndicatorMatrix;
use fremantle_primitives::{RankedStock, RankedStockList, SecurityName};
use fremantle_traits::FactorExtractor;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Factor loadings labeled by indicator and factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingsTable {
    /// Indicator names, one per row of `values`.
    pub indicators: Vec<String>,
    /// Factor labels, one per column of `values`.
    pub factors: Vec<String>,
    /// Loadings, row-major by indicator.
    pub values: Vec<Vec<f64>>,
    /// Composite weight of each factor.
    pub weights: Vec<f64>,
}

/// Factor model fitted on one lookback window.
///
/// Built fresh every quarter and never updated.
#[derive(Debug, Clone)]
pub struct FactorModel {
    indicators: Vec<String>,
    loadings: Array2<f64>,
    weights: Array1<f64>,
    ranking: RankedStockList,
}

impl FactorModel {
    /// Fit a model on an indicator matrix and rank its securities by composite score.
    ///
    /// # Errors
    /// Returns `ModelError::Extraction` if no model can be fitted, or
    /// `ModelError::DimensionMismatch` if the extractor output disagrees with the matrix.
    pub fn fit<E: FactorExtractor>(extractor: &E, matrix: &IndicatorMatrix) -> Result<Self, ModelError> {
        let solution = extractor.extract(matrix.values())?;

        if solution.composite.len() != matrix.n_securities() {
            return Err(ModelError::DimensionMismatch {
                expected: matrix.n_securities(),
                actual: solution.composite.len(),
                context: "composite".to_string(),
            });
        }
        if solution.loadings.dim() != (matrix.n_indicators(), solution.n_factors()) {
            return Err(ModelError::DimensionMismatch {
                expected: matrix.n_indicators(),
                actual: solution.loadings.nrows(),
                context: "loadings".to_string(),
            });
        }

        let ranking = RankedStockList::from_scores(matrix.names(), &solution.composite);
        tracing::debug!(
            n_factors = solution.n_factors(),
            n_securities = ranking.len(),
            "fitted factor model"
        );

        Ok(Self {
            indicators: matrix.indicators().to_vec(),
            loadings: solution.loadings,
            weights: solution.weights,
            ranking,
        })
    }

    /// Number of retained factors.
    #[must_use]
    pub fn n_factors(&self) -> usize {
        self.weights.len()
    }

    /// Indicator names in loading row order.
    #[must_use]
    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    /// Loadings (n_indicators x n_factors).
    #[must_use]
    pub const fn loadings(&self) -> &Array2<f64> {
        &self.loadings
    }

    /// Composite weight of each factor.
    #[must_use]
    pub const fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Securities ordered by descending composite score.
    #[must_use]
    pub const fn ranking(&self) -> &RankedStockList {
        &self.ranking
    }

    /// The `n` highest-scored securities.
    #[must_use]
    pub fn top(&self, n: usize) -> &[RankedStock] {
        self.ranking.top(n)
    }

    /// Names of the `n` highest-scored securities.
    #[must_use]
    pub fn top_names(&self, n: usize) -> Vec<SecurityName> {
        self.top(n).iter().map(|stock| stock.name.clone()).collect()
    }

    /// Labeled copy of the loadings.
    #[must_use]
    pub fn loadings_table(&self) -> LoadingsTable {
        LoadingsTable {
            indicators: self.indicators.clone(),
            factors: (1..=self.n_factors()).map(|i| format!("因子{i}")).collect(),
            values: self.loadings.axis_iter(Axis(0)).map(|row| row.to_vec()).collect(),
            weights: self.weights.to_vec(),
        }
    }
}
