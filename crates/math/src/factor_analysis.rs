//! Maximum-likelihood factor analysis.
//!
//! Fits `x = W' z + mean + e` with `z ~ N(0, I)` and diagonal noise `e ~ N(0, Psi)`
//! by the SVD-based EM iteration of Barber (2012, ch. 21): each step takes the leading
//! eigenpairs of the noise-whitened sample covariance, derives loadings from them and
//! re-estimates the noise variances.

use std::f64::consts::PI;

use ndarray::{Array1, Array2, Axis, s};

use crate::{
    MathError, Rotation, explained_variance_shares,
    linalg::{invert, symmetric_eigen},
    rotation::varimax,
};

/// Floor for noise variances and eigenvalues inside logarithms.
const SMALL: f64 = 1e-12;

/// Convergence tolerance of the varimax rotation.
const ROTATION_TOL: f64 = 1e-6;

/// Iteration cap of the varimax rotation.
const ROTATION_MAX_ITER: usize = 100;

/// Factor analysis configuration.
#[derive(Debug, Clone)]
pub struct FactorAnalysis {
    /// Number of latent factors.
    pub n_components: usize,
    /// Maximum number of EM iterations.
    pub max_iter: usize,
    /// Stop once the log-likelihood improves by less than this.
    pub tol: f64,
    /// Rotation applied to the fitted loadings.
    pub rotation: Rotation,
}

impl FactorAnalysis {
    /// Create a factor analysis with default iteration settings and varimax rotation.
    #[must_use]
    pub const fn new(n_components: usize) -> Self {
        Self { n_components, max_iter: 1000, tol: 1e-2, rotation: Rotation::Varimax }
    }

    /// Set the rotation.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the iteration limits.
    #[must_use]
    pub const fn with_iterations(mut self, max_iter: usize, tol: f64) -> Self {
        self.max_iter = max_iter;
        self.tol = tol;
        self
    }

    /// Fit the model.
    ///
    /// Every factor is oriented so that its loadings sum to a non-negative value.
    ///
    /// # Arguments
    /// * `x` - Observations (n_samples x n_features)
    ///
    /// # Errors
    /// Returns error on empty or non-finite input, fewer than two samples, an invalid
    /// component count, or a failed decomposition.
    pub fn fit(&self, x: &Array2<f64>) -> Result<FactorAnalysisFit, MathError> {
        let (n_samples, n_features) = x.dim();
        if n_features == 0 {
            return Err(MathError::EmptyData);
        }
        if n_samples < 2 {
            return Err(MathError::InsufficientObservations { required: 2, actual: n_samples });
        }
        if self.n_components == 0 || self.n_components > n_features {
            return Err(MathError::InvalidParameter(format!(
                "n_components must be in 1..={n_features}, got {}",
                self.n_components
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(MathError::NumericalInstability("non-finite observation".to_string()));
        }

        let k = self.n_components;
        let mean = x.mean_axis(Axis(0)).ok_or(MathError::EmptyData)?;
        let centered = x - &mean;
        let variance = centered.mapv(|v| v * v).mean_axis(Axis(0)).ok_or(MathError::EmptyData)?;

        let n = n_samples as f64;
        let nsqrt = n.sqrt();
        let llconst = n_features as f64 * (2.0 * PI).ln() + k as f64;

        let mut psi = Array1::<f64>::ones(n_features);
        let mut components = Array2::<f64>::zeros((k, n_features));
        let mut old_ll = f64::NEG_INFINITY;
        let mut log_likelihood = f64::NEG_INFINITY;
        let mut converged = false;
        let mut n_iter = 0;

        for iter in 0..self.max_iter {
            n_iter = iter + 1;
            let sqrt_psi = psi.mapv(f64::sqrt) + SMALL;
            let scaled = &centered / &(&sqrt_psi * nsqrt);
            let eigen = symmetric_eigen(&scaled.t().dot(&scaled))?;
            let spectrum = eigen.values.mapv(|v| v.max(0.0));

            for i in 0..k {
                let scale = (spectrum[i] - 1.0).max(0.0).sqrt();
                for j in 0..n_features {
                    components[[i, j]] = scale * eigen.vectors[[j, i]] * sqrt_psi[j];
                }
            }

            let explained: f64 = spectrum.slice(s![..k]).iter().map(|v| v.max(SMALL).ln()).sum();
            let unexplained: f64 = spectrum.slice(s![k..]).sum();
            let ll = -n / 2.0 * (llconst + explained + unexplained + psi.mapv(f64::ln).sum());
            if !ll.is_finite() {
                return Err(MathError::NumericalInstability(format!(
                    "log-likelihood is {ll} at iteration {n_iter}"
                )));
            }
            log_likelihood = ll;

            if ll - old_ll < self.tol {
                converged = true;
                break;
            }
            old_ll = ll;

            let communality = components.mapv(|v| v * v).sum_axis(Axis(0));
            psi = (&variance - &communality).mapv(|v| v.max(SMALL));
        }

        if self.rotation == Rotation::Varimax {
            components = varimax(&components.t().to_owned(), ROTATION_TOL, ROTATION_MAX_ITER)?
                .t()
                .to_owned();
        }
        orient(&mut components);

        if components.iter().any(|v| !v.is_finite()) {
            return Err(MathError::NumericalInstability("non-finite loadings".to_string()));
        }

        Ok(FactorAnalysisFit {
            components,
            noise_variance: psi,
            mean,
            log_likelihood,
            n_iter,
            converged,
        })
    }
}

/// Flip factors whose loadings sum to a negative value.
fn orient(components: &mut Array2<f64>) {
    for mut row in components.axis_iter_mut(Axis(0)) {
        if row.sum() < 0.0 {
            row.mapv_inplace(|v| -v);
        }
    }
}

/// A fitted factor analysis model.
#[derive(Debug, Clone)]
pub struct FactorAnalysisFit {
    /// Loadings with one row per factor (n_factors x n_features).
    pub components: Array2<f64>,
    /// Per-feature noise variance.
    pub noise_variance: Array1<f64>,
    /// Per-feature training mean.
    pub mean: Array1<f64>,
    /// Log-likelihood at the last iteration.
    pub log_likelihood: f64,
    /// EM iterations performed.
    pub n_iter: usize,
    /// Whether the log-likelihood settled within tolerance.
    pub converged: bool,
}

impl FactorAnalysisFit {
    /// Number of factors.
    #[must_use]
    pub fn n_factors(&self) -> usize {
        self.components.nrows()
    }

    /// Loadings indexed by feature (n_features x n_factors).
    #[must_use]
    pub fn loadings(&self) -> Array2<f64> {
        self.components.t().to_owned()
    }

    /// Explained-variance share per factor.
    ///
    /// # Errors
    /// Returns error if the loadings carry no variance.
    pub fn variance_shares(&self) -> Result<Array1<f64>, MathError> {
        explained_variance_shares(&self.components)
    }

    /// Posterior mean factor scores of `x` (n_samples x n_factors).
    ///
    /// # Errors
    /// Returns error on a feature count mismatch or a singular posterior covariance.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, MathError> {
        let n_features = self.components.ncols();
        if x.ncols() != n_features {
            return Err(MathError::DimensionMismatch { expected: n_features, actual: x.ncols() });
        }

        let weighted = &self.components / &self.noise_variance;
        let precision = Array2::<f64>::eye(self.n_factors()) + weighted.dot(&self.components.t());
        let covariance = invert(&precision)?;
        let centered = x - &self.mean;
        let scores = centered.dot(&weighted.t()).dot(&covariance);

        if scores.iter().any(|v| !v.is_finite()) {
            return Err(MathError::NumericalInstability("non-finite factor scores".to_string()));
        }
        Ok(scores)
    }
}
