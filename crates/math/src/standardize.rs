//! Column-wise standardization.

use ndarray::{Array2, ArrayView1, Axis};

/// Z-score transform applied independently to every column of a matrix.
///
/// Zero-variance columns become all zeros, and any non-finite result is replaced
/// by zero.
#[derive(Debug, Clone)]
pub struct Standardizer {
    /// Delta degrees of freedom of the standard deviation (0 = population).
    pub ddof: usize,
}

impl Standardizer {
    /// Create a new standardizer.
    #[must_use]
    pub const fn new(ddof: usize) -> Self {
        Self { ddof }
    }

    /// Apply standardization to each column.
    #[must_use]
    pub fn apply(&self, data: &Array2<f64>) -> Array2<f64> {
        if data.is_empty() {
            return data.clone();
        }

        let mut out = data.clone();
        for mut column in out.axis_iter_mut(Axis(1)) {
            let (mean, std) = self.moments(column.view());
            let scale = if std > 0.0 && std.is_finite() { std } else { 1.0 };
            column.mapv_inplace(|x| {
                let z = (x - mean) / scale;
                if z.is_finite() { z } else { 0.0 }
            });
        }
        out
    }

    fn moments(&self, data: ArrayView1<'_, f64>) -> (f64, f64) {
        let n = data.len();
        if n == 0 {
            return (0.0, 0.0);
        }
        let mean = data.sum() / n as f64;
        if n <= self.ddof {
            return (mean, 0.0);
        }
        let variance: f64 =
            data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - self.ddof) as f64;
        (mean, variance.sqrt())
    }
}

impl Default for Standardizer {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Standardize every column to zero mean and unit population variance.
#[must_use]
pub fn standardize_columns(data: &Array2<f64>) -> Array2<f64> {
    Standardizer::default().apply(data)
}
