//! Explained-variance accounting for fitted factors.

use ndarray::{Array1, Array2, Axis};

use crate::MathError;

/// Share of explained variance carried by each factor.
///
/// Each factor's share is the squared norm of its loading vector divided by the total
/// over all factors.
///
/// # Arguments
/// * `components` - Loadings with one row per factor (n_factors x n_indicators)
///
/// # Errors
/// Returns `MathError::NumericalInstability` if the loadings carry no variance.
pub fn explained_variance_shares(components: &Array2<f64>) -> Result<Array1<f64>, MathError> {
    if components.nrows() == 0 {
        return Err(MathError::EmptyData);
    }

    let energy = components.mapv(|x| x * x).sum_axis(Axis(1));
    let total = energy.sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(MathError::NumericalInstability(format!(
            "total explained variance is {total}"
        )));
    }

    Ok(energy / total)
}

/// Smallest number of leading factors whose cumulative share reaches `threshold`.
///
/// Always at least 1 and at most `shares.len()`.
#[must_use]
pub fn min_factors_for_share(shares: &Array1<f64>, threshold: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, share) in shares.iter().enumerate() {
        cumulative += share;
        if cumulative >= threshold {
            return i + 1;
        }
    }
    shares.len().max(1)
}
