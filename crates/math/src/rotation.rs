//! Orthogonal rotation of factor loadings.

use ndarray::{Array2, Axis};

use crate::{MathError, linalg::polar_factor};

/// Rotation applied to fitted loadings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// Leave loadings as fitted.
    None,
    /// Raw varimax rotation, without Kaiser row normalization.
    #[default]
    Varimax,
}

/// Varimax rotation of a loadings matrix.
///
/// # Arguments
/// * `loadings` - Loadings (n_indicators x n_factors)
/// * `tol` - Relative improvement below which iteration stops
/// * `max_iter` - Maximum number of iterations
///
/// # Returns
/// Rotated loadings with the same shape.
///
/// # Errors
/// Returns error if the intermediate polar decomposition fails.
pub fn varimax(loadings: &Array2<f64>, tol: f64, max_iter: usize) -> Result<Array2<f64>, MathError> {
    let (n_rows, n_factors) = loadings.dim();
    if n_rows == 0 || n_factors == 0 {
        return Ok(loadings.clone());
    }

    let mut rotation = Array2::<f64>::eye(n_factors);
    let mut criterion = 0.0;

    for _ in 0..max_iter {
        let rotated = loadings.dot(&rotation);
        let column_scale = rotated.mapv(|x| x * x).sum_axis(Axis(0)) / n_rows as f64;
        let target = rotated.mapv(|x| x.powi(3)) - &rotated * &column_scale;

        let (next, value) = polar_factor(&loadings.t().dot(&target))?;
        rotation = next;

        if criterion != 0.0 && value < criterion * (1.0 + tol) {
            break;
        }
        criterion = value;
    }

    Ok(loadings.dot(&rotation))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn rotation_preserves_communalities() {
        let loadings = array![[0.8, 0.3], [0.7, 0.4], [0.2, 0.9], [0.3, 0.8]];
        let rotated = varimax(&loadings, 1e-6, 100).unwrap();
        for (before, after) in loadings.axis_iter(Axis(0)).zip(rotated.axis_iter(Axis(0))) {
            assert_relative_eq!(before.dot(&before), after.dot(&after), epsilon = 1e-10);
        }
    }

    #[test]
    fn rotation_simplifies_structure() {
        let loadings = array![[0.8, 0.3], [0.7, 0.4], [0.2, 0.9], [0.3, 0.8]];
        let rotated = varimax(&loadings, 1e-6, 100).unwrap();
        let objective = |m: &Array2<f64>| {
            let sq = m.mapv(|x| x * x);
            sq.axis_iter(Axis(1))
                .map(|c| {
                    let mean = c.sum() / c.len() as f64;
                    c.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
                })
                .sum::<f64>()
        };
        assert!(objective(&rotated) >= objective(&loadings) - 1e-12);
    }

    #[test]
    fn equal_loadings_single_factor_unchanged() {
        let loadings = array![[0.5], [0.5]];
        let rotated = varimax(&loadings, 1e-6, 100).unwrap();
        assert_relative_eq!(rotated[[0, 0]], 0.5, epsilon = 1e-12);
        assert_relative_eq!(rotated[[1, 0]], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn empty_loadings_pass_through() {
        let loadings = Array2::<f64>::zeros((0, 2));
        assert!(varimax(&loadings, 1e-6, 100).unwrap().is_empty());
    }
}
