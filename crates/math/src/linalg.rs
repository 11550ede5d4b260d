//! Dense linear algebra for factor fitting.
//!
//! Matrices here are small (indicators x indicators or factors x factors), so plain
//! Jacobi and Gauss-Jordan routines over `ndarray` are sufficient.

use ndarray::{Array1, Array2, Axis};

use crate::MathError;

/// Maximum number of Jacobi sweeps before giving up.
const MAX_JACOBI_SWEEPS: usize = 100;

/// Relative off-diagonal norm at which a Jacobi iteration is considered converged.
const JACOBI_TOLERANCE: f64 = 1e-12;

/// Pivot magnitude below which a matrix is treated as singular.
const PIVOT_EPSILON: f64 = 1e-14;

/// Relative singular value below which a direction is treated as null.
const RANK_EPSILON: f64 = 1e-10;

/// Eigen decomposition of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues in descending order.
    pub values: Array1<f64>,
    /// Eigenvectors stored as columns, matching `values`.
    pub vectors: Array2<f64>,
}

/// Eigen decomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// # Errors
/// Returns error if the matrix is not square, contains non-finite values, or the
/// iteration does not converge.
pub fn symmetric_eigen(a: &Array2<f64>) -> Result<SymmetricEigen, MathError> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(MathError::LinearAlgebra("matrix must be square".to_string()));
    }
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(MathError::NumericalInstability("non-finite matrix entry".to_string()));
    }

    let mut m = a.clone();
    let mut v = Array2::<f64>::eye(n);
    let scale = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mut converged = false;

    for _ in 0..MAX_JACOBI_SWEEPS {
        let mut off = 0.0;
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    off += m[[i, j]] * m[[i, j]];
                }
            }
        }
        if off == 0.0 || off.sqrt() <= JACOBI_TOLERANCE * scale {
            converged = true;
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = m[[p, q]];
                if apq == 0.0 {
                    continue;
                }

                let theta = (m[[q, q]] - m[[p, p]]) / (2.0 * apq);
                let sign = if theta >= 0.0 { 1.0 } else { -1.0 };
                let t = sign / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let mkp = m[[k, p]];
                    let mkq = m[[k, q]];
                    m[[k, p]] = c * mkp - s * mkq;
                    m[[k, q]] = s * mkp + c * mkq;
                }
                for k in 0..n {
                    let mpk = m[[p, k]];
                    let mqk = m[[q, k]];
                    m[[p, k]] = c * mpk - s * mqk;
                    m[[q, k]] = s * mpk + c * mqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    if !converged {
        return Err(MathError::NoConvergence { iterations: MAX_JACOBI_SWEEPS });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| m[[j, j]].total_cmp(&m[[i, i]]));

    let values = Array1::from_iter(order.iter().map(|&i| m[[i, i]]));
    let vectors = v.select(Axis(1), &order);

    Ok(SymmetricEigen { values, vectors })
}

/// Solve `A X = B` for a square `A` by Gauss-Jordan elimination with partial pivoting.
///
/// # Errors
/// Returns error if dimensions mismatch or `A` is singular.
pub(crate) fn solve(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    let n = a.nrows();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if a.ncols() != n {
        return Err(MathError::LinearAlgebra("matrix must be square".to_string()));
    }
    if b.nrows() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: b.nrows() });
    }

    let m = b.ncols();
    let mut aug = Array2::zeros((n, n + m));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        for j in 0..m {
            aug[[i, n + j]] = b[[i, j]];
        }
    }

    for col in 0..n {
        // Find pivot
        let mut max_row = col;
        let mut max_val = aug[[col, col]].abs();
        for row in (col + 1)..n {
            if aug[[row, col]].abs() > max_val {
                max_val = aug[[row, col]].abs();
                max_row = row;
            }
        }

        if max_val.is_nan() || max_val < PIVOT_EPSILON {
            return Err(MathError::LinearAlgebra(
                "matrix is singular or nearly singular".to_string(),
            ));
        }

        if max_row != col {
            for j in 0..(n + m) {
                aug.swap([col, j], [max_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        for j in col..(n + m) {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for j in col..(n + m) {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    let mut x = Array2::zeros((n, m));
    for i in 0..n {
        for j in 0..m {
            x[[i, j]] = aug[[i, n + j]];
        }
    }
    Ok(x)
}

/// Inverse of a square matrix.
///
/// # Errors
/// Returns error if the matrix is singular.
pub fn invert(a: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    solve(a, &Array2::eye(a.nrows()))
}

/// Orthogonal polar factor `U V'` of `M = U S V'`, together with `sum(S)`.
///
/// Null directions of `M` are completed with an orthonormal basis of the remaining
/// space, so a zero matrix yields the identity.
///
/// # Errors
/// Returns error if `M` is not square or the eigen decomposition fails.
pub fn polar_factor(m: &Array2<f64>) -> Result<(Array2<f64>, f64), MathError> {
    let k = m.nrows();
    if m.ncols() != k {
        return Err(MathError::LinearAlgebra("matrix must be square".to_string()));
    }

    let eigen = symmetric_eigen(&m.t().dot(m))?;
    let singular: Array1<f64> = eigen.values.mapv(|x| x.max(0.0).sqrt());
    let largest = singular.iter().copied().fold(0.0, f64::max);

    let mut left: Vec<Array1<f64>> = Vec::with_capacity(k);
    for i in 0..k {
        if largest > 0.0 && singular[i] > RANK_EPSILON * largest {
            let u = m.dot(&eigen.vectors.column(i)) / singular[i];
            left.push(u);
        }
    }
    complete_orthonormal_basis(&mut left, k);

    let mut u = Array2::zeros((k, k));
    for (i, col) in left.iter().enumerate() {
        u.column_mut(i).assign(col);
    }

    Ok((u.dot(&eigen.vectors.t()), singular.sum()))
}

/// Extend orthonormal vectors to a basis of R^k by Gram-Schmidt over unit vectors.
fn complete_orthonormal_basis(basis: &mut Vec<Array1<f64>>, k: usize) {
    for e in 0..k {
        if basis.len() >= k {
            break;
        }
        let mut w = Array1::zeros(k);
        w[e] = 1.0;
        for b in basis.iter() {
            let proj = w.dot(b);
            w = w - b * proj;
        }
        let norm = w.dot(&w).sqrt();
        if norm > 1e-8 {
            basis.push(w / norm);
        }
    }
}
