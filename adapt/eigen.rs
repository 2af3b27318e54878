// adapt/eigen.rs

//! Generalized symmetric-definite eigenproblem `A v = μ B v`.
//!
//! Both TCA and JDA pose `A = K·M·Kᵗ + λI` against `B = K·H·Kᵗ` and keep the
//! directions with the smallest `|μ|`. For `λ > 0` the left-hand matrix is
//! symmetric positive definite, so it is Cholesky-factored (`A = C·Cᵗ`) and the
//! problem becomes the ordinary symmetric eigenproblem
//!
//! ```text
//!     C⁻¹ · B · C⁻ᵗ  w = ν w,    ν = 1/μ,    v = C⁻ᵗ w
//! ```
//!
//! Smallest `|μ|` is then largest `|ν|`. Because every quantity stays real no
//! imaginary residue can appear. A reduced eigenvalue of exactly zero is an
//! infinite generalized eigenvalue and is reported as `f64::INFINITY`.

use crate::estimator::{AdaptError, ensure_dim};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use ndarray_linalg::{Cholesky, Diag, Eigh, SolveTriangular, UPLO};

/// The selected eigenpairs, ordered from smallest to largest `|μ|`.
#[derive(Debug, Clone)]
pub struct GeneralizedEigen {
    /// Generalized eigenvalues `μ`, length `k`.
    pub values: Array1<f64>,
    /// Unit-norm eigenvectors as columns, shape `(n, k)`.
    pub vectors: Array2<f64>,
}

/// Solves `A v = μ B v` for symmetric positive definite `a` and symmetric `b`
/// and returns the `k` eigenpairs of smallest `|μ|`.
pub fn smallest_generalized(
    a: ArrayView2<f64>,
    b: ArrayView2<f64>,
    k: usize,
) -> Result<GeneralizedEigen, AdaptError> {
    let n = a.nrows();
    ensure_dim("eigenproblem left matrix columns", n, a.ncols())?;
    ensure_dim("eigenproblem right matrix rows", n, b.nrows())?;
    ensure_dim("eigenproblem right matrix columns", n, b.ncols())?;
    if k == 0 || k > n {
        return Err(AdaptError::InvalidConfig(format!(
            "requested {k} eigenvectors from a problem of size {n}"
        )));
    }

    let c = a
        .cholesky(UPLO::Lower)
        .map_err(AdaptError::EigenSolveFailed)?;

    // C⁻¹·B, then C⁻¹·(C⁻¹·B)ᵗ = C⁻¹·B·C⁻ᵗ since B is symmetric.
    let half = c
        .solve_triangular(UPLO::Lower, Diag::NonUnit, &b.to_owned())
        .map_err(AdaptError::EigenSolveFailed)?;
    let mut reduced = c
        .solve_triangular(UPLO::Lower, Diag::NonUnit, &half.t().to_owned())
        .map_err(AdaptError::EigenSolveFailed)?;
    symmetrize(&mut reduced);

    let (nu, w) = reduced
        .eigh(UPLO::Lower)
        .map_err(AdaptError::EigenSolveFailed)?;

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| nu[j].abs().total_cmp(&nu[i].abs()));
    order.truncate(k);
    log::debug!(
        "Selected reduced eigenvalues: {:?}",
        order.iter().map(|&i| nu[i]).collect::<Vec<_>>()
    );

    let selected = w.select(Axis(1), &order);
    let mut vectors = c
        .t()
        .solve_triangular(UPLO::Upper, Diag::NonUnit, &selected)
        .map_err(AdaptError::EigenSolveFailed)?;
    for mut column in vectors.axis_iter_mut(Axis(1)) {
        let norm = column.dot(&column).sqrt();
        if norm > 0.0 {
            column /= norm;
        }
    }

    let values = Array1::from_iter(order.iter().map(|&i| {
        if nu[i] == 0.0 {
            f64::INFINITY
        } else {
            1.0 / nu[i]
        }
    }));

    Ok(GeneralizedEigen { values, vectors })
}

/// Overwrites `m` with `(m + mᵗ)/2` to remove floating-point asymmetry.
pub(crate) fn symmetrize(m: &mut Array2<f64>) {
    let transposed = m.t().to_owned();
    *m += &transposed;
    *m *= 0.5;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_diagonal_problem_selects_smallest_magnitude() {
        let a = array![[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 4.0]];
        let b = array![[1.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 1.0]];
        // μ = 2, 0.25, 4
        let eig = smallest_generalized(a.view(), b.view(), 2).unwrap();
        assert_abs_diff_eq!(eig.values[0], 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(eig.values[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(eig.vectors[[1, 0]].abs(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(eig.vectors[[0, 1]].abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eigenpairs_satisfy_generalized_equation() {
        let a = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 2.0]];
        let b = array![[2.0, 0.3, 0.0], [0.3, 1.0, 0.1], [0.0, 0.1, 0.5]];
        let eig = smallest_generalized(a.view(), b.view(), 3).unwrap();
        for (idx, mu) in eig.values.iter().enumerate() {
            let v = eig.vectors.column(idx);
            assert_abs_diff_eq!(v.dot(&v), 1.0, epsilon = 1e-10);
            let lhs = a.dot(&v);
            let rhs = b.dot(&v) * *mu;
            for (l, r) in lhs.iter().zip(rhs.iter()) {
                assert_abs_diff_eq!(*l, *r, epsilon = 1e-8);
            }
        }
        assert!(eig.values[0].abs() <= eig.values[1].abs());
        assert!(eig.values[1].abs() <= eig.values[2].abs());
    }

    #[test]
    fn test_singular_right_matrix_gives_infinite_eigenvalue_last() {
        let a = array![[1.0, 0.0], [0.0, 1.0]];
        let b = array![[1.0, 0.0], [0.0, 0.0]];
        let eig = smallest_generalized(a.view(), b.view(), 2).unwrap();
        assert_abs_diff_eq!(eig.values[0], 1.0, epsilon = 1e-12);
        assert!(eig.values[1].is_infinite() || eig.values[1].abs() > 1e12);
    }

    #[test]
    fn test_indefinite_left_matrix_is_a_solver_failure() {
        let a = array![[1.0, 0.0], [0.0, -1.0]];
        let b = array![[1.0, 0.0], [0.0, 1.0]];
        let err = smallest_generalized(a.view(), b.view(), 1).unwrap_err();
        assert!(err.is_solver_failure());
    }

    #[test]
    fn test_too_many_components_rejected() {
        let a = Array2::<f64>::eye(2);
        let err = smallest_generalized(a.view(), a.view(), 3).unwrap_err();
        assert!(matches!(err, AdaptError::InvalidConfig(_)));
    }
}
