// adapt/qp.rs

//! Dense convex quadratic programs in inequality form
//!
//! ```text
//!     minimize    ½ xᵗ P x + qᵗ x
//!     subject to  G x ≤ h
//! ```
//!
//! handed to the Clarabel interior-point solver. `G x ≤ h` maps onto Clarabel's
//! `A x + s = b, s ≥ 0` with `A = G`, `b = h`.

use crate::estimator::{AdaptError, ensure_dim};
use clarabel::algebra::CscMatrix;
use clarabel::solver::{DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT};
use ndarray::{Array1, Array2, ArrayView2};

/// Iteration cap passed to the interior-point solver.
pub const DEFAULT_MAX_ITER: u32 = 200;

#[derive(Debug, Clone)]
pub struct QuadraticProgram {
    /// Symmetric positive semidefinite Hessian, `(m, m)`.
    pub p: Array2<f64>,
    /// Linear term, length `m`.
    pub q: Array1<f64>,
    /// Inequality matrix, `(r, m)`.
    pub g: Array2<f64>,
    /// Inequality bounds, length `r`.
    pub h: Array1<f64>,
}

impl QuadraticProgram {
    /// Number of optimisation variables.
    pub fn num_variables(&self) -> usize {
        self.q.len()
    }

    /// Solves the program and returns the optimal point.
    ///
    /// Any outcome other than a (near-)optimal solution is returned as
    /// [`AdaptError::QpSolveFailed`] carrying the solver status.
    pub fn solve(&self, max_iter: u32) -> Result<Array1<f64>, AdaptError> {
        let m = self.num_variables();
        ensure_dim("QP Hessian rows", m, self.p.nrows())?;
        ensure_dim("QP Hessian columns", m, self.p.ncols())?;
        ensure_dim("QP constraint columns", m, self.g.ncols())?;
        ensure_dim("QP constraint bounds", self.g.nrows(), self.h.len())?;

        let p = dense_to_csc(self.p.view(), true);
        let a = dense_to_csc(self.g.view(), false);
        let q = self.q.to_vec();
        let b = self.h.to_vec();
        let cones = [SupportedConeT::NonnegativeConeT(self.h.len())];

        let settings = DefaultSettings::<f64> {
            verbose: false,
            max_iter,
            ..DefaultSettings::default()
        };

        log::debug!(
            "Solving QP with {} variables and {} inequality constraints.",
            m,
            self.h.len()
        );
        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = solver.solution.status;
        match status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {
                log::debug!(
                    "QP solved in {} iterations (status {:?}).",
                    solver.solution.iterations,
                    status
                );
                Ok(Array1::from_vec(solver.solution.x.clone()))
            }
            other => Err(AdaptError::QpSolveFailed(format!("{other:?}"))),
        }
    }
}

/// Converts a dense matrix to compressed sparse column form, skipping zeros.
/// With `upper_only` only entries on or above the diagonal are kept, which is
/// the triangle Clarabel reads from the Hessian.
fn dense_to_csc(matrix: ArrayView2<f64>, upper_only: bool) -> CscMatrix<f64> {
    let (rows, cols) = matrix.dim();
    let mut colptr = Vec::with_capacity(cols + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);
    for j in 0..cols {
        let last_row = if upper_only { (j + 1).min(rows) } else { rows };
        for i in 0..last_row {
            let v = matrix[[i, j]];
            if v != 0.0 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(rows, cols, colptr, rowval, nzval)
}
