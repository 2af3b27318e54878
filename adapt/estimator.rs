//! # Estimator Capabilities and Errors
//!
//! Every algorithm in this crate is an owned struct carrying its configuration
//! and, after a successful `fit`, its fitted state. The traits here are the
//! small capability seams the experiment harness and the refinement loop rely on.
//!
//! Fitted state is only ever mutated by `fit`. Fitting the same instance from
//! several threads at once is not supported.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use thiserror::Error;

/// A comprehensive error type for the adaptation core.
#[derive(Error, Debug)]
pub enum AdaptError {
    #[error("{estimator} has not been fitted. Call `fit` before `{operation}`.")]
    NotFitted {
        estimator: &'static str,
        operation: &'static str,
    },

    #[error("Dimension mismatch in {context}: expected {expected}, found {found}.")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid labels: {0}")]
    InvalidLabels(String),

    #[error("The generalized eigenproblem could not be solved: {0}")]
    EigenSolveFailed(ndarray_linalg::error::LinalgError),

    #[error("The quadratic program was not solved (solver status: {0}).")]
    QpSolveFailed(String),
}

impl AdaptError {
    /// True for failures raised by the eigensolver or the QP solver.
    pub fn is_solver_failure(&self) -> bool {
        matches!(
            self,
            AdaptError::EigenSolveFailed(_) | AdaptError::QpSolveFailed(_)
        )
    }
}

/// Checks that two counts agree, producing a `DimensionMismatch` otherwise.
pub(crate) fn ensure_dim(
    context: &'static str,
    expected: usize,
    found: usize,
) -> Result<(), AdaptError> {
    if expected != found {
        return Err(AdaptError::DimensionMismatch {
            context,
            expected,
            found,
        });
    }
    Ok(())
}

/// An unsupervised estimator learning a shared embedding of a source and a target domain.
pub trait Transformer {
    /// Learns the embedding from source samples `xs` (ns × d) and target samples `xt` (nt × d).
    fn fit(&mut self, xs: ArrayView2<f64>, xt: ArrayView2<f64>) -> Result<(), AdaptError>;

    /// Projects new samples (rows) into the learned embedding.
    fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, AdaptError>;

    /// Fits, then returns the source and target embeddings.
    fn fit_transform(
        &mut self,
        xs: ArrayView2<f64>,
        xt: ArrayView2<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>), AdaptError>;

    fn is_fitted(&self) -> bool;
}

/// A supervised estimator.
pub trait Fitter {
    /// The class label type the estimator is trained on.
    type Label: Copy + PartialEq;

    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<Self::Label>) -> Result<(), AdaptError>;
}

/// A fitted linear classifier.
pub trait Predictor: Fitter {
    /// Raw signed scores, one per row of `x`.
    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, AdaptError>;

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<Self::Label>, AdaptError>;

    /// Fraction of rows of `x` whose prediction equals `y`.
    fn score(&self, x: ArrayView2<f64>, y: ArrayView1<Self::Label>) -> Result<f64, AdaptError> {
        ensure_dim("score labels", x.nrows(), y.len())?;
        let predictions = self.predict(x)?;
        if predictions.is_empty() {
            return Ok(0.0);
        }
        let hits = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| p == t)
            .count();
        Ok(hits as f64 / predictions.len() as f64)
    }
}
