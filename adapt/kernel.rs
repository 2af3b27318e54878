// adapt/kernel.rs

//! Pairwise kernel matrices between sample sets.
//!
//! Samples are rows. The builders are pure functions of their inputs. Degenerate
//! evaluations (a fractional polynomial degree over a negative base, for example)
//! produce NaN entries which callers zero with [`sanitize_nan`] before any
//! factorisation touches the matrix.

use crate::estimator::{AdaptError, ensure_dim};
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// A kernel function together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Kernel {
    /// `k(x, y) = x·y`
    #[default]
    Linear,
    /// `k(x, y) = exp(-gamma ‖x − y‖²)`
    Rbf { gamma: f64 },
    /// `k(x, y) = (gamma x·y + coef0)^degree`
    #[serde(rename = "poly")]
    Polynomial { gamma: f64, coef0: f64, degree: f64 },
}

/// Kernel family selector used by the JDA option mapping, where a single scalar
/// parameter accompanies the family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    #[default]
    Linear,
    Rbf,
    Poly,
}

impl Kernel {
    /// Builds a kernel from a family and its scalar parameter.
    ///
    /// For `Rbf` the parameter is the bandwidth `gamma`; for `Poly` it is the
    /// degree, with unit scale and offset. `Linear` ignores it.
    pub fn from_kind(kind: KernelKind, param: f64) -> Self {
        match kind {
            KernelKind::Linear => Kernel::Linear,
            KernelKind::Rbf => Kernel::Rbf { gamma: param },
            KernelKind::Poly => Kernel::Polynomial {
                gamma: 1.0,
                coef0: 1.0,
                degree: param,
            },
        }
    }

    /// Evaluates the kernel on a single pair of samples.
    pub fn evaluate(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        match *self {
            Kernel::Linear => x.dot(&y),
            Kernel::Rbf { gamma } => {
                let sq_dist: f64 = x
                    .iter()
                    .zip(y.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                (-gamma * sq_dist).exp()
            }
            Kernel::Polynomial {
                gamma,
                coef0,
                degree,
            } => (gamma * x.dot(&y) + coef0).powf(degree),
        }
    }
}

/// Computes the `n1 × n2` matrix `K[i, j] = kernel(x_i, y_j)`.
///
/// `x` and `y` must share their feature dimension. Entries are returned exactly
/// as evaluated; NaN entries are left for the caller to sanitize.
pub fn kernel_matrix(
    x: ArrayView2<f64>,
    y: ArrayView2<f64>,
    kernel: &Kernel,
) -> Result<Array2<f64>, AdaptError> {
    ensure_dim("kernel feature dimension", x.ncols(), y.ncols())?;
    let k = match kernel {
        Kernel::Linear => x.dot(&y.t()),
        other => Array2::from_shape_fn((x.nrows(), y.nrows()), |(i, j)| {
            other.evaluate(x.row(i), y.row(j))
        }),
    };
    Ok(k)
}

/// Gram matrix of `x` with itself.
pub fn gram_matrix(x: ArrayView2<f64>, kernel: &Kernel) -> Result<Array2<f64>, AdaptError> {
    kernel_matrix(x, x, kernel)
}

/// Replaces every NaN entry with zero and returns how many were replaced.
pub fn sanitize_nan(matrix: &mut Array2<f64>) -> usize {
    let mut replaced = 0usize;
    matrix.mapv_inplace(|v| {
        if v.is_nan() {
            replaced += 1;
            0.0
        } else {
            v
        }
    });
    if replaced > 0 {
        log::warn!(
            "Zeroed {} NaN entries in a {}x{} matrix produced by degenerate kernel evaluations.",
            replaced,
            matrix.nrows(),
            matrix.ncols()
        );
    }
    replaced
}
