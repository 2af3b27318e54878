// adapt/cdsvm.rs

//! # Cross-Domain SVM
//!
//! A linear SVM for a new domain that keeps the support vectors of a previously
//! trained source model in play (Jiang, Zavesky, Chang and Loui, ICIP 2008).
//! Each prior support vector gets its own slack, priced by how similar it is to
//! the new data:
//!
//! ```text
//!     minimize    ‖w‖² + C Σ_i ξ_i + C Σ_j σ(v_j) ζ_j
//!     subject to  y_i (w·x_i) ≥ 1 − ξ_i,   ξ_i ≥ 0
//!                 l_j (w·v_j) ≥ 1 − ζ_j,   ζ_j ≥ 0
//!     σ(v) = mean_i exp(−β ‖v − x_i‖)
//! ```
//!
//! The decision function has no intercept. Labels are `±1.0`.

use crate::estimator::{AdaptError, Fitter, Predictor, ensure_dim};
use crate::qp::{self, QuadraticProgram};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CdsvmConfig {
    /// Slack penalty `C`. Must be positive.
    pub c: f64,
    /// Similarity decay `β`. Must be positive.
    pub beta: f64,
}

impl Default for CdsvmConfig {
    fn default() -> Self {
        Self { c: 0.1, beta: 0.5 }
    }
}

#[derive(Debug, Clone)]
pub struct Cdsvm {
    config: CdsvmConfig,
    support_vectors: Array2<f64>,
    support_vector_labels: Array1<f64>,
    coef: Option<Array1<f64>>,
}

impl Cdsvm {
    /// Creates an unfitted model borrowing the support set of a prior model.
    /// Pass a `(0, d)` matrix and an empty label vector for no prior.
    pub fn new(
        support_vectors: Array2<f64>,
        support_vector_labels: Array1<f64>,
        config: CdsvmConfig,
    ) -> Result<Self, AdaptError> {
        ensure_dim(
            "support vector labels",
            support_vectors.nrows(),
            support_vector_labels.len(),
        )?;
        check_signed_labels(support_vector_labels.view())?;
        Ok(Self {
            config,
            support_vectors,
            support_vector_labels,
            coef: None,
        })
    }

    /// A model with no prior support set.
    pub fn without_prior(n_features: usize, config: CdsvmConfig) -> Self {
        Self {
            config,
            support_vectors: Array2::zeros((0, n_features)),
            support_vector_labels: Array1::zeros(0),
            coef: None,
        }
    }

    pub fn config(&self) -> &CdsvmConfig {
        &self.config
    }

    pub fn support_vectors(&self) -> ArrayView2<'_, f64> {
        self.support_vectors.view()
    }

    /// Fitted weight vector.
    pub fn coef(&self) -> Result<&Array1<f64>, AdaptError> {
        self.coef.as_ref().ok_or(AdaptError::NotFitted {
            estimator: "CDSVM",
            operation: "coef",
        })
    }

    /// Mean similarity `exp(−β ‖v − x_i‖)` of a support vector to the new samples.
    pub fn sigma(&self, support_vector: ArrayView1<f64>, x: ArrayView2<f64>) -> f64 {
        if x.nrows() == 0 {
            return 0.0;
        }
        let total: f64 = x
            .rows()
            .into_iter()
            .map(|row| {
                let dist = row
                    .iter()
                    .zip(support_vector.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>()
                    .sqrt();
                (-self.config.beta * dist).exp()
            })
            .sum();
        total / x.nrows() as f64
    }

    fn build_program(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> QuadraticProgram {
        let (n, d) = x.dim();
        let n_support = self.support_vector_labels.len();
        let m = d + n + n_support;
        let c = self.config.c;

        let mut p = Array2::<f64>::zeros((m, m));
        for i in 0..d {
            p[[i, i]] = 2.0;
        }

        let mut q = Array1::<f64>::zeros(m);
        q.slice_mut(s![d..d + n]).fill(c);
        for j in 0..n_support {
            q[d + n + j] = c * self.sigma(self.support_vectors.row(j), x);
        }

        let rows = 2 * (n + n_support);
        let mut g = Array2::<f64>::zeros((rows, m));
        let mut h = Array1::<f64>::zeros(rows);
        for i in 0..n {
            g.slice_mut(s![i, ..d]).assign(&(&x.row(i) * -y[i]));
            g[[i, d + i]] = -1.0;
            h[i] = -1.0;
            g[[n + i, d + i]] = -1.0;
        }
        let offset = 2 * n;
        for j in 0..n_support {
            let label = self.support_vector_labels[j];
            g.slice_mut(s![offset + j, ..d])
                .assign(&(&self.support_vectors.row(j) * -label));
            g[[offset + j, d + n + j]] = -1.0;
            h[offset + j] = -1.0;
            g[[offset + n_support + j, d + n + j]] = -1.0;
        }

        QuadraticProgram { p, q, g, h }
    }
}

impl Fitter for Cdsvm {
    type Label = f64;

    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<(), AdaptError> {
        ensure_dim("training labels", x.nrows(), y.len())?;
        if !self.support_vector_labels.is_empty() {
            ensure_dim(
                "support vector feature dimension",
                x.ncols(),
                self.support_vectors.ncols(),
            )?;
        }
        check_signed_labels(y)?;
        log::info!(
            "Fitting CDSVM on {} samples with {} prior support vectors (C = {}, beta = {}).",
            x.nrows(),
            self.support_vector_labels.len(),
            self.config.c,
            self.config.beta
        );

        let program = self.build_program(x, y);
        let solution = program.solve(qp::DEFAULT_MAX_ITER)?;
        self.coef = Some(solution.slice(s![..x.ncols()]).to_owned());
        Ok(())
    }
}

impl Predictor for Cdsvm {
    /// `X·wᵗ`.
    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, AdaptError> {
        let coef = self.coef.as_ref().ok_or(AdaptError::NotFitted {
            estimator: "CDSVM",
            operation: "decision_function",
        })?;
        ensure_dim("decision feature dimension", coef.len(), x.ncols())?;
        Ok(x.dot(coef))
    }

    /// Sign of the decision function; exactly zero scores map to `0.0`.
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, AdaptError> {
        Ok(self.decision_function(x)?.mapv(|v| {
            if v > 0.0 {
                1.0
            } else if v < 0.0 {
                -1.0
            } else {
                0.0
            }
        }))
    }
}

fn check_signed_labels(y: ArrayView1<f64>) -> Result<(), AdaptError> {
    match y.iter().find(|&&v| v != 1.0 && v != -1.0) {
        Some(bad) => Err(AdaptError::InvalidLabels(format!(
            "expected labels in {{-1, +1}}, found {bad}"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::two_blobs;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_decision_function_is_linear_readout() {
        let mut model = Cdsvm::without_prior(3, CdsvmConfig::default());
        model.coef = Some(array![0.5, -1.0, 2.0]);
        let x = array![[1.0, 2.0, 3.0], [0.0, 0.0, 0.0], [-2.0, 1.0, 0.25]];
        let decision = model.decision_function(x.view()).unwrap();
        assert_eq!(decision, x.dot(&array![0.5, -1.0, 2.0]));
        assert_eq!(model.predict(x.view()).unwrap(), array![1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_sigma_is_mean_exponential_similarity() {
        let model = Cdsvm::without_prior(2, CdsvmConfig { c: 1.0, beta: 2.0 });
        let x = array![[0.0, 0.0], [3.0, 4.0]];
        let v = array![0.0, 0.0];
        let expected = (1.0 + (-10.0_f64).exp()) / 2.0;
        assert_abs_diff_eq!(model.sigma(v.view(), x.view()), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_separable_blobs_without_prior() {
        let (x, y) = two_blobs(10, &[2.0, 2.0], 0.5, 4);
        let mut model = Cdsvm::without_prior(2, CdsvmConfig { c: 1.0, beta: 0.5 });
        model.fit(x.view(), y.view()).unwrap();
        assert!(model.score(x.view(), y.view()).unwrap() >= 0.95);
    }

    #[test]
    fn test_prior_support_vectors_shape_the_boundary() {
        // New data alone says nothing about the second axis.
        let x = array![[1.0, 0.0], [-1.0, 0.0]];
        let y = array![1.0, -1.0];
        let support = array![[0.0, 1.0], [0.0, -1.0]];
        let support_labels = array![1.0, -1.0];
        let mut model =
            Cdsvm::new(support, support_labels, CdsvmConfig { c: 10.0, beta: 0.1 }).unwrap();
        model.fit(x.view(), y.view()).unwrap();
        let coef = model.coef().unwrap();
        assert!(coef[0] > 0.1);
        assert!(coef[1] > 0.1);
    }

    #[test]
    fn test_labels_outside_plus_minus_one_rejected() {
        let mut model = Cdsvm::without_prior(1, CdsvmConfig::default());
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 0.0];
        assert!(matches!(
            model.fit(x.view(), y.view()),
            Err(AdaptError::InvalidLabels(_))
        ));
        let err = Cdsvm::new(array![[1.0]], array![2.0], CdsvmConfig::default()).unwrap_err();
        assert!(matches!(err, AdaptError::InvalidLabels(_)));
    }

    #[test]
    fn test_support_dimension_mismatch_rejected() {
        let mut model =
            Cdsvm::new(array![[1.0, 2.0, 3.0]], array![1.0], CdsvmConfig::default()).unwrap();
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![1.0, -1.0];
        assert!(matches!(
            model.fit(x.view(), y.view()),
            Err(AdaptError::DimensionMismatch { .. })
        ));
    }
}
