// adapt/svm.rs

//! Binary linear soft-margin SVM with intercept, solved in the primal:
//!
//! ```text
//!     minimize    ½‖w‖² + C Σ ξ_i
//!     subject to  y_i (w·x_i + b) ≥ 1 − ξ_i,   ξ_i ≥ 0
//! ```
//!
//! Labels are arbitrary integers, exactly two distinct values. The larger one is
//! the positive side of the decision function.

use crate::estimator::{AdaptError, Fitter, Predictor, ensure_dim};
use crate::qp::{self, QuadraticProgram};
use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinearSvmConfig {
    /// Misclassification penalty `C`.
    pub c: f64,
    /// Interior-point iteration cap.
    pub max_iter: u32,
}

impl Default for LinearSvmConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: qp::DEFAULT_MAX_ITER,
        }
    }
}

#[derive(Debug, Clone)]
struct LinearSvmFit {
    coef: Array1<f64>,
    intercept: f64,
    /// `[negative, positive]` class labels.
    classes: [i64; 2],
}

#[derive(Debug, Clone, Default)]
pub struct LinearSvm {
    config: LinearSvmConfig,
    fitted: Option<LinearSvmFit>,
}

impl LinearSvm {
    pub fn new(config: LinearSvmConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Weight vector `w`.
    pub fn coef(&self) -> Result<&Array1<f64>, AdaptError> {
        Ok(&self.fit_state("coef")?.coef)
    }

    /// Intercept `b`.
    pub fn intercept(&self) -> Result<f64, AdaptError> {
        Ok(self.fit_state("intercept")?.intercept)
    }

    /// The two class labels, negative side first.
    pub fn classes(&self) -> Result<[i64; 2], AdaptError> {
        Ok(self.fit_state("classes")?.classes)
    }

    fn fit_state(&self, operation: &'static str) -> Result<&LinearSvmFit, AdaptError> {
        self.fitted.as_ref().ok_or(AdaptError::NotFitted {
            estimator: "LinearSvm",
            operation,
        })
    }
}

impl Fitter for LinearSvm {
    type Label = i64;

    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<i64>) -> Result<(), AdaptError> {
        ensure_dim("training labels", x.nrows(), y.len())?;
        if !(self.config.c > 0.0) {
            return Err(AdaptError::InvalidConfig(format!(
                "C must be positive, got {}",
                self.config.c
            )));
        }
        let classes: Vec<i64> = y.iter().copied().sorted().dedup().collect();
        let classes: [i64; 2] = classes.as_slice().try_into().map_err(|_| {
            AdaptError::InvalidLabels(format!(
                "a binary classifier needs exactly two classes, found {classes:?}"
            ))
        })?;
        let signs = y.mapv(|label| if label == classes[1] { 1.0 } else { -1.0 });

        let (n, d) = x.dim();
        let m = d + 1 + n;
        let mut p = Array2::<f64>::zeros((m, m));
        for i in 0..d {
            p[[i, i]] = 1.0;
        }
        let mut q = Array1::<f64>::zeros(m);
        q.slice_mut(s![d + 1..]).fill(self.config.c);

        let mut g = Array2::<f64>::zeros((2 * n, m));
        let mut h = Array1::<f64>::zeros(2 * n);
        for i in 0..n {
            let yi = signs[i];
            g.slice_mut(s![i, ..d]).assign(&(&x.row(i) * -yi));
            g[[i, d]] = -yi;
            g[[i, d + 1 + i]] = -1.0;
            h[i] = -1.0;
            g[[n + i, d + 1 + i]] = -1.0;
        }

        let solution = QuadraticProgram { p, q, g, h }.solve(self.config.max_iter)?;
        let coef = solution.slice(s![..d]).to_owned();
        let intercept = solution[d];
        log::debug!(
            "LinearSvm fitted on {} samples, {} features (|w| = {:.4e}, b = {:.4e}).",
            n,
            d,
            coef.dot(&coef).sqrt(),
            intercept
        );
        self.fitted = Some(LinearSvmFit {
            coef,
            intercept,
            classes,
        });
        Ok(())
    }
}

impl Predictor for LinearSvm {
    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, AdaptError> {
        let fit = self.fit_state("decision_function")?;
        ensure_dim("decision feature dimension", fit.coef.len(), x.ncols())?;
        Ok(x.dot(&fit.coef) + fit.intercept)
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<i64>, AdaptError> {
        let classes = self.classes()?;
        let decision = self.decision_function(x)?;
        Ok(decision.mapv(|v| if v > 0.0 { classes[1] } else { classes[0] }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::two_blobs;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_separable_blobs_with_offset() {
        let (x, y) = two_blobs(15, &[1.5, 1.5], 0.4, 8);
        // Shift both blobs away from the origin so the intercept matters.
        let x = x + 5.0;
        let labels = y.mapv(|v| if v > 0.0 { 3 } else { 0 });
        let mut svm = LinearSvm::new(LinearSvmConfig {
            c: 10.0,
            ..LinearSvmConfig::default()
        });
        svm.fit(x.view(), labels.view()).unwrap();
        assert_eq!(svm.classes().unwrap(), [0, 3]);
        assert_abs_diff_eq!(svm.score(x.view(), labels.view()).unwrap(), 1.0);
        assert!(svm.intercept().unwrap() < 0.0);
    }

    #[test]
    fn test_max_margin_on_symmetric_points() {
        let x = array![[-1.0], [1.0]];
        let y = array![-1, 1];
        let mut svm = LinearSvm::new(LinearSvmConfig {
            c: 100.0,
            ..LinearSvmConfig::default()
        });
        svm.fit(x.view(), y.view()).unwrap();
        assert_abs_diff_eq!(svm.coef().unwrap()[0], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(svm.intercept().unwrap(), 0.0, epsilon = 1e-4);
        let decision = svm.decision_function(x.view()).unwrap();
        assert_abs_diff_eq!(decision[0], -1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(decision[1], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[0.0], [1.0]];
        let y = array![1, 1];
        let mut svm = LinearSvm::default();
        let err = svm.fit(x.view(), y.view()).unwrap_err();
        assert!(matches!(err, AdaptError::InvalidLabels(_)));
    }

    #[test]
    fn test_predict_before_fit() {
        let svm = LinearSvm::default();
        let x = array![[0.0]];
        assert!(matches!(
            svm.predict(x.view()),
            Err(AdaptError::NotFitted { .. })
        ));
    }
}
