// adapt/jda.rs

//! # Joint Distribution Adaptation
//!
//! Extends TCA by also aligning the class-conditional distributions, using the
//! current target pseudo-labels (Long, Wang, Ding, Sun and Yu, ICCV 2013). The
//! MMD matrix becomes `M = M0 + Σ_c M_c`, where `M0` is TCA's marginal matrix
//! and each `M_c` aligns the source samples of class `c` with the target samples
//! currently pseudo-labelled `c`.
//!
//! The inputs follow the feature-by-sample convention: `xs` is `(d, ns)` and
//! `xt` is `(d, nt)`, so each column is one sample. The joint embedding `Z` is
//! returned in the same orientation, `(k, ns + nt)`.

use crate::estimator::{AdaptError, ensure_dim};
use crate::kernel::{self, Kernel, KernelKind};
use crate::mmd;
use crate::tca::{solve_embedding, validate_domains};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, concatenate};
use serde::{Deserialize, Serialize};

/// JDA options. The short key names `lmbda` and `ker` are accepted
/// as aliases; any other unrecognised key is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JdaConfig {
    /// Embedding dimension.
    pub k: usize,
    /// Regularisation weight `λ`.
    #[serde(alias = "lmbda")]
    pub lambda: f64,
    #[serde(alias = "ker")]
    pub kernel: KernelKind,
    /// RBF bandwidth, or polynomial degree for `poly`.
    pub gamma: f64,
}

impl Default for JdaConfig {
    fn default() -> Self {
        Self {
            k: 100,
            lambda: 1000.0,
            kernel: KernelKind::Linear,
            gamma: 1.0,
        }
    }
}

impl JdaConfig {
    pub fn kernel(&self) -> Kernel {
        Kernel::from_kind(self.kernel, self.gamma)
    }
}

/// Result of one JDA solve.
#[derive(Debug, Clone)]
pub struct JdaOutput {
    /// Joint embedding `Aᵗ·K`, `(k, ns + nt)`. The first `ns` columns are source samples.
    pub z: Array2<f64>,
    /// Projection basis, `(ns + nt, k)`.
    pub a: Array2<f64>,
    /// Generalized eigenvalues of the selected basis vectors, smallest `|μ|` first.
    pub phi: Array1<f64>,
}

impl JdaOutput {
    /// Source embedding, one row per source sample.
    pub fn source_embedding(&self, ns: usize) -> Array2<f64> {
        self.z.slice(ndarray::s![.., ..ns]).t().to_owned()
    }

    /// Target embedding, one row per target sample.
    pub fn target_embedding(&self, ns: usize) -> Array2<f64> {
        self.z.slice(ndarray::s![.., ns..]).t().to_owned()
    }
}

/// Runs one JDA solve with the given source labels and target pseudo-labels.
///
/// A class present on only one side contributes no conditional term, so with
/// no overlapping classes this reduces to a marginal-only (TCA) alignment.
pub fn jda(
    xs: ArrayView2<f64>,
    xt: ArrayView2<f64>,
    ys: ArrayView1<i64>,
    yt: ArrayView1<i64>,
    config: &JdaConfig,
) -> Result<JdaOutput, AdaptError> {
    let mut estimator = Jda::new(*config);
    estimator.fit(xs, xt, ys, yt)?;
    estimator.into_output("jda")
}

#[derive(Debug, Clone)]
struct JdaFit {
    output: JdaOutput,
    /// Stacked fit samples `[Xs; Xt]`, one row per sample.
    x: Array2<f64>,
}

/// JDA estimator retaining its basis and fit data for out-of-sample projection.
#[derive(Debug, Clone, Default)]
pub struct Jda {
    config: JdaConfig,
    fitted: Option<JdaFit>,
}

impl Jda {
    pub fn new(config: JdaConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &JdaConfig {
        &self.config
    }

    /// Learns the joint embedding. `xs` is `(d, ns)`, `xt` is `(d, nt)`.
    pub fn fit(
        &mut self,
        xs: ArrayView2<f64>,
        xt: ArrayView2<f64>,
        ys: ArrayView1<i64>,
        yt: ArrayView1<i64>,
    ) -> Result<&JdaOutput, AdaptError> {
        let (xs, xt) = (xs.reversed_axes(), xt.reversed_axes());
        validate_domains(xs, xt)?;
        ensure_dim("source labels", xs.nrows(), ys.len())?;
        ensure_dim("target pseudo-labels", xt.nrows(), yt.len())?;
        let (ns, nt) = (xs.nrows(), xt.nrows());
        log::debug!(
            "JDA solve: {} source, {} target, {} features, k = {}, lambda = {}.",
            ns,
            nt,
            xs.ncols(),
            self.config.k,
            self.config.lambda
        );

        let x = concatenate(Axis(0), &[xs.view(), xt.view()]).map_err(|_| {
            AdaptError::DimensionMismatch {
                context: "stacking source and target",
                expected: xs.ncols(),
                found: xt.ncols(),
            }
        })?;
        let mut m = mmd::joint_mmd(ys, yt);
        kernel::sanitize_nan(&mut m);
        let mut k = kernel::gram_matrix(x.view(), &self.config.kernel())?;
        kernel::sanitize_nan(&mut k);
        let h = mmd::centering_matrix(ns + nt);

        let eig = solve_embedding(k.view(), m.view(), h.view(), self.config.lambda, self.config.k)?;
        let z = eig.vectors.t().dot(&k);

        self.fitted = Some(JdaFit {
            output: JdaOutput {
                z,
                a: eig.vectors,
                phi: eig.values,
            },
            x,
        });
        self.output("fit")
    }

    /// The most recent fit result.
    pub fn output(&self, operation: &'static str) -> Result<&JdaOutput, AdaptError> {
        self.fitted
            .as_ref()
            .map(|fit| &fit.output)
            .ok_or(AdaptError::NotFitted {
                estimator: "JDA",
                operation,
            })
    }

    /// Embeds new samples given as rows, `(m, d)`, returning `(m, k)`.
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, AdaptError> {
        let fit = self.fitted.as_ref().ok_or(AdaptError::NotFitted {
            estimator: "JDA",
            operation: "transform",
        })?;
        let mut k = kernel::kernel_matrix(x, fit.x.view(), &self.config.kernel())?;
        kernel::sanitize_nan(&mut k);
        Ok(k.dot(&fit.output.a))
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn into_output(self, operation: &'static str) -> Result<JdaOutput, AdaptError> {
        self.fitted
            .map(|fit| fit.output)
            .ok_or(AdaptError::NotFitted {
                estimator: "JDA",
                operation,
            })
    }
}
