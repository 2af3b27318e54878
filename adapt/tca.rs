// adapt/tca.rs

//! # Transfer Component Analysis
//!
//! Learns a kernel subspace in which the marginal distributions of a source and
//! a target domain are close in the MMD sense while the variance of the pooled
//! data is preserved (Pan, Tsang, Kwok and Yang, IEEE TNN 2011).
//!
//! With `X = [Xs; Xt]`, kernel `K = k(X, X)`, marginal MMD matrix `L` and
//! centering matrix `H`, the transfer components are the solutions of
//!
//! ```text
//!     (K·L·Kᵗ + λI) v = μ (K·H·Kᵗ) v
//! ```
//!
//! with the smallest `|μ|`. Out-of-sample points are embedded through their
//! kernel against the stored fit data.

use crate::eigen::{self, GeneralizedEigen};
use crate::estimator::{AdaptError, Transformer, ensure_dim};
use crate::kernel::{self, Kernel};
use crate::mmd;
use ndarray::{Array1, Array2, ArrayView2, Axis, concatenate, s};
use serde::{Deserialize, Serialize};

/// Hyperparameters of a TCA fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TcaConfig {
    /// Dimension of the learned embedding. Must not exceed `ns + nt`.
    pub n_components: usize,
    pub kernel: Kernel,
    /// Ridge weight `λ` on the MMD term. Must be positive for the
    /// left-hand matrix to be positive definite.
    pub lambda: f64,
}

impl Default for TcaConfig {
    fn default() -> Self {
        Self {
            n_components: 2,
            kernel: Kernel::Linear,
            lambda: 1.0,
        }
    }
}

/// Everything retained by a successful fit.
#[derive(Debug, Clone)]
struct TcaFit {
    /// Transfer components, `(ns + nt, n_components)`.
    u: Array2<f64>,
    /// Generalized eigenvalues of the selected components.
    eigenvalues: Array1<f64>,
    /// Sanitized training kernel, `(ns + nt, ns + nt)`.
    k: Array2<f64>,
    xs: Array2<f64>,
    xt: Array2<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Tca {
    config: TcaConfig,
    fitted: Option<TcaFit>,
}

impl Tca {
    pub fn new(config: TcaConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &TcaConfig {
        &self.config
    }

    /// The transfer components `U`.
    pub fn components(&self) -> Result<&Array2<f64>, AdaptError> {
        Ok(&self.fit_state("components")?.u)
    }

    /// Generalized eigenvalues of the selected components, smallest `|μ|` first.
    pub fn eigenvalues(&self) -> Result<&Array1<f64>, AdaptError> {
        Ok(&self.fit_state("eigenvalues")?.eigenvalues)
    }

    fn fit_state(&self, operation: &'static str) -> Result<&TcaFit, AdaptError> {
        self.fitted.as_ref().ok_or(AdaptError::NotFitted {
            estimator: "TCA",
            operation,
        })
    }
}

impl Transformer for Tca {
    fn fit(&mut self, xs: ArrayView2<f64>, xt: ArrayView2<f64>) -> Result<(), AdaptError> {
        validate_domains(xs, xt)?;
        let (ns, nt) = (xs.nrows(), xt.nrows());
        let n = ns + nt;
        log::info!(
            "Fitting TCA on {} source and {} target samples ({} features, {} components).",
            ns,
            nt,
            xs.ncols(),
            self.config.n_components
        );

        let x = concatenate(Axis(0), &[xs.view(), xt.view()]).map_err(|_| {
            AdaptError::DimensionMismatch {
                context: "stacking source and target",
                expected: xs.ncols(),
                found: xt.ncols(),
            }
        })?;
        let mut l = mmd::marginal_mmd(ns, nt);
        kernel::sanitize_nan(&mut l);
        let mut k = kernel::gram_matrix(x.view(), &self.config.kernel)?;
        kernel::sanitize_nan(&mut k);
        let h = mmd::centering_matrix(n);

        let GeneralizedEigen { values, vectors } = solve_embedding(
            k.view(),
            l.view(),
            h.view(),
            self.config.lambda,
            self.config.n_components,
        )?;
        log::debug!("TCA eigenvalues: {:?}", values.to_vec());

        self.fitted = Some(TcaFit {
            u: vectors,
            eigenvalues: values,
            k,
            xs: xs.to_owned(),
            xt: xt.to_owned(),
        });
        Ok(())
    }

    fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, AdaptError> {
        let fit = self.fit_state("transform")?;
        ensure_dim("transform feature dimension", fit.xs.ncols(), x.ncols())?;
        let fit_data = concatenate(Axis(0), &[fit.xs.view(), fit.xt.view()]).map_err(|_| {
            AdaptError::DimensionMismatch {
                context: "stacking fit data",
                expected: fit.xs.ncols(),
                found: fit.xt.ncols(),
            }
        })?;
        let mut k = kernel::kernel_matrix(x, fit_data.view(), &self.config.kernel)?;
        kernel::sanitize_nan(&mut k);
        Ok(k.dot(&fit.u))
    }

    fn fit_transform(
        &mut self,
        xs: ArrayView2<f64>,
        xt: ArrayView2<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>), AdaptError> {
        self.fit(xs, xt)?;
        let fit = self.fit_state("fit_transform")?;
        let ns = fit.xs.nrows();
        let embedded = fit.k.dot(&fit.u);
        let source = embedded.slice(s![..ns, ..]).to_owned();
        let target = embedded.slice(s![ns.., ..]).to_owned();
        Ok((source, target))
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }
}

/// Rejects empty domains and non-conforming feature dimensions.
pub(crate) fn validate_domains(xs: ArrayView2<f64>, xt: ArrayView2<f64>) -> Result<(), AdaptError> {
    ensure_dim("target feature dimension", xs.ncols(), xt.ncols())?;
    if xs.nrows() == 0 || xt.nrows() == 0 {
        return Err(AdaptError::InvalidConfig(format!(
            "both domains need samples (source {}, target {})",
            xs.nrows(),
            xt.nrows()
        )));
    }
    Ok(())
}

/// Builds `K·M·Kᵗ + λI` and `K·H·Kᵗ` and returns the `n_components` generalized
/// eigenpairs of smallest `|μ|`.
pub(crate) fn solve_embedding(
    k: ArrayView2<f64>,
    m: ArrayView2<f64>,
    h: ArrayView2<f64>,
    lambda: f64,
    n_components: usize,
) -> Result<GeneralizedEigen, AdaptError> {
    let n = k.nrows();
    if !(lambda >= 0.0) {
        return Err(AdaptError::InvalidConfig(format!(
            "lambda must be non-negative, got {lambda}"
        )));
    }
    if n_components == 0 || n_components > n {
        return Err(AdaptError::InvalidConfig(format!(
            "n_components must lie in 1..={n}, got {n_components}"
        )));
    }

    let mut obj = k.dot(&m).dot(&k.t());
    obj.diag_mut().mapv_inplace(|v| v + lambda);
    eigen::symmetrize(&mut obj);
    let mut st = k.dot(&h).dot(&k.t());
    eigen::symmetrize(&mut st);

    eigen::smallest_generalized(obj.view(), st.view(), n_components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::DomainPairBuilder;

    #[test]
    fn test_transform_before_fit_is_not_fitted() {
        let tca = Tca::new(TcaConfig::default());
        let x = Array2::<f64>::zeros((3, 2));
        let err = tca.transform(x.view()).unwrap_err();
        assert!(matches!(
            err,
            AdaptError::NotFitted {
                estimator: "TCA",
                operation: "transform"
            }
        ));
        assert!(!tca.is_fitted());
        assert!(tca.components().is_err());
    }

    #[test]
    fn test_fit_transform_shapes() {
        let pair = DomainPairBuilder::new(12, 9, 4).seed(3).build();
        let mut tca = Tca::new(TcaConfig {
            n_components: 3,
            kernel: Kernel::Rbf { gamma: 0.5 },
            lambda: 1.0,
        });
        let (zs, zt) = tca.fit_transform(pair.xs.view(), pair.xt.view()).unwrap();
        assert_eq!(zs.dim(), (12, 3));
        assert_eq!(zt.dim(), (9, 3));
        assert!(zs.iter().chain(zt.iter()).all(|v| v.is_finite()));
        assert_eq!(tca.components().unwrap().dim(), (21, 3));
        assert_eq!(tca.eigenvalues().unwrap().len(), 3);
    }

    #[test]
    fn test_transform_of_fit_data_matches_fit_transform() {
        let pair = DomainPairBuilder::new(10, 10, 3).seed(21).build();
        let mut tca = Tca::new(TcaConfig::default());
        let (zs, zt) = tca.fit_transform(pair.xs.view(), pair.xt.view()).unwrap();
        let again_s = tca.transform(pair.xs.view()).unwrap();
        let again_t = tca.transform(pair.xt.view()).unwrap();
        for (a, b) in zs.iter().zip(again_s.iter()) {
            approx::assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
        for (a, b) in zt.iter().zip(again_t.iter()) {
            approx::assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_mismatched_feature_dimensions_rejected_before_fit() {
        let xs = Array2::<f64>::zeros((5, 3));
        let xt = Array2::<f64>::zeros((5, 4));
        let mut tca = Tca::new(TcaConfig::default());
        let err = tca.fit(xs.view(), xt.view()).unwrap_err();
        assert!(matches!(err, AdaptError::DimensionMismatch { .. }));
        assert!(!tca.is_fitted());
    }

    #[test]
    fn test_too_many_components_rejected() {
        let pair = DomainPairBuilder::new(3, 2, 2).build();
        let mut tca = Tca::new(TcaConfig {
            n_components: 6,
            ..TcaConfig::default()
        });
        let err = tca.fit(pair.xs.view(), pair.xt.view()).unwrap_err();
        assert!(matches!(err, AdaptError::InvalidConfig(_)));
    }

    #[test]
    fn test_fractional_polynomial_kernel_yields_finite_embedding() {
        let pair = DomainPairBuilder::new(8, 8, 3)
            .with_separation(2.0)
            .seed(13)
            .build();
        let kernel = Kernel::from_kind(crate::kernel::KernelKind::Poly, 0.5);
        let x = concatenate(Axis(0), &[pair.xs.view(), pair.xt.view()]).unwrap();
        let raw = kernel::gram_matrix(x.view(), &kernel).unwrap();
        assert!(raw.iter().any(|v| v.is_nan()));

        let mut tca = Tca::new(TcaConfig {
            n_components: 2,
            kernel,
            lambda: 1.0,
        });
        let (zs, zt) = tca.fit_transform(pair.xs.view(), pair.xt.view()).unwrap();
        assert!(zs.iter().chain(zt.iter()).all(|v| v.is_finite()));
        let projected = tca.transform(pair.xt.view()).unwrap();
        assert!(projected.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_config_rejects_unknown_keys() {
        let parsed: Result<TcaConfig, _> = toml::from_str("n_components = 4\nwidth = 2.0");
        assert!(parsed.is_err());
        let parsed: TcaConfig = toml::from_str("n_components = 4").unwrap();
        assert_eq!(parsed.n_components, 4);
        assert_eq!(parsed.lambda, 1.0);
    }
}
