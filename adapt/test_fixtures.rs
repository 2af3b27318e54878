//! Test fixtures and builders for domain-adaptation tests.
//!
//! This module provides reusable builders for synthetic source/target pairs,
//! reducing boilerplate across unit tests, integration tests and benchmarks.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// A synthetic source/target pair with binary `{-1, +1}` labels.
#[derive(Clone, Debug)]
pub struct DomainPair {
    /// Source samples, `(ns, d)`.
    pub xs: Array2<f64>,
    /// Source labels, alternating `+1, -1, ...`.
    pub ys: Array1<i64>,
    /// Target samples, `(nt, d)`.
    pub xt: Array2<f64>,
    /// Target labels, alternating `+1, -1, ...`.
    pub yt: Array1<i64>,
}

/// Builder for creating a synthetic domain pair with configurable properties.
pub struct DomainPairBuilder {
    ns: usize,
    nt: usize,
    n_features: usize,
    separation: f64,
    target_shift: f64,
    seed: u64,
}

impl DomainPairBuilder {
    /// Create a builder with standard-normal features, no class signal and no shift.
    pub fn new(ns: usize, nt: usize, n_features: usize) -> Self {
        Self {
            ns,
            nt,
            n_features,
            separation: 0.0,
            target_shift: 0.0,
            seed: 42,
        }
    }

    /// Offset every feature by `±separation` according to the class label.
    pub fn with_separation(mut self, s: f64) -> Self {
        self.separation = s;
        self
    }

    /// Offset every target feature by `shift`, simulating a domain change.
    pub fn with_target_shift(mut self, shift: f64) -> Self {
        self.target_shift = shift;
        self
    }

    /// Set the random seed for reproducibility.
    pub fn seed(mut self, s: u64) -> Self {
        self.seed = s;
        self
    }

    pub fn build(self) -> DomainPair {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let ys = alternating_labels(self.ns);
        let yt = alternating_labels(self.nt);
        let xs = self.sample(&mut rng, &ys, 0.0);
        let xt = self.sample(&mut rng, &yt, self.target_shift);
        DomainPair { xs, ys, xt, yt }
    }

    fn sample(&self, rng: &mut StdRng, labels: &Array1<i64>, shift: f64) -> Array2<f64> {
        Array2::from_shape_fn((labels.len(), self.n_features), |(i, _)| {
            let noise: f64 = rng.sample(StandardNormal);
            noise + self.separation * labels[i] as f64 + shift
        })
    }
}

fn alternating_labels(n: usize) -> Array1<i64> {
    Array1::from_iter((0..n).map(|i| if i % 2 == 0 { 1 } else { -1 }))
}

/// Two isotropic Gaussian blobs centred at `+center` (label `+1.0`) and
/// `-center` (label `-1.0`), `n_per_class` points each.
pub fn two_blobs(
    n_per_class: usize,
    center: &[f64],
    spread: f64,
    seed: u64,
) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let d = center.len();
    let n = 2 * n_per_class;
    let labels = Array1::from_iter((0..n).map(|i| if i < n_per_class { 1.0 } else { -1.0 }));
    let x = Array2::from_shape_fn((n, d), |(i, j)| {
        let noise: f64 = rng.sample(StandardNormal);
        labels[i] * center[j] + spread * noise
    });
    (x, labels)
}
