// adapt/mmd.rs

//! Maximum Mean Discrepancy weighting matrices.
//!
//! Rows and columns index the stacked samples `[source; target]`. Every matrix
//! here is an outer product `e·eᵗ` (or a sum of them) of a signed indicator
//! vector whose source block sums to one and whose target block sums to minus
//! one, so each has zero total sum.

use ndarray::{Array1, Array2, ArrayView1, Axis, s};
use std::collections::BTreeSet;

/// Marginal MMD matrix: `L = e·eᵗ` with `e = [1/ns; −1/nt]`.
pub fn marginal_mmd(ns: usize, nt: usize) -> Array2<f64> {
    let mut e = Array1::<f64>::zeros(ns + nt);
    e.slice_mut(s![..ns]).fill(1.0 / ns as f64);
    e.slice_mut(s![ns..]).fill(-1.0 / nt as f64);
    outer(&e)
}

/// Classes holding at least one source sample and at least one target sample.
pub fn shared_classes(ys: ArrayView1<i64>, yt: ArrayView1<i64>) -> Vec<i64> {
    let source: BTreeSet<i64> = ys.iter().copied().collect();
    let target: BTreeSet<i64> = yt.iter().copied().collect();
    source.intersection(&target).copied().collect()
}

/// Sum over shared classes `c` of the class-conditional blocks `M_c = e_c·e_cᵗ`,
/// where `e_c` is `1/|S_c|` on source samples of class `c`, `−1/|T_c|` on target
/// samples pseudo-labelled `c`, and zero elsewhere.
///
/// Classes present on only one side contribute nothing, so with no shared class
/// the result is the zero matrix.
pub fn class_conditional_mmd(ys: ArrayView1<i64>, yt: ArrayView1<i64>) -> Array2<f64> {
    let ns = ys.len();
    let n = ns + yt.len();
    let mut m = Array2::<f64>::zeros((n, n));

    for class in shared_classes(ys, yt) {
        let source_idx: Vec<usize> = indices_of(ys, class).collect();
        let target_idx: Vec<usize> = indices_of(yt, class).map(|i| ns + i).collect();

        let mut e = Array1::<f64>::zeros(n);
        let source_weight = 1.0 / source_idx.len() as f64;
        let target_weight = -1.0 / target_idx.len() as f64;
        for &i in &source_idx {
            e[i] = source_weight;
        }
        for &i in &target_idx {
            e[i] = target_weight;
        }
        log::debug!(
            "Class {} contributes a conditional block ({} source, {} target samples).",
            class,
            source_idx.len(),
            target_idx.len()
        );
        m += &outer(&e);
    }
    m
}

/// Joint MMD matrix `M = M0 + Σ_c M_c`.
pub fn joint_mmd(ys: ArrayView1<i64>, yt: ArrayView1<i64>) -> Array2<f64> {
    let mut m = marginal_mmd(ys.len(), yt.len());
    m += &class_conditional_mmd(ys, yt);
    m
}

/// Centering matrix `H = I − (1/n)·J`.
pub fn centering_matrix(n: usize) -> Array2<f64> {
    let mut h = Array2::<f64>::from_elem((n, n), -1.0 / n as f64);
    h.diag_mut().mapv_inplace(|v| v + 1.0);
    h
}

fn indices_of(labels: ArrayView1<'_, i64>, class: i64) -> impl Iterator<Item = usize> + '_ {
    labels
        .into_iter()
        .enumerate()
        .filter(move |(_, label)| **label == class)
        .map(|(i, _)| i)
}

fn outer(e: &Array1<f64>) -> Array2<f64> {
    let column = e.view().insert_axis(Axis(1));
    let row = e.view().insert_axis(Axis(0));
    column.dot(&row)
}
