// adapt/refine.rs

//! # Iterative Pseudo-Label Refinement
//!
//! Drives JDA across a fixed number of iterations for one cross-validation fold
//! of the target domain. Target samples in the training fold keep their known
//! labels; samples in the test fold carry pseudo-labels that each iteration
//! overwrites:
//!
//! 1. embed source and target with JDA under the current pseudo-labels,
//! 2. train a linear SVM on the source embedding plus the training-fold target
//!    embedding,
//! 3. relabel the test fold with that classifier.
//!
//! There is no convergence check. The loop runs exactly `max_iter` times and
//! the last iteration's predictions and decision scores are the fold result.
//! Any failing iteration fails the fold.

use crate::estimator::{AdaptError, Fitter, Predictor, ensure_dim};
use crate::jda::{self, JdaConfig};
use crate::svm::{LinearSvm, LinearSvmConfig};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, concatenate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RefineConfig {
    /// Number of JDA + relabel iterations. Must be at least one.
    pub max_iter: usize,
    pub jda: JdaConfig,
    /// Classifier trained inside each iteration.
    pub classifier: LinearSvmConfig,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_iter: 3,
            jda: JdaConfig::default(),
            classifier: LinearSvmConfig {
                c: 100.0,
                ..LinearSvmConfig::default()
            },
        }
    }
}

/// The final iteration's output for the test fold, in `test` index order.
#[derive(Debug, Clone)]
pub struct FoldOutcome {
    pub predictions: Array1<i64>,
    pub decision: Array1<f64>,
}

/// Initial target pseudo-labels: known labels on `train`, and on `test` the
/// predictions of a linear SVM trained on `[Xs; Xt[train]]` in the raw
/// feature space. Samples in neither fold are labelled `0`.
pub fn seed_pseudo_labels(
    xs: ArrayView2<f64>,
    ys: ArrayView1<i64>,
    xt: ArrayView2<f64>,
    yt: ArrayView1<i64>,
    train: &[usize],
    test: &[usize],
    baseline: &LinearSvmConfig,
) -> Result<Array1<i64>, AdaptError> {
    ensure_dim("source labels", xs.nrows(), ys.len())?;
    ensure_dim("target labels", xt.nrows(), yt.len())?;
    check_fold_indices(xt.nrows(), train, test)?;

    let mut pseudo = Array1::<i64>::zeros(xt.nrows());
    for &i in train {
        pseudo[i] = yt[i];
    }
    let (x_train, y_train) = training_set(xs, ys, xt, pseudo.view(), train)?;
    let mut svm = LinearSvm::new(*baseline);
    svm.fit(x_train.view(), y_train.view())?;
    let predicted = svm.predict(xt.select(Axis(0), test).view())?;
    for (&i, &label) in test.iter().zip(predicted.iter()) {
        pseudo[i] = label;
    }
    log::debug!(
        "Baseline accuracy on the test fold: {:.4}",
        agreement(yt, pseudo.view(), test)
    );
    Ok(pseudo)
}

/// Runs the refinement loop for one fold, overwriting `pseudo[test]` in place.
///
/// `xs` and `xt` hold samples as rows; `pseudo` must already carry the known
/// labels on `train` and initial guesses on `test`.
pub fn refine_fold(
    xs: ArrayView2<f64>,
    ys: ArrayView1<i64>,
    xt: ArrayView2<f64>,
    pseudo: &mut Array1<i64>,
    train: &[usize],
    test: &[usize],
    config: &RefineConfig,
) -> Result<FoldOutcome, AdaptError> {
    if config.max_iter == 0 {
        return Err(AdaptError::InvalidConfig(
            "max_iter must be at least 1".to_string(),
        ));
    }
    ensure_dim("source labels", xs.nrows(), ys.len())?;
    ensure_dim("target pseudo-labels", xt.nrows(), pseudo.len())?;
    check_fold_indices(xt.nrows(), train, test)?;
    let ns = xs.nrows();

    let mut decision = Array1::<f64>::zeros(test.len());
    for iteration in 0..config.max_iter {
        let output = jda::jda(xs.t(), xt.t(), ys, pseudo.view(), &config.jda)?;
        let zs = output.source_embedding(ns);
        let zt = output.target_embedding(ns);

        let (z_train, y_train) = training_set(zs.view(), ys, zt.view(), pseudo.view(), train)?;
        let mut svm = LinearSvm::new(config.classifier);
        svm.fit(z_train.view(), y_train.view())?;

        let zt_test = zt.select(Axis(0), test);
        let predicted = svm.predict(zt_test.view())?;
        let changed = test
            .iter()
            .zip(predicted.iter())
            .filter(|(i, label)| pseudo[**i] != **label)
            .count();
        for (&i, &label) in test.iter().zip(predicted.iter()) {
            pseudo[i] = label;
        }
        log::debug!(
            "Refinement iteration {}/{}: {} of {} test pseudo-labels changed.",
            iteration + 1,
            config.max_iter,
            changed,
            test.len()
        );

        if iteration + 1 == config.max_iter {
            decision = svm.decision_function(zt_test.view())?;
        }
    }

    let predictions = Array1::from_iter(test.iter().map(|&i| pseudo[i]));
    Ok(FoldOutcome {
        predictions,
        decision,
    })
}

/// `[xs; xt[train]]` with labels `[ys; yt[train]]`.
fn training_set(
    xs: ArrayView2<f64>,
    ys: ArrayView1<i64>,
    xt: ArrayView2<f64>,
    yt: ArrayView1<i64>,
    train: &[usize],
) -> Result<(Array2<f64>, Array1<i64>), AdaptError> {
    let xt_train = xt.select(Axis(0), train);
    let x = concatenate(Axis(0), &[xs.view(), xt_train.view()]).map_err(|_| {
        AdaptError::DimensionMismatch {
            context: "stacking source and training-fold target",
            expected: xs.ncols(),
            found: xt.ncols(),
        }
    })?;
    let y = ys
        .iter()
        .copied()
        .chain(train.iter().map(|&i| yt[i]))
        .collect::<Array1<i64>>();
    Ok((x, y))
}

fn check_fold_indices(nt: usize, train: &[usize], test: &[usize]) -> Result<(), AdaptError> {
    if test.is_empty() {
        return Err(AdaptError::InvalidConfig("the test fold is empty".to_string()));
    }
    match train.iter().chain(test.iter()).find(|&&i| i >= nt) {
        Some(i) => Err(AdaptError::InvalidConfig(format!(
            "fold index {i} is out of range for {nt} target samples"
        ))),
        None => Ok(()),
    }
}

fn agreement(truth: ArrayView1<i64>, guess: ArrayView1<i64>, idx: &[usize]) -> f64 {
    if idx.is_empty() {
        return 0.0;
    }
    let hits = idx.iter().filter(|&&i| truth[i] == guess[i]).count();
    hits as f64 / idx.len() as f64
}
