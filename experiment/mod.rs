// experiment/mod.rs

//! # Cross-Validated JDA Experiment
//!
//! Builds a source and a target domain from one labelled table, then for each
//! repeat shuffles a stratified k-fold split of the target. Per fold the target
//! training labels are known and the test labels are predicted by a raw-feature
//! baseline, then refined by the JDA loop. Accuracy and AUC are scored over the
//! whole target once every fold has filled in its predictions.

pub mod config;
pub mod data;
pub mod folds;
pub mod metrics;
pub mod report;

use crate::estimator::AdaptError;
use crate::refine::{RefineConfig, refine_fold, seed_pseudo_labels};
use crate::svm::LinearSvmConfig;
use config::ExperimentConfig;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error(transparent)]
    Adapt(#[from] AdaptError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(
        "The required column '{0}' was not found in the input file. Please check spelling and case."
    )]
    ColumnNotFound(String),
    #[error("Line {line}, column '{column}': could not parse '{value}' as a number.")]
    BadCell {
        line: usize,
        column: String,
        value: String,
    },
    #[error("Line {line}, column '{column}': non-finite value (NaN or Infinity).")]
    NonFiniteValue { line: usize, column: String },
    #[error("Not enough data: {0}")]
    EmptyData(String),
    #[error("Invalid experiment configuration: {0}")]
    InvalidConfig(String),
}

/// A binary-labelled domain, samples as rows, labels in `{-1, +1}`.
#[derive(Debug, Clone)]
pub struct Domain {
    pub x: Array2<f64>,
    pub y: Array1<i64>,
}

impl Domain {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// Per-repeat results. `predictions[r]` and `decisions[r]` cover every target sample.
#[derive(Debug, Clone, Default)]
pub struct ExperimentReport {
    pub accuracy: Vec<f64>,
    pub auc: Vec<f64>,
    pub predictions: Vec<Array1<i64>>,
    pub decisions: Vec<Array1<f64>>,
}

impl ExperimentReport {
    pub fn accuracy_summary(&self) -> (f64, f64) {
        metrics::mean_std(&self.accuracy)
    }

    pub fn auc_summary(&self) -> (f64, f64) {
        metrics::mean_std(&self.auc)
    }
}

/// Loads a labelled CSV table and splits out the configured source and target domains.
pub fn load_domains(
    path: &Path,
    config: &ExperimentConfig,
) -> Result<(Domain, Domain), ExperimentError> {
    let (data, labels) = data::load_labeled_csv(path)?;
    let (xs, ys) = data::create_domain(
        data.view(),
        labels.view(),
        config.source_positive,
        config.source_negative,
    )?;
    let (xt, yt) = data::create_domain(
        data.view(),
        labels.view(),
        config.target_positive,
        config.target_negative,
    )?;
    Ok((Domain { x: xs, y: ys }, Domain { x: xt, y: yt }))
}

/// Runs every repeat and fold. `on_fold(repeat, fold)` is called after each
/// fold completes.
pub fn run_experiment<F>(
    source: &Domain,
    target: &Domain,
    config: &ExperimentConfig,
    mut on_fold: F,
) -> Result<ExperimentReport, ExperimentError>
where
    F: FnMut(usize, usize),
{
    config.validate()?;
    let refine = config.refine_config();
    let baseline = config.baseline_classifier();
    let nt = target.len();
    log::info!(
        "Running {} repeat(s) of {}-fold JDA: {} source and {} target samples, {} features.",
        config.repeats,
        config.kfold,
        source.len(),
        nt,
        source.x.ncols()
    );

    let mut report = ExperimentReport::default();
    for repeat in 0..config.repeats {
        let seed = config.seed_for_repeat(repeat);
        let folds = folds::stratified_k_fold(target.y.view(), config.kfold, seed)?;
        let mut pred = Array1::<i64>::zeros(nt);
        let mut dec = Array1::<f64>::zeros(nt);

        for (fold_idx, fold) in folds.iter().enumerate() {
            let (p, d) = run_fold(
                source.x.view(),
                source.y.view(),
                target.x.view(),
                target.y.view(),
                fold,
                &baseline,
                &refine,
            )?;
            for (k, &i) in fold.test.iter().enumerate() {
                pred[i] = p[k];
                dec[i] = d[k];
            }
            on_fold(repeat, fold_idx);
        }

        let acc = metrics::accuracy(target.y.view(), pred.view());
        let auc = metrics::roc_auc(target.y.view(), dec.view());
        log::info!(
            "Repeat {} (seed {}): accuracy {:.4}, AUC {:.4}.",
            repeat,
            seed,
            acc,
            auc
        );
        report.accuracy.push(acc);
        report.auc.push(auc);
        report.predictions.push(pred);
        report.decisions.push(dec);
    }

    let (acc_mean, _) = report.accuracy_summary();
    let (auc_mean, _) = report.auc_summary();
    log::info!("Mean accuracy: {acc_mean:.4}");
    log::info!("Mean AUC: {auc_mean:.4}");
    Ok(report)
}

fn run_fold(
    xs: ArrayView2<f64>,
    ys: ArrayView1<i64>,
    xt: ArrayView2<f64>,
    yt: ArrayView1<i64>,
    fold: &folds::Fold,
    baseline: &LinearSvmConfig,
    refine: &RefineConfig,
) -> Result<(Array1<i64>, Array1<f64>), ExperimentError> {
    let mut pseudo = seed_pseudo_labels(xs, ys, xt, yt, &fold.train, &fold.test, baseline)?;
    let outcome = refine_fold(xs, ys, xt, &mut pseudo, &fold.train, &fold.test, refine)?;
    log::debug!(
        "Fold accuracy after refinement: {:.4}",
        metrics::accuracy(
            yt.select(Axis(0), &fold.test).view(),
            outcome.predictions.view()
        )
    );
    Ok((outcome.predictions, outcome.decision))
}
