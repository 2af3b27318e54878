// experiment/report.rs

//! CSV export of experiment results and embeddings.

use super::{ExperimentError, ExperimentReport};
use super::config::ExperimentConfig;
use super::metrics::mean_std;
use ndarray::ArrayView2;
use std::path::{Path, PathBuf};

/// Paths of the decision-score table and the metric table for `config`:
/// `{prefix}_{k}fold_dec_{tp}vs{tn}with{sp}vs{sn}.csv` and the matching `_acc_` file.
pub fn result_paths(dir: &Path, config: &ExperimentConfig) -> (PathBuf, PathBuf) {
    let stem = |kind: &str| {
        format!(
            "{}_{}fold_{}_{}vs{}with{}vs{}.csv",
            config.prefix,
            config.kfold,
            kind,
            config.target_positive,
            config.target_negative,
            config.source_positive,
            config.source_negative
        )
    };
    (dir.join(stem("dec")), dir.join(stem("acc")))
}

/// Writes both result tables into `dir`, returning their paths.
pub fn write_report(
    dir: &Path,
    config: &ExperimentConfig,
    report: &ExperimentReport,
) -> Result<(PathBuf, PathBuf), ExperimentError> {
    let (dec_path, acc_path) = result_paths(dir, config);
    write_decisions(&dec_path, report)?;
    write_metrics(&acc_path, report)?;
    log::info!(
        "Wrote {} and {}.",
        dec_path.display(),
        acc_path.display()
    );
    Ok((dec_path, acc_path))
}

/// One row per repeat: the repeat index followed by the decision score of every
/// target sample.
pub fn write_decisions(path: &Path, report: &ExperimentReport) -> Result<(), ExperimentError> {
    let mut writer = csv::Writer::from_path(path)?;
    let nt = report.decisions.first().map_or(0, |d| d.len());
    let mut header = vec!["repeat".to_string()];
    header.extend((0..nt).map(|i| i.to_string()));
    writer.write_record(&header)?;
    for (repeat, dec) in report.decisions.iter().enumerate() {
        let mut row = vec![repeat.to_string()];
        row.extend(dec.iter().map(|v| v.to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// `metric,entry,value` rows: per-repeat accuracy values, their mean and std,
/// then the same for AUC.
pub fn write_metrics(path: &Path, report: &ExperimentReport) -> Result<(), ExperimentError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["metric", "entry", "value"])?;
    for (name, values) in [("accuracy", &report.accuracy), ("auc", &report.auc)] {
        for (repeat, v) in values.iter().enumerate() {
            writer.write_record([name, repeat.to_string().as_str(), v.to_string().as_str()])?;
        }
        let (mean, std) = mean_std(values);
        writer.write_record([name, "mean", mean.to_string().as_str()])?;
        writer.write_record([name, "std", std.to_string().as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes an embedding with a `c0,c1,...` header, one row per sample.
pub fn write_matrix_csv(path: &Path, matrix: ArrayView2<f64>) -> Result<(), ExperimentError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record((0..matrix.ncols()).map(|j| format!("c{j}")))?;
    for row in matrix.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
