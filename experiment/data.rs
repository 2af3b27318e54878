// experiment/data.rs

//! Loading labelled sample tables and carving binary domains out of them.

use super::ExperimentError;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use std::path::Path;

/// Name of the integer class column in a sample table.
pub const LABEL_COLUMN: &str = "label";

/// Reads a CSV file with a header row, one integer `label` column and any
/// number of numeric feature columns. Returns samples as rows.
pub fn load_labeled_csv(path: &Path) -> Result<(Array2<f64>, Array1<i64>), ExperimentError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let headers = reader.headers()?.clone();
    let label_idx = headers
        .iter()
        .position(|h| h == LABEL_COLUMN)
        .ok_or_else(|| ExperimentError::ColumnNotFound(LABEL_COLUMN.to_string()))?;
    let feature_names: Vec<&str> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != label_idx)
        .map(|(_, h)| h)
        .collect();
    if feature_names.is_empty() {
        return Err(ExperimentError::EmptyData(format!(
            "{} has no feature columns",
            path.display()
        )));
    }

    let mut values = Vec::new();
    let mut labels = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let line = row + 2;
        let label_cell = record.get(label_idx).unwrap_or("");
        let label = label_cell
            .parse::<i64>()
            .map_err(|_| ExperimentError::BadCell {
                line,
                column: LABEL_COLUMN.to_string(),
                value: label_cell.to_string(),
            })?;
        labels.push(label);
        for (col, cell) in record.iter().enumerate().filter(|(i, _)| *i != label_idx) {
            let value = cell.parse::<f64>().map_err(|_| ExperimentError::BadCell {
                line,
                column: headers.get(col).unwrap_or("").to_string(),
                value: cell.to_string(),
            })?;
            if !value.is_finite() {
                return Err(ExperimentError::NonFiniteValue {
                    line,
                    column: headers.get(col).unwrap_or("").to_string(),
                });
            }
            values.push(value);
        }
    }
    if labels.is_empty() {
        return Err(ExperimentError::EmptyData(format!(
            "{} has no data rows",
            path.display()
        )));
    }

    let data = Array2::from_shape_vec((labels.len(), feature_names.len()), values)
        .map_err(|e| ExperimentError::EmptyData(format!("{}: {e}", path.display())))?;
    log::info!(
        "Loaded {} samples with {} features from {}.",
        data.nrows(),
        data.ncols(),
        path.display()
    );
    Ok((data, Array1::from(labels)))
}

/// Selects the rows labelled `positive` or `negative`, in their original order,
/// and relabels them `+1` and `-1`.
pub fn create_domain(
    data: ArrayView2<f64>,
    labels: ArrayView1<i64>,
    positive: i64,
    negative: i64,
) -> Result<(Array2<f64>, Array1<i64>), ExperimentError> {
    if data.nrows() != labels.len() {
        return Err(ExperimentError::InvalidConfig(format!(
            "{} samples but {} labels",
            data.nrows(),
            labels.len()
        )));
    }
    let (rows, signs): (Vec<usize>, Vec<i64>) = labels
        .iter()
        .enumerate()
        .filter_map(|(i, &label)| match label {
            l if l == positive => Some((i, 1)),
            l if l == negative => Some((i, -1)),
            _ => None,
        })
        .unzip();
    let n_pos = signs.iter().filter(|&&s| s == 1).count();
    if n_pos == 0 || n_pos == signs.len() {
        return Err(ExperimentError::EmptyData(format!(
            "domain {positive} vs {negative} needs samples of both classes, found {} and {}",
            n_pos,
            signs.len() - n_pos
        )));
    }
    log::debug!(
        "Domain {} vs {}: {} positive, {} negative.",
        positive,
        negative,
        n_pos,
        signs.len() - n_pos
    );
    Ok((data.select(Axis(0), &rows), Array1::from(signs)))
}
