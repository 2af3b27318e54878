// experiment/metrics.rs

use ndarray::ArrayView1;
use std::cmp::Ordering;

/// Fraction of positions where `truth` and `predicted` agree. Empty inputs score `0.0`.
pub fn accuracy(truth: ArrayView1<i64>, predicted: ArrayView1<i64>) -> f64 {
    let n = truth.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let hits = truth
        .iter()
        .zip(predicted.iter())
        .filter(|(a, b)| a == b)
        .count();
    hits as f64 / n as f64
}

/// Area under the ROC curve for `{-1, +1}` (or any sign-coded) labels, computed
/// as the Mann-Whitney U statistic with tied scores given their average rank.
/// Returns `0.5` when only one class is present.
pub fn roc_auc(truth: ArrayView1<i64>, scores: ArrayView1<f64>) -> f64 {
    let n = truth.len().min(scores.len());
    let n_pos = truth.iter().take(n).filter(|&&t| t > 0).count() as f64;
    let n_neg = n as f64 - n_pos;
    if n_pos == 0.0 || n_neg == 0.0 {
        return 0.5;
    }

    let mut idx: Vec<usize> = (0..n).collect();
    idx.sort_by(|&i, &j| scores[i].partial_cmp(&scores[j]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && scores[idx[j]] == scores[idx[i]] {
            j += 1;
        }
        let avg_rank = (i + j - 1) as f64 / 2.0 + 1.0;
        for &k in &idx[i..j] {
            ranks[k] = avg_rank;
        }
        i = j;
    }

    let sum_ranks_pos: f64 = (0..n).filter(|&k| truth[k] > 0).map(|k| ranks[k]).sum();
    (sum_ranks_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg)
}

/// Mean and population standard deviation. Empty input gives `(NaN, NaN)`.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let view = ArrayView1::from(values);
    match view.mean() {
        Some(mean) => (mean, view.std(0.0)),
        None => (f64::NAN, f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        let truth = array![1, -1, 1, -1];
        let pred = array![1, 1, 1, -1];
        assert_abs_diff_eq!(accuracy(truth.view(), pred.view()), 0.75);
    }

    #[test]
    fn test_auc_perfect_and_reversed() {
        let truth = array![-1, -1, 1, 1];
        let scores = array![-2.0, -1.0, 0.5, 3.0];
        assert_abs_diff_eq!(roc_auc(truth.view(), scores.view()), 1.0);
        let reversed = scores.mapv(|s| -s);
        assert_abs_diff_eq!(roc_auc(truth.view(), reversed.view()), 0.0);
    }

    #[test]
    fn test_auc_ties_count_half() {
        // One positive tied with one negative, the other pair ordered correctly.
        let truth = array![-1, 1, -1, 1];
        let scores = array![0.0, 0.0, -1.0, 1.0];
        // Pairs (pos, neg): (1,0) tie, (1,2) win, (3,0) win, (3,2) win.
        assert_abs_diff_eq!(roc_auc(truth.view(), scores.view()), 3.5 / 4.0);
    }

    #[test]
    fn test_auc_single_class() {
        let truth = array![1, 1];
        let scores = array![0.1, 0.2];
        assert_abs_diff_eq!(roc_auc(truth.view(), scores.view()), 0.5);
    }

    #[test]
    fn test_mean_std_is_population() {
        let (mean, std) = mean_std(&[1.0, 2.0, 3.0, 4.0]);
        assert_abs_diff_eq!(mean, 2.5);
        assert_abs_diff_eq!(std, 1.25_f64.sqrt(), epsilon = 1e-15);
        let (m, s) = mean_std(&[]);
        assert!(m.is_nan() && s.is_nan());
        let (m, s) = mean_std(&[0.8]);
        assert_abs_diff_eq!(m, 0.8);
        assert_abs_diff_eq!(s, 0.0);
    }
}
