// experiment/folds.rs

use super::ExperimentError;
use itertools::Itertools;
use ndarray::ArrayView1;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// One cross-validation split. Both index lists are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffled stratified k-fold split.
///
/// Each class's members are shuffled with a `StdRng` seeded from `seed` and
/// dealt round-robin into the `k` test folds, continuing the deal from one
/// class to the next so fold sizes stay balanced. Every sample lands in
/// exactly one test fold, and within a class the fold counts differ by at
/// most one.
pub fn stratified_k_fold(
    labels: ArrayView1<i64>,
    k: usize,
    seed: u64,
) -> Result<Vec<Fold>, ExperimentError> {
    if k < 2 {
        return Err(ExperimentError::InvalidConfig(format!(
            "k-fold needs at least 2 folds, got {k}"
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let classes: Vec<i64> = labels.iter().copied().sorted().dedup().collect();

    let mut test_sets: Vec<Vec<usize>> = vec![Vec::new(); k];
    let mut next = 0;
    for class in classes {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == class)
            .map(|(i, _)| i)
            .collect();
        if members.len() < k {
            return Err(ExperimentError::InvalidConfig(format!(
                "class {class} has {} samples, fewer than the {k} folds",
                members.len()
            )));
        }
        members.shuffle(&mut rng);
        for i in members {
            test_sets[next].push(i);
            next = (next + 1) % k;
        }
    }

    let n = labels.len();
    Ok(test_sets
        .into_iter()
        .map(|mut test| {
            test.sort_unstable();
            let train = (0..n).filter(|i| test.binary_search(i).is_err()).collect();
            Fold { train, test }
        })
        .collect())
}
