// experiment/config.rs

use super::ExperimentError;
use crate::jda::JdaConfig;
use crate::refine::RefineConfig;
use crate::svm::LinearSvmConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Cross-validated JDA experiment settings, read from TOML.
///
/// ```toml
/// source_positive = 2
/// source_negative = 9
/// target_positive = 3
/// target_negative = 6
///
/// [jda]
/// k = 100
/// lmbda = 1000.0
/// ker = "linear"
/// gamma = 1.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    pub source_positive: i64,
    pub source_negative: i64,
    pub target_positive: i64,
    pub target_negative: i64,
    #[serde(default = "default_kfold")]
    pub kfold: usize,
    #[serde(default = "default_repeats")]
    pub repeats: usize,
    /// Repeat `r` shuffles its folds with seed `(r + seed_offset) * 10`.
    #[serde(default = "default_seed_offset")]
    pub seed_offset: u64,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// `C` of the raw-feature classifier that seeds the pseudo-labels.
    #[serde(default = "default_baseline_c")]
    pub baseline_c: f64,
    /// `C` of the classifier trained inside each refinement iteration.
    #[serde(default = "default_refine_c")]
    pub refine_c: f64,
    #[serde(default)]
    pub jda: JdaConfig,
    /// File name prefix for the result tables.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_kfold() -> usize {
    5
}

fn default_repeats() -> usize {
    1
}

fn default_seed_offset() -> u64 {
    5
}

fn default_max_iter() -> usize {
    3
}

fn default_baseline_c() -> f64 {
    1.0
}

fn default_refine_c() -> f64 {
    100.0
}

fn default_prefix() -> String {
    "jda".to_string()
}

impl ExperimentConfig {
    /// A configuration for the given class pairs with every other field at its default.
    pub fn for_classes(
        source_positive: i64,
        source_negative: i64,
        target_positive: i64,
        target_negative: i64,
    ) -> Self {
        Self {
            source_positive,
            source_negative,
            target_positive,
            target_negative,
            kfold: default_kfold(),
            repeats: default_repeats(),
            seed_offset: default_seed_offset(),
            max_iter: default_max_iter(),
            baseline_c: default_baseline_c(),
            refine_c: default_refine_c(),
            jda: JdaConfig::default(),
            prefix: default_prefix(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ExperimentError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ExperimentError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ExperimentError> {
        if self.kfold < 2 {
            return Err(ExperimentError::InvalidConfig(format!(
                "kfold must be at least 2, got {}",
                self.kfold
            )));
        }
        if self.repeats == 0 {
            return Err(ExperimentError::InvalidConfig(
                "repeats must be at least 1".to_string(),
            ));
        }
        if self.max_iter == 0 {
            return Err(ExperimentError::InvalidConfig(
                "max_iter must be at least 1".to_string(),
            ));
        }
        if self.source_positive == self.source_negative
            || self.target_positive == self.target_negative
        {
            return Err(ExperimentError::InvalidConfig(
                "positive and negative classes of a domain must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Fold shuffling seed for repeat `r`.
    pub fn seed_for_repeat(&self, repeat: usize) -> u64 {
        (repeat as u64 + self.seed_offset) * 10
    }

    pub fn baseline_classifier(&self) -> LinearSvmConfig {
        LinearSvmConfig {
            c: self.baseline_c,
            ..LinearSvmConfig::default()
        }
    }

    pub fn refine_config(&self) -> RefineConfig {
        RefineConfig {
            max_iter: self.max_iter,
            jda: self.jda,
            classifier: LinearSvmConfig {
                c: self.refine_c,
                ..LinearSvmConfig::default()
            },
        }
    }
}
