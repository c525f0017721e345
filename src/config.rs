use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Hyperparameters for one gradient-boosted tree fit.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BoostParams {
    /// Maximum number of boosting iterations (trees).
    pub trees: usize,
    /// Shrinkage applied to every tree's contribution.
    pub learning_rate: f32,
    /// Depth limit for each tree.
    pub max_depth: usize,
    /// Fraction of feature columns sampled per tree, in (0, 1].
    pub colsample: f32,
    /// Minimum number of rows on each side of a split.
    pub min_samples_leaf: usize,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            trees: 100,
            learning_rate: 0.1,
            max_depth: 6,
            colsample: 1.0,
            min_samples_leaf: 5,
        }
    }
}

/// Which hyperparameter a search stage varies.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TunedParam {
    Trees,
    LearningRate,
    MaxDepth,
    Colsample,
}

impl BoostParams {
    /// Return a copy with `value` substituted for the tuned hyperparameter.
    pub fn with_value(&self, param: TunedParam, value: f64) -> BoostParams {
        let mut out = self.clone();
        match param {
            TunedParam::Trees => out.trees = value.round() as usize,
            TunedParam::LearningRate => out.learning_rate = value as f32,
            TunedParam::MaxDepth => out.max_depth = value.round() as usize,
            TunedParam::Colsample => out.colsample = value as f32,
        }
        out
    }
}

/// Cross-validation settings shared by every tuning stage.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SearchSettings {
    /// Number of cross-validation folds.
    pub folds: usize,
    /// Early-stopping patience: non-improving iterations before a fold stops.
    pub patience: usize,
    /// Seed for fold assignment and per-tree column sampling.
    pub seed: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            folds: 10,
            patience: 20,
            seed: 42,
        }
    }
}

/// Column roles in the input table. Identifier columns and the outcome are
/// never used as predictors.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ColumnRoles {
    /// Name of the outcome column.
    pub outcome: String,
    /// Identifier columns to exclude from the feature matrix.
    #[serde(default)]
    pub id_columns: Vec<String>,
    /// Optional date column, decomposed into year/month predictors.
    #[serde(default)]
    pub date_column: Option<String>,
}

/// Full configuration for the five-stage tuning pipeline.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PipelineConfig {
    pub roles: ColumnRoles,
    /// Fraction of rows held out for the final evaluation.
    pub test_fraction: f32,
    pub settings: SearchSettings,
    /// Fixed values for hyperparameters while they are not under test.
    pub base_params: BoostParams,
    /// Stage 1: tree-count candidates.
    pub trees_grid: Vec<usize>,
    /// Stage 2: learning-rate candidates (first pass).
    pub learning_rate_grid: Vec<f32>,
    /// Stage 3: max-depth candidates.
    pub depth_grid: Vec<usize>,
    /// Stage 4: column-subsample candidates.
    pub colsample_grid: Vec<f32>,
    /// Stage 5: learning-rate candidates (second pass).
    pub learning_rate_grid_2: Vec<f32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            roles: ColumnRoles {
                outcome: "price".to_string(),
                id_columns: vec!["id".to_string()],
                date_column: Some("date".to_string()),
            },
            test_fraction: 0.25,
            settings: SearchSettings::default(),
            base_params: BoostParams::default(),
            trees_grid: vec![100, 325, 550, 775, 1000],
            learning_rate_grid: vec![0.025, 0.05, 0.1, 0.2, 0.3],
            depth_grid: vec![2, 4, 6, 8, 10],
            colsample_grid: vec![0.4, 0.6, 0.8, 1.0],
            learning_rate_grid_2: vec![0.05, 0.075, 0.1, 0.125, 0.15],
        }
    }
}

impl PipelineConfig {
    /// Load a pipeline configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        serde_json::from_str(&text).with_context(|| {
            format!("Failed to parse config file: {}", path.as_ref().display())
        })
    }
}
