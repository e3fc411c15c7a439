//! Pipeline configuration types.
//!
//! Every section falls back to its defaults when omitted, so a config file
//! only needs to name the values it overrides.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineConfig {
    pub schema_version: String,
    pub data: DataConfig,
    pub resampling: ResamplingConfig,
    pub folds: FoldConfig,
    pub costs: CostConfig,
    pub grid: GridConfig,
    pub model: ModelConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            data: DataConfig::default(),
            resampling: ResamplingConfig::default(),
            folds: FoldConfig::default(),
            costs: CostConfig::default(),
            grid: GridConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

/// How the tabular input is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DataConfig {
    /// Column holding the class label.
    pub label_column: String,
    /// Label value mapped to the negative (benign) class; all others are positive.
    pub negative_label: String,
    /// Identifier column excluded from the features.
    pub id_column: Option<String>,
    /// Cell contents treated as missing values.
    pub missing_tokens: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            label_column: "Benign".to_string(),
            negative_label: "1".to_string(),
            id_column: Some("FileName".to_string()),
            missing_tokens: ["", "NA", "NaN", "nan", "?"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Minority oversampling, applied only below the prevalence trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ResamplingConfig {
    pub enabled: bool,
    /// Resample when positive prevalence is strictly below this value.
    pub minority_trigger: f64,
    /// Target minority:majority ratio after resampling.
    pub target_ratio: f64,
    /// Nearest minority neighbours considered for interpolation.
    pub k_neighbors: usize,
    pub seed: u64,
}

impl Default for ResamplingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            minority_trigger: 0.05,
            target_ratio: 0.5,
            k_neighbors: 5,
            seed: 42,
        }
    }
}

/// Stratified k-fold settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FoldConfig {
    pub count: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self {
            count: 10,
            shuffle: true,
            seed: 42,
        }
    }
}

/// Misclassification weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CostConfig {
    /// Cost of flagging a benign sample.
    pub false_positive: f64,
    /// Cost of missing a positive sample.
    pub false_negative: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            false_positive: 1.0,
            false_negative: 10.0,
        }
    }
}

impl CostConfig {
    /// FN weight divided by FP weight (infinite when FP weight is zero).
    pub fn ratio(&self) -> f64 {
        self.false_negative / self.false_positive
    }
}

/// Candidate threshold grid, inclusive of both endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GridConfig {
    pub points: usize,
    pub low: f64,
    pub high: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            points: 100,
            low: 0.01,
            high: 0.99,
        }
    }
}

/// Base classifier and calibration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ModelConfig {
    /// Newton iteration budget for the logistic-regression solver.
    pub max_iter: usize,
    /// Gradient-norm tolerance for declaring convergence.
    pub tolerance: f64,
    /// Inverse L2 regularisation strength (larger = weaker penalty).
    pub inverse_regularization: f64,
    /// Inner stratified folds used to fit the sigmoid calibrator.
    pub calibration_folds: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tolerance: 1e-6,
            inverse_regularization: 1.0,
            calibration_folds: 3,
        }
    }
}
