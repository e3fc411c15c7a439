//! Asymmetric misclassification cost.
//!
//! # Formula
//!
//! ```text
//! cost = w_fp × #(predicted = 1 ∧ actual = 0) + w_fn × #(predicted = 0 ∧ actual = 1)
//! ```
//!
//! # Usage
//!
//! ```
//! use rc_core::cost::{CostEvaluator, CostWeights};
//!
//! let evaluator = CostEvaluator::new(CostWeights::default());
//! let cost = evaluator.cost(&[0, 1, 1, 0], &[1, 1, 0, 0]).unwrap();
//! assert_eq!(cost, 1.0 + 10.0);
//! ```

use rc_common::labels::{Label, POSITIVE};
use rc_common::{Error, Result};
use rc_config::CostConfig;
use serde::{Deserialize, Serialize};

/// Per-error weights. A missed positive costs ten false alarms by default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostWeights {
    /// Weight of a false positive (default: 1.0).
    pub false_positive: f64,
    /// Weight of a false negative (default: 10.0).
    pub false_negative: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            false_positive: 1.0,
            false_negative: 10.0,
        }
    }
}

impl From<&CostConfig> for CostWeights {
    fn from(cfg: &CostConfig) -> Self {
        Self {
            false_positive: cfg.false_positive,
            false_negative: cfg.false_negative,
        }
    }
}

/// Confusion counts for one (actual, predicted) pair of vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
}

impl ConfusionCounts {
    pub fn from_predictions(actual: &[Label], predicted: &[Label]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(Error::LengthMismatch {
                context: "actual vs predicted labels",
                left: actual.len(),
                right: predicted.len(),
            });
        }
        let mut counts = Self::default();
        for (&a, &p) in actual.iter().zip(predicted.iter()) {
            match (a == POSITIVE, p == POSITIVE) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (false, false) => counts.tn += 1,
                (true, false) => counts.fn_ += 1,
            }
        }
        Ok(counts)
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    /// Weighted cost of these counts.
    pub fn cost(&self, weights: &CostWeights) -> f64 {
        weights.false_positive * self.fp as f64 + weights.false_negative * self.fn_ as f64
    }
}

/// Pure cost function over label vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostEvaluator {
    weights: CostWeights,
}

impl CostEvaluator {
    pub fn new(weights: CostWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> CostWeights {
        self.weights
    }

    /// Weighted error cost; the vectors must have equal length.
    pub fn cost(&self, actual: &[Label], predicted: &[Label]) -> Result<f64> {
        Ok(ConfusionCounts::from_predictions(actual, predicted)?.cost(&self.weights))
    }
}
