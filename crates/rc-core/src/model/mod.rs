//! Probabilistic classifiers consumed by the scorer.
//!
//! The scorer only needs `fit` and `predict_proba`; the logistic regression
//! and sigmoid calibrator here are the default implementation behind the
//! [`ProbabilisticClassifier`] trait.

pub mod calibrated;
pub mod logistic;
pub mod platt;

pub use calibrated::{CalibratedClassifier, CalibratedLogisticFactory};
pub use logistic::LogisticRegression;
pub use platt::PlattCalibrator;

use rc_common::labels::Label;
use rc_common::Result;
use serde::{Deserialize, Serialize};

/// Solver diagnostics from a fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub converged: bool,
    pub iterations: usize,
    /// Max-norm of the objective gradient at the returned parameters.
    pub gradient_norm: f64,
}

impl FitReport {
    /// Combine reports from several fits: converged only if all converged.
    pub fn merge(reports: &[FitReport]) -> FitReport {
        FitReport {
            converged: reports.iter().all(|r| r.converged),
            iterations: reports.iter().map(|r| r.iterations).max().unwrap_or(0),
            gradient_norm: reports
                .iter()
                .map(|r| r.gradient_norm)
                .fold(0.0, f64::max),
        }
    }
}

/// A binary classifier producing P(label = 1).
///
/// `fit` returns `Ok` with `converged == false` when the iteration budget ran
/// out; callers keep the best-effort parameters.
pub trait ProbabilisticClassifier {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[Label]) -> Result<FitReport>;

    fn predict_proba(&self, features: &[Vec<f64>]) -> Vec<f64>;
}

/// Builds a fresh, untrained classifier for each outer fold.
pub trait ModelFactory: Sync {
    type Model: ProbabilisticClassifier;

    fn build(&self, fold: usize) -> Self::Model;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_requires_all_converged() {
        let a = FitReport {
            converged: true,
            iterations: 5,
            gradient_norm: 1e-9,
        };
        let b = FitReport {
            converged: false,
            iterations: 100,
            gradient_norm: 0.2,
        };
        let merged = FitReport::merge(&[a, b]);
        assert!(!merged.converged);
        assert_eq!(merged.iterations, 100);
        assert_eq!(merged.gradient_norm, 0.2);
        assert!(FitReport::merge(&[a]).converged);
    }
}
