//! Logistic regression wrapped in inner-fold sigmoid calibration.
//!
//! The training partition is split into stratified inner folds. For each
//! inner fold a logistic model is trained on the rest and a Platt calibrator
//! is fitted on that model's scores for the inner fold. Predictions average
//! the calibrated probabilities of all (model, calibrator) pairs.

use super::logistic::LogisticRegression;
use super::platt::PlattCalibrator;
use super::{FitReport, ModelFactory, ProbabilisticClassifier};
use crate::dataset::take_rows;
use crate::folds::FoldAssigner;
use rc_common::labels::Label;
use rc_common::{Error, Result};
use rc_config::ModelConfig;
use rc_math::clamp_probability;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct CalibratedClassifier {
    config: ModelConfig,
    seed: u64,
    members: Vec<(LogisticRegression, PlattCalibrator)>,
}

impl CalibratedClassifier {
    pub fn new(config: ModelConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            members: Vec::new(),
        }
    }

    /// Number of fitted (model, calibrator) pairs.
    pub fn members(&self) -> usize {
        self.members.len()
    }

    fn fit_member(
        &self,
        train_x: &[Vec<f64>],
        train_y: &[Label],
        calib_x: &[Vec<f64>],
        calib_y: &[Label],
    ) -> Result<((LogisticRegression, PlattCalibrator), [FitReport; 2])> {
        let mut base = LogisticRegression::from_config(&self.config);
        let base_report = base.fit(train_x, train_y)?;
        let scores = base.decision_function(calib_x);
        let (calibrator, calib_report) = PlattCalibrator::fit(&scores, calib_y)?;
        Ok(((base, calibrator), [base_report, calib_report]))
    }
}

impl ProbabilisticClassifier for CalibratedClassifier {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[Label]) -> Result<FitReport> {
        if features.len() != labels.len() {
            return Err(Error::LengthMismatch {
                context: "calibrated classifier features vs labels",
                left: features.len(),
                right: labels.len(),
            });
        }

        let assigner = FoldAssigner::new(self.config.calibration_folds, self.seed);
        let mut members = Vec::new();
        let mut reports = Vec::new();

        match assigner.assign(labels) {
            Ok(inner) => {
                for fold in 1..=inner.folds() {
                    let train = inner.training(fold);
                    let calib = inner.held_out(fold);
                    let (member, fit) = self.fit_member(
                        &take_rows(features, &train),
                        &take_rows(labels, &train),
                        &take_rows(features, &calib),
                        &take_rows(labels, &calib),
                    )?;
                    members.push(member);
                    reports.extend(fit);
                }
            }
            Err(Error::InsufficientSamples { class, count, .. }) => {
                warn!(
                    class,
                    count,
                    calibration_folds = self.config.calibration_folds,
                    "inner stratification infeasible, calibrating on the training partition"
                );
                let (member, fit) = self.fit_member(features, labels, features, labels)?;
                members.push(member);
                reports.extend(fit);
            }
            Err(e) => return Err(e),
        }

        debug!(members = members.len(), "calibrated classifier fitted");
        self.members = members;
        Ok(FitReport::merge(&reports))
    }

    fn predict_proba(&self, features: &[Vec<f64>]) -> Vec<f64> {
        if self.members.is_empty() {
            return vec![f64::NAN; features.len()];
        }
        let mut sums = vec![0.0; features.len()];
        for (base, calibrator) in &self.members {
            for (sum, score) in sums.iter_mut().zip(base.decision_function(features)) {
                *sum += calibrator.transform(score);
            }
        }
        let k = self.members.len() as f64;
        sums.into_iter().map(|s| clamp_probability(s / k)).collect()
    }
}

/// Default factory: a fresh calibrated logistic model per outer fold.
#[derive(Debug, Clone)]
pub struct CalibratedLogisticFactory {
    config: ModelConfig,
    seed: u64,
}

impl CalibratedLogisticFactory {
    pub fn new(config: ModelConfig, seed: u64) -> Self {
        Self { config, seed }
    }
}

impl ModelFactory for CalibratedLogisticFactory {
    type Model = CalibratedClassifier;

    fn build(&self, fold: usize) -> CalibratedClassifier {
        CalibratedClassifier::new(self.config.clone(), self.seed.wrapping_add(fold as u64))
    }
}
