//! Held-out scoring: one fresh calibrated model per fold.
//!
//! For fold k the model is trained on every row whose fold id differs from k
//! and then scores exactly the rows with fold id k, so no row is scored by a
//! model that saw it. Models are built by a factory per fold and never shared.

use crate::dataset::{take_rows, Matrix};
use crate::folds::FoldAssignment;
use crate::model::{ModelFactory, ProbabilisticClassifier};
use rc_common::labels::{class_counts, Label};
use rc_common::{Error, Result};
use serde::Serialize;
use tracing::{debug, info_span, warn};

/// Non-fatal: the fold's solver ran out of iterations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergenceWarning {
    pub fold: usize,
    pub iterations: usize,
    pub gradient_norm: f64,
}

/// Probabilities for one fold's held-out rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldScores {
    pub fold: usize,
    /// Row indices into the scored matrix.
    pub indices: Vec<usize>,
    pub probabilities: Vec<f64>,
    pub labels: Vec<Label>,
    pub warning: Option<ConvergenceWarning>,
}

/// Result of one fold's training and scoring round.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FoldOutcome {
    Scored(FoldScores),
    Failed { fold: usize, reason: String },
}

impl FoldOutcome {
    pub fn fold(&self) -> usize {
        match self {
            FoldOutcome::Scored(s) => s.fold,
            FoldOutcome::Failed { fold, .. } => *fold,
        }
    }

    pub fn scores(&self) -> Option<&FoldScores> {
        match self {
            FoldOutcome::Scored(s) => Some(s),
            FoldOutcome::Failed { .. } => None,
        }
    }
}

/// Trains and scores each fold with models from `factory`.
#[derive(Debug, Clone)]
pub struct CalibratedScorer<F> {
    factory: F,
}

impl<F: ModelFactory> CalibratedScorer<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Train on the complement of `fold` and score its held-out rows.
    ///
    /// Data-shape problems are errors; a model that cannot produce usable
    /// probabilities yields `FoldOutcome::Failed` so the run can continue.
    pub fn score_fold(
        &self,
        features: &Matrix,
        labels: &[Label],
        folds: &FoldAssignment,
        fold: usize,
    ) -> Result<FoldOutcome> {
        if features.len() != labels.len() || folds.len() != labels.len() {
            return Err(Error::LengthMismatch {
                context: "scorer features, labels, and folds",
                left: features.len(),
                right: folds.len(),
            });
        }
        let _span = info_span!("score_fold", fold).entered();

        let train = folds.training(fold);
        let held_out = folds.held_out(fold);
        let train_x = take_rows(features, &train);
        let train_y = take_rows(labels, &train);

        let (neg, pos) = class_counts(&train_y);
        if neg == 0 || pos == 0 {
            let reason = format!("training partition has {neg} negatives and {pos} positives");
            warn!(fold, %reason, "fold excluded");
            return Ok(FoldOutcome::Failed { fold, reason });
        }

        let mut model = self.factory.build(fold);
        let report = match model.fit(&train_x, &train_y) {
            Ok(report) => report,
            Err(e) => {
                warn!(fold, error = %e, "fold training failed, fold excluded");
                return Ok(FoldOutcome::Failed {
                    fold,
                    reason: e.to_string(),
                });
            }
        };

        let warning = if report.converged {
            None
        } else {
            warn!(
                fold,
                iterations = report.iterations,
                gradient_norm = report.gradient_norm,
                "classifier did not converge, using best-effort coefficients"
            );
            Some(ConvergenceWarning {
                fold,
                iterations: report.iterations,
                gradient_norm: report.gradient_norm,
            })
        };

        let probabilities = model.predict_proba(&take_rows(features, &held_out));
        if let Some(bad) = probabilities.iter().position(|p| !p.is_finite()) {
            let reason = format!("non-finite probability for row {}", held_out[bad]);
            warn!(fold, %reason, "fold excluded");
            return Ok(FoldOutcome::Failed { fold, reason });
        }

        debug!(fold, scored = held_out.len(), "fold scored");
        Ok(FoldOutcome::Scored(FoldScores {
            fold,
            labels: take_rows(labels, &held_out),
            indices: held_out,
            probabilities,
            warning,
        }))
    }

    /// Score every fold, in fold order.
    #[cfg(not(feature = "parallel"))]
    pub fn score_all(
        &self,
        features: &Matrix,
        labels: &[Label],
        folds: &FoldAssignment,
    ) -> Result<Vec<FoldOutcome>> {
        (1..=folds.folds())
            .map(|fold| self.score_fold(features, labels, folds, fold))
            .collect()
    }

    /// Score every fold on the rayon pool; output stays in fold order.
    #[cfg(feature = "parallel")]
    pub fn score_all(
        &self,
        features: &Matrix,
        labels: &[Label],
        folds: &FoldAssignment,
    ) -> Result<Vec<FoldOutcome>> {
        use rayon::prelude::*;
        (1..=folds.folds())
            .into_par_iter()
            .map(|fold| self.score_fold(features, labels, folds, fold))
            .collect()
    }
}

/// Out-of-fold probability per row (None for rows in failed folds).
pub fn pooled_probabilities(outcomes: &[FoldOutcome], rows: usize) -> Vec<Option<f64>> {
    let mut pooled = vec![None; rows];
    for scores in outcomes.iter().filter_map(FoldOutcome::scores) {
        for (&i, &p) in scores.indices.iter().zip(scores.probabilities.iter()) {
            pooled[i] = Some(p);
        }
    }
    pooled
}
