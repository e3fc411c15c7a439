//! End-to-end threshold selection.
//!
//! ```text
//! dataset → preprocess → resample → assign folds → score per fold
//!         → cost matrix → select threshold → diagnostics
//! ```
//!
//! Preprocessing is fitted on the full feature matrix before folding. Data
//! shape errors abort the run; per-fold failures are recorded and excluded.

use crate::cost::{CostEvaluator, CostWeights};
use crate::dataset::Dataset;
use crate::diagnostics::{diagnose, Diagnostics};
use crate::folds::{FoldAssigner, FoldAssignment};
use crate::model::{CalibratedLogisticFactory, ModelFactory};
use crate::preprocess::{FeaturePreprocessor, PreprocessSummary};
use crate::resample::{ConditionalResampler, ResampleSummary};
use crate::scorer::{CalibratedScorer, ConvergenceWarning, FoldOutcome};
use crate::threshold::{CurvePoint, ThresholdGrid, ThresholdSelection, ThresholdSelector};
use rc_common::labels::class_counts;
use rc_common::{Error, Result};
use rc_config::{validate_config, PipelineConfig};
use serde::Serialize;
use tracing::{debug, info, info_span};

/// Per-fold line in the run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldSummary {
    pub fold: usize,
    pub size: usize,
    pub positives: usize,
    pub scored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence: Option<ConvergenceWarning>,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub rows_in: usize,
    pub rows_scored: usize,
    pub preprocess: PreprocessSummary,
    pub resample: ResampleSummary,
    pub folds: Vec<FoldSummary>,
    pub curve: Vec<CurvePoint>,
    pub selection: ThresholdSelection,
    pub diagnostics: Diagnostics,
}

impl PipelineOutcome {
    pub fn threshold(&self) -> f64 {
        self.selection.threshold
    }

    pub fn mean_cost(&self) -> f64 {
        self.selection.mean_cost
    }

    pub fn convergence_warnings(&self) -> usize {
        self.folds.iter().filter(|f| f.convergence.is_some()).count()
    }
}

/// Configured pipeline; cheap to clone and reusable across datasets.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Validate `config` and build a pipeline.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        validate_config(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run with the calibrated logistic model.
    pub fn run(&self, dataset: &Dataset) -> Result<PipelineOutcome> {
        let factory = CalibratedLogisticFactory::new(self.config.model.clone(), self.config.folds.seed);
        self.run_with(dataset, factory)
    }

    /// Run with models built by `factory`, one per fold.
    pub fn run_with<F: ModelFactory>(&self, dataset: &Dataset, factory: F) -> Result<PipelineOutcome> {
        let _span = info_span!("pipeline", rows = dataset.len()).entered();
        if dataset.is_empty() {
            return Err(Error::InsufficientData {
                column: None,
                reason: "dataset has no rows".to_string(),
            });
        }
        let grid = ThresholdGrid::from_config(&self.config.grid)?;

        let preprocessed = FeaturePreprocessor::new().fit_transform(&dataset.features)?;
        let resampled = ConditionalResampler::from_config(&self.config.resampling)
            .resample(preprocessed.features, dataset.labels.clone())?;
        let assignment = FoldAssigner::from_config(&self.config.folds).assign(&resampled.labels)?;

        let outcomes = CalibratedScorer::new(factory).score_all(
            &resampled.features,
            &resampled.labels,
            &assignment,
        )?;

        debug!(
            false_positive = self.config.costs.false_positive,
            false_negative = self.config.costs.false_negative,
            fn_to_fp = self.config.costs.ratio(),
            "cost weights"
        );
        let selector = ThresholdSelector::new(
            grid,
            CostEvaluator::new(CostWeights::from(&self.config.costs)),
        );
        let evaluation = selector.evaluate(&outcomes)?;
        let diagnostics = diagnose(&outcomes, evaluation.selection.threshold)?;

        info!(
            threshold = evaluation.selection.threshold,
            mean_cost = evaluation.selection.mean_cost,
            rows = resampled.labels.len(),
            "pipeline complete"
        );

        Ok(PipelineOutcome {
            rows_in: dataset.len(),
            rows_scored: diagnostics.scored_rows,
            preprocess: preprocessed.summary,
            resample: resampled.summary,
            folds: fold_summaries(&assignment, &resampled.labels, &outcomes),
            curve: evaluation.curve,
            selection: evaluation.selection,
            diagnostics,
        })
    }
}

fn fold_summaries(
    assignment: &FoldAssignment,
    labels: &[rc_common::labels::Label],
    outcomes: &[FoldOutcome],
) -> Vec<FoldSummary> {
    outcomes
        .iter()
        .map(|outcome| {
            let fold = outcome.fold();
            let held_out = assignment.held_out(fold);
            let held_labels: Vec<_> = held_out.iter().map(|&i| labels[i]).collect();
            let (_, positives) = class_counts(&held_labels);
            let (failure, convergence) = match outcome {
                FoldOutcome::Scored(scores) => (None, scores.warning.clone()),
                FoldOutcome::Failed { reason, .. } => (Some(reason.clone()), None),
            };
            FoldSummary {
                fold,
                size: held_out.len(),
                positives,
                scored: failure.is_none(),
                failure,
                convergence,
            }
        })
        .collect()
}
