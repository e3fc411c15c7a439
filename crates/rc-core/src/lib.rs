//! Riskcut core: cost-sensitive decision-threshold selection.
//!
//! The pipeline imputes and scales features, conditionally oversamples the
//! minority class, assigns stratified folds, scores every row with a
//! calibrated classifier trained without that row, and picks the probability
//! cutoff with the lowest mean misclassification cost across folds.

pub mod cli;
pub mod cost;
pub mod dataset;
pub mod diagnostics;
pub mod exit_codes;
pub mod folds;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod report;
pub mod resample;
pub mod scorer;
pub mod threshold;

pub use cost::{ConfusionCounts, CostEvaluator, CostWeights};
pub use dataset::{Dataset, Matrix, RawMatrix};
pub use folds::{FoldAssigner, FoldAssignment};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use preprocess::{FeaturePreprocessor, Preprocessed, PreprocessSummary};
pub use resample::{ConditionalResampler, ResampleSummary, Resampled};
pub use scorer::{CalibratedScorer, ConvergenceWarning, FoldOutcome, FoldScores};
pub use threshold::{CostMatrix, ThresholdGrid, ThresholdSelection, ThresholdSelector};
