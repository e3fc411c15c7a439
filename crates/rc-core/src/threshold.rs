//! Threshold sweep and cost-minimising selection.
//!
//! Every (threshold, fold) pair is costed by binarising the fold's held-out
//! probabilities at the threshold (p ≥ t predicts positive). Each threshold's
//! row is averaged over the folds that produced a cost; failed folds are
//! excluded from the mean rather than poisoning it. The threshold with the
//! lowest mean wins, and ties go to the smallest threshold.

use crate::cost::CostEvaluator;
use crate::scorer::{FoldOutcome, FoldScores};
use rc_common::labels::{Label, NEGATIVE, POSITIVE};
use rc_common::{Error, Result};
use rc_config::GridConfig;
use rc_math::linspace;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

/// Strictly increasing candidate cutoffs inside (0, 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdGrid {
    points: Vec<f64>,
}

impl ThresholdGrid {
    /// `n` evenly spaced cutoffs from `low` to `high` inclusive.
    pub fn new(low: f64, high: f64, n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidGrid("grid needs at least one point".to_string()));
        }
        if !(low > 0.0 && high < 1.0 && low <= high) {
            return Err(Error::InvalidGrid(format!(
                "bounds [{low}, {high}] must satisfy 0 < low <= high < 1"
            )));
        }
        if n > 1 && low == high {
            return Err(Error::InvalidGrid(format!(
                "{n} points cannot be distinct over the single value {low}"
            )));
        }
        Ok(Self {
            points: linspace(low, high, n),
        })
    }

    pub fn from_config(cfg: &GridConfig) -> Result<Self> {
        Self::new(cfg.low, cfg.high, cfg.points)
    }

    /// Explicit cutoffs; they must be strictly increasing and inside (0, 1).
    pub fn from_points(points: Vec<f64>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::InvalidGrid("grid needs at least one point".to_string()));
        }
        if let Some(p) = points.iter().find(|&&p| !(p > 0.0 && p < 1.0)) {
            return Err(Error::InvalidGrid(format!("cutoff {p} is outside (0, 1)")));
        }
        if points.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidGrid("cutoffs must be strictly increasing".to_string()));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Predicted labels at cutoff `threshold` (p ≥ t → positive).
pub fn binarize_at(probabilities: &[f64], threshold: f64) -> Vec<Label> {
    probabilities
        .iter()
        .map(|&p| if p >= threshold { POSITIVE } else { NEGATIVE })
        .collect()
}

/// Cost per (threshold, fold). A `None` column is a fold that produced no cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostMatrix {
    thresholds: usize,
    columns: Vec<Option<Vec<f64>>>,
}

impl CostMatrix {
    pub fn new(thresholds: usize) -> Self {
        Self {
            thresholds,
            columns: Vec::new(),
        }
    }

    /// Append the next fold's column.
    pub fn push_fold(&mut self, column: Option<Vec<f64>>) -> Result<()> {
        if let Some(costs) = &column {
            if costs.len() != self.thresholds {
                return Err(Error::LengthMismatch {
                    context: "cost column vs threshold grid",
                    left: costs.len(),
                    right: self.thresholds,
                });
            }
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn thresholds(&self) -> usize {
        self.thresholds
    }

    pub fn folds(&self) -> usize {
        self.columns.len()
    }

    /// Cost at (threshold row `t`, fold `k`), both 0-based.
    pub fn cell(&self, t: usize, k: usize) -> Option<f64> {
        self.columns
            .get(k)?
            .as_ref()?
            .get(t)
            .copied()
            .filter(|c| !c.is_nan())
    }

    /// Mean over the counted cells of row `t`, with the count.
    pub fn row_mean(&self, t: usize) -> Option<(f64, usize)> {
        let (sum, count) = (0..self.folds())
            .filter_map(|k| self.cell(t, k))
            .fold((0.0, 0usize), |(s, n), c| (s + c, n + 1));
        (count > 0).then(|| (sum / count as f64, count))
    }

    /// Folds whose column is entirely absent.
    pub fn failed_folds(&self) -> usize {
        self.columns.iter().filter(|c| c.is_none()).count()
    }
}

/// One point on the mean-cost curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    pub threshold: f64,
    /// `None` when no fold produced a cost at this threshold.
    pub mean_cost: Option<f64>,
    pub folds_counted: usize,
}

/// The winning cutoff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdSelection {
    pub threshold: f64,
    pub mean_cost: f64,
    /// Row index into the grid.
    pub index: usize,
    pub folds_counted: usize,
}

/// Matrix, curve and selection from one sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdEvaluation {
    #[serde(skip)]
    pub matrix: CostMatrix,
    pub curve: Vec<CurvePoint>,
    pub selection: ThresholdSelection,
}

#[derive(Debug, Clone)]
pub struct ThresholdSelector {
    grid: ThresholdGrid,
    evaluator: CostEvaluator,
}

impl ThresholdSelector {
    pub fn new(grid: ThresholdGrid, evaluator: CostEvaluator) -> Self {
        Self { grid, evaluator }
    }

    pub fn grid(&self) -> &ThresholdGrid {
        &self.grid
    }

    /// Cost of one fold at every grid point.
    pub fn fold_costs(&self, scores: &FoldScores) -> Result<Vec<f64>> {
        self.grid
            .points()
            .iter()
            .map(|&t| {
                self.evaluator
                    .cost(&scores.labels, &binarize_at(&scores.probabilities, t))
            })
            .collect()
    }

    fn column(&self, outcome: &FoldOutcome) -> Result<Option<Vec<f64>>> {
        match outcome {
            FoldOutcome::Scored(scores) => self.fold_costs(scores).map(Some),
            FoldOutcome::Failed { .. } => Ok(None),
        }
    }

    /// One column per fold outcome, in the order given.
    #[cfg(not(feature = "parallel"))]
    pub fn build_matrix(&self, outcomes: &[FoldOutcome]) -> Result<CostMatrix> {
        let mut matrix = CostMatrix::new(self.grid.len());
        for outcome in outcomes {
            matrix.push_fold(self.column(outcome)?)?;
        }
        Ok(matrix)
    }

    /// One column per fold outcome, in the order given.
    #[cfg(feature = "parallel")]
    pub fn build_matrix(&self, outcomes: &[FoldOutcome]) -> Result<CostMatrix> {
        use rayon::prelude::*;
        let columns = outcomes
            .par_iter()
            .map(|outcome| self.column(outcome))
            .collect::<Result<Vec<_>>>()?;
        let mut matrix = CostMatrix::new(self.grid.len());
        for column in columns {
            matrix.push_fold(column)?;
        }
        Ok(matrix)
    }

    /// Mean cost per grid point.
    pub fn curve(&self, matrix: &CostMatrix) -> Vec<CurvePoint> {
        self.grid
            .points()
            .iter()
            .enumerate()
            .map(|(t, &threshold)| {
                let mean = matrix.row_mean(t);
                CurvePoint {
                    threshold,
                    mean_cost: mean.map(|(m, _)| m),
                    folds_counted: mean.map_or(0, |(_, n)| n),
                }
            })
            .collect()
    }

    /// Lowest mean cost; the earliest (smallest) threshold wins ties.
    pub fn select(&self, matrix: &CostMatrix) -> Result<ThresholdSelection> {
        if matrix.thresholds() != self.grid.len() {
            return Err(Error::LengthMismatch {
                context: "cost matrix rows vs threshold grid",
                left: matrix.thresholds(),
                right: self.grid.len(),
            });
        }
        let mut best: Option<ThresholdSelection> = None;
        for (t, &threshold) in self.grid.points().iter().enumerate() {
            let Some((mean_cost, folds_counted)) = matrix.row_mean(t) else {
                continue;
            };
            if best.as_ref().map_or(true, |b| mean_cost < b.mean_cost) {
                best = Some(ThresholdSelection {
                    threshold,
                    mean_cost,
                    index: t,
                    folds_counted,
                });
            }
        }
        best.ok_or(Error::NoValidThreshold {
            folds: matrix.folds(),
        })
    }

    /// Build the matrix, trace the curve, and pick the cutoff.
    pub fn evaluate(&self, outcomes: &[FoldOutcome]) -> Result<ThresholdEvaluation> {
        let _span = info_span!("select_threshold", points = self.grid.len()).entered();
        let matrix = self.build_matrix(outcomes)?;
        debug!(
            folds = matrix.folds(),
            failed = matrix.failed_folds(),
            "cost matrix built"
        );
        let selection = self.select(&matrix)?;
        info!(
            threshold = selection.threshold,
            mean_cost = selection.mean_cost,
            folds = selection.folds_counted,
            "threshold selected"
        );
        Ok(ThresholdEvaluation {
            curve: self.curve(&matrix),
            matrix,
            selection,
        })
    }
}
