//! Quality checks over pooled out-of-fold probabilities.
//!
//! Reliability is reported per score range: mean predicted probability
//! against the observed positive rate. A well-calibrated scorer keeps the
//! two close in every populated range.

use crate::cost::ConfusionCounts;
use crate::scorer::FoldOutcome;
use crate::threshold::binarize_at;
use rc_common::labels::{Label, POSITIVE};
use rc_common::Result;
use serde::{Deserialize, Serialize};

const SCORE_RANGES: [(&str, f64, f64); 5] = [
    ("very_low (0-20)", 0.0, 0.2),
    ("low (20-40)", 0.2, 0.4),
    ("medium (40-60)", 0.4, 0.6),
    ("high (60-80)", 0.6, 0.8),
    ("very_high (80-100)", 0.8, 1.0),
];

/// Calibration of one score range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityBucket {
    pub range: String,
    pub sample_count: usize,
    pub mean_predicted: f64,
    pub actual_rate: f64,
    /// Positive = overconfident.
    pub bias: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Rows with an out-of-fold probability.
    pub scored_rows: usize,
    pub brier_score: f64,
    pub reliability: Vec<ReliabilityBucket>,
    /// Pooled confusion counts at the selected threshold.
    pub confusion: ConfusionCounts,
}

/// Mean squared error between probabilities and 0/1 outcomes.
pub fn brier_score(probabilities: &[f64], labels: &[Label]) -> f64 {
    if probabilities.is_empty() {
        return 0.0;
    }
    probabilities
        .iter()
        .zip(labels.iter())
        .map(|(&p, &l)| {
            let y = if l == POSITIVE { 1.0 } else { 0.0 };
            (p - y).powi(2)
        })
        .sum::<f64>()
        / probabilities.len() as f64
}

/// Buckets with at least one sample. The top range includes 1.0.
pub fn reliability(probabilities: &[f64], labels: &[Label]) -> Vec<ReliabilityBucket> {
    SCORE_RANGES
        .iter()
        .filter_map(|&(name, low, high)| {
            let samples: Vec<(f64, Label)> = probabilities
                .iter()
                .zip(labels.iter())
                .filter(|&(&p, _)| p >= low && (p < high || (high >= 1.0 && p <= high)))
                .map(|(&p, &l)| (p, l))
                .collect();
            if samples.is_empty() {
                return None;
            }
            let n = samples.len() as f64;
            let mean_predicted = samples.iter().map(|(p, _)| p).sum::<f64>() / n;
            let actual_rate = samples.iter().filter(|(_, l)| *l == POSITIVE).count() as f64 / n;
            Some(ReliabilityBucket {
                range: name.to_string(),
                sample_count: samples.len(),
                mean_predicted,
                actual_rate,
                bias: mean_predicted - actual_rate,
            })
        })
        .collect()
}

/// Diagnostics over every scored fold, cut at `threshold`.
pub fn diagnose(outcomes: &[FoldOutcome], threshold: f64) -> Result<Diagnostics> {
    let mut probabilities = Vec::new();
    let mut labels = Vec::new();
    for scores in outcomes.iter().filter_map(FoldOutcome::scores) {
        probabilities.extend_from_slice(&scores.probabilities);
        labels.extend_from_slice(&scores.labels);
    }
    let confusion = ConfusionCounts::from_predictions(&labels, &binarize_at(&probabilities, threshold))?;
    Ok(Diagnostics {
        scored_rows: probabilities.len(),
        brier_score: brier_score(&probabilities, &labels),
        reliability: reliability(&probabilities, &labels),
        confusion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::FoldScores;

    #[test]
    fn brier_bounds() {
        assert_eq!(brier_score(&[1.0, 0.0], &[1, 0]), 0.0);
        assert_eq!(brier_score(&[0.0, 1.0], &[1, 0]), 1.0);
        assert!((brier_score(&[0.5, 0.5], &[1, 0]) - 0.25).abs() < 1e-12);
        assert_eq!(brier_score(&[], &[]), 0.0);
    }

    #[test]
    fn reliability_buckets_by_score_range() {
        let probs = [0.1, 0.15, 0.5, 0.9, 1.0];
        let labels = [0, 1, 1, 1, 1];
        let buckets = reliability(&probs, &labels);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].range, "very_low (0-20)");
        assert_eq!(buckets[0].sample_count, 2);
        assert!((buckets[0].actual_rate - 0.5).abs() < 1e-12);
        assert_eq!(buckets[2].sample_count, 2);
        assert!((buckets[2].bias - (0.95 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn diagnose_pools_scored_folds() {
        let outcomes = vec![
            FoldOutcome::Scored(FoldScores {
                fold: 1,
                indices: vec![0, 1],
                probabilities: vec![0.9, 0.2],
                labels: vec![1, 1],
                warning: None,
            }),
            FoldOutcome::Failed {
                fold: 2,
                reason: "skipped".into(),
            },
            FoldOutcome::Scored(FoldScores {
                fold: 3,
                indices: vec![2],
                probabilities: vec![0.6],
                labels: vec![0],
                warning: None,
            }),
        ];
        let d = diagnose(&outcomes, 0.5).unwrap();
        assert_eq!(d.scored_rows, 3);
        assert_eq!(
            d.confusion,
            ConfusionCounts {
                tp: 1,
                fp: 1,
                tn: 0,
                fn_: 1
            }
        );
    }
}
