//! Conditional minority oversampling.
//!
//! Below the prevalence trigger, synthetic positives are interpolated between
//! a real positive and one of its nearest positive neighbours until the
//! minority:majority ratio reaches the target. At or above the trigger the
//! data passes through untouched.

use crate::dataset::Matrix;
use rc_common::labels::{class_counts, positive_prevalence, Label, POSITIVE};
use rc_common::{Error, Result};
use rc_config::ResamplingConfig;
use rc_math::squared_euclidean;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

/// Outcome of the resampling decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampleSummary {
    pub triggered: bool,
    pub prevalence_before: f64,
    pub minority_before: usize,
    pub majority: usize,
    pub synthetic: usize,
    /// minority:majority after resampling (equal to the input ratio when not triggered).
    pub ratio_after: f64,
}

/// Resampled (or passed-through) data.
#[derive(Debug, Clone)]
pub struct Resampled {
    pub features: Matrix,
    pub labels: Vec<Label>,
    pub summary: ResampleSummary,
}

/// Prevalence-gated minority oversampler with an explicit seed.
#[derive(Debug, Clone)]
pub struct ConditionalResampler {
    enabled: bool,
    minority_trigger: f64,
    target_ratio: f64,
    k_neighbors: usize,
    seed: u64,
}

impl ConditionalResampler {
    /// Default trigger (0.05), target ratio (0.5), and 5 neighbours.
    pub fn new(seed: u64) -> Self {
        Self::from_config(&ResamplingConfig {
            seed,
            ..Default::default()
        })
    }

    pub fn from_config(cfg: &ResamplingConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            minority_trigger: cfg.minority_trigger,
            target_ratio: cfg.target_ratio,
            k_neighbors: cfg.k_neighbors.max(1),
            seed: cfg.seed,
        }
    }

    /// Rebalance `(x, y)` when positive prevalence is strictly below the trigger.
    ///
    /// Synthetic rows are appended after the original rows, which keep their
    /// order. Fails with `Resampling` if fewer than two positives exist when
    /// resampling is required.
    pub fn resample(&self, features: Matrix, labels: Vec<Label>) -> Result<Resampled> {
        if features.len() != labels.len() {
            return Err(Error::LengthMismatch {
                context: "resampling features vs labels",
                left: features.len(),
                right: labels.len(),
            });
        }
        let _span = info_span!("resample", rows = labels.len()).entered();

        let (majority, minority) = class_counts(&labels);
        let prevalence = positive_prevalence(&labels);
        let ratio_before = if majority > 0 {
            minority as f64 / majority as f64
        } else {
            f64::INFINITY
        };

        let pass_through = |features: Matrix, labels: Vec<Label>| Resampled {
            features,
            labels,
            summary: ResampleSummary {
                triggered: false,
                prevalence_before: prevalence,
                minority_before: minority,
                majority,
                synthetic: 0,
                ratio_after: ratio_before,
            },
        };

        if !self.enabled || prevalence >= self.minority_trigger {
            debug!(prevalence, trigger = self.minority_trigger, "resampling not triggered");
            return Ok(pass_through(features, labels));
        }

        if minority < 2 {
            return Err(Error::Resampling {
                minority_count: minority,
                reason: "interpolation needs at least two minority samples".to_string(),
            });
        }

        let target_minority = (self.target_ratio * majority as f64).round() as usize;
        let synthetic = target_minority.saturating_sub(minority);

        let minority_rows: Vec<&Vec<f64>> = features
            .iter()
            .zip(labels.iter())
            .filter(|&(_, &l)| l == POSITIVE)
            .map(|(row, _)| row)
            .collect();
        let neighbors = nearest_neighbors(&minority_rows, self.k_neighbors);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut generated = Vec::with_capacity(synthetic);
        for _ in 0..synthetic {
            let base = rng.random_range(0..minority_rows.len());
            let pick = rng.random_range(0..neighbors[base].len());
            let neighbor = neighbors[base][pick];
            let gap: f64 = rng.random();
            let row: Vec<f64> = minority_rows[base]
                .iter()
                .zip(minority_rows[neighbor].iter())
                .map(|(a, b)| a + gap * (b - a))
                .collect();
            generated.push(row);
        }

        let mut features = features;
        let mut labels = labels;
        features.extend(generated);
        labels.extend(std::iter::repeat(POSITIVE).take(synthetic));

        let ratio_after = (minority + synthetic) as f64 / majority as f64;
        info!(
            prevalence,
            minority,
            synthetic,
            ratio_after,
            "minority oversampling applied"
        );

        Ok(Resampled {
            features,
            labels,
            summary: ResampleSummary {
                triggered: true,
                prevalence_before: prevalence,
                minority_before: minority,
                majority,
                synthetic,
                ratio_after,
            },
        })
    }
}

/// For each row, the indices of its k nearest other rows (ties broken by index).
fn nearest_neighbors(rows: &[&Vec<f64>], k: usize) -> Vec<Vec<usize>> {
    let k = k.min(rows.len().saturating_sub(1)).max(1);
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let mut dists: Vec<(f64, usize)> = rows
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(j, other)| (squared_euclidean(row, other), j))
                .collect();
            dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            dists.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_data(negatives: usize, positives: usize) -> (Matrix, Vec<Label>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..negatives {
            x.push(vec![i as f64 * 0.01, -1.0]);
            y.push(0);
        }
        for i in 0..positives {
            x.push(vec![5.0 + i as f64, 1.0 + i as f64 * 0.5]);
            y.push(1);
        }
        (x, y)
    }

    #[test]
    fn passes_through_at_trigger_boundary() {
        let (x, y) = make_data(950, 50);
        let out = ConditionalResampler::new(42).resample(x.clone(), y.clone()).unwrap();
        assert!(!out.summary.triggered);
        assert_eq!(out.features, x);
        assert_eq!(out.labels, y);
    }

    #[test]
    fn oversamples_to_target_ratio() {
        let (x, y) = make_data(990, 10);
        let out = ConditionalResampler::new(42).resample(x.clone(), y).unwrap();
        let (neg, pos) = class_counts(&out.labels);
        assert!(out.summary.triggered);
        assert_eq!(neg, 990);
        assert!(pos >= 10);
        assert!(((pos as f64 / neg as f64) - 0.5).abs() < 0.02);
        assert_eq!(out.summary.synthetic, pos - 10);
        // Originals keep their position.
        assert_eq!(&out.features[..1000], &x[..]);
    }

    #[test]
    fn synthetic_rows_lie_between_minority_samples() {
        let (x, y) = make_data(400, 4);
        let out = ConditionalResampler::new(7).resample(x, y).unwrap();
        for row in &out.features[404..] {
            assert!(row[0] >= 5.0 && row[0] <= 8.0, "x0 out of hull: {}", row[0]);
            assert!(row[1] >= 1.0 && row[1] <= 2.5, "x1 out of hull: {}", row[1]);
        }
    }

    #[test]
    fn deterministic_for_seed() {
        let (x, y) = make_data(300, 3);
        let a = ConditionalResampler::new(9).resample(x.clone(), y.clone()).unwrap();
        let b = ConditionalResampler::new(9).resample(x, y).unwrap();
        assert_eq!(a.features, b.features);
    }

    #[test]
    fn single_minority_sample_is_an_error() {
        let (x, y) = make_data(500, 1);
        let err = ConditionalResampler::new(1).resample(x, y).unwrap_err();
        assert!(matches!(err, Error::Resampling { minority_count: 1, .. }));
        assert_eq!(err.kind(), "ResamplingError");
    }

    #[test]
    fn disabled_resampler_never_triggers() {
        let cfg = ResamplingConfig {
            enabled: false,
            ..Default::default()
        };
        let (x, y) = make_data(990, 10);
        let out = ConditionalResampler::from_config(&cfg).resample(x, y).unwrap();
        assert!(!out.summary.triggered);
        assert_eq!(out.labels.len(), 1000);
    }
}
