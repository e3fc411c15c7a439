//! Sigmoid (Platt) calibration of raw classifier scores.
//!
//! Fits p = σ(a·s + b) by Newton's method on the cross-entropy against
//! Platt's smoothed targets, (N₊+1)/(N₊+2) for positives and 1/(N₋+2) for
//! negatives, which keeps `a` finite when the scores separate the classes.

use super::FitReport;
use rc_common::labels::{class_counts, Label, POSITIVE};
use rc_common::{Error, Result};
use rc_math::{logit_log_loss, sigmoid, solve_spd};
use serde::{Deserialize, Serialize};

const MAX_ITER: usize = 100;
const TOLERANCE: f64 = 1e-9;
const RIDGE: f64 = 1e-12;
const MIN_STEP: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattCalibrator {
    pub a: f64,
    pub b: f64,
}

impl Default for PlattCalibrator {
    /// Identity on logits: σ(s).
    fn default() -> Self {
        Self { a: 1.0, b: 0.0 }
    }
}

impl PlattCalibrator {
    /// Fit on raw scores and their labels.
    pub fn fit(scores: &[f64], labels: &[Label]) -> Result<(Self, FitReport)> {
        if scores.len() != labels.len() {
            return Err(Error::LengthMismatch {
                context: "calibration scores vs labels",
                left: scores.len(),
                right: labels.len(),
            });
        }
        if scores.is_empty() {
            return Err(Error::InsufficientData {
                column: None,
                reason: "no scores to calibrate".to_string(),
            });
        }

        let (negatives, positives) = class_counts(labels);
        let hi = (positives as f64 + 1.0) / (positives as f64 + 2.0);
        let lo = 1.0 / (negatives as f64 + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|&l| if l == POSITIVE { hi } else { lo })
            .collect();
        let n = scores.len() as f64;

        let objective = |a: f64, b: f64| -> f64 {
            scores
                .iter()
                .zip(targets.iter())
                .map(|(&s, &t)| logit_log_loss(a * s + b, t))
                .sum::<f64>()
                / n
        };
        let gradient = |a: f64, b: f64| -> [f64; 2] {
            let mut g = [0.0; 2];
            for (&s, &t) in scores.iter().zip(targets.iter()) {
                let r = sigmoid(a * s + b) - t;
                g[0] += r * s;
                g[1] += r;
            }
            [g[0] / n, g[1] / n]
        };

        let mut a = 0.0;
        let mut b = ((positives as f64 + 1.0) / (negatives as f64 + 1.0)).ln();
        let mut g = gradient(a, b);
        let mut iterations = 0;

        while iterations < MAX_ITER && g[0].abs().max(g[1].abs()) >= TOLERANCE {
            iterations += 1;
            let mut h = [[0.0; 2]; 2];
            for &s in scores {
                let p = sigmoid(a * s + b);
                let w = p * (1.0 - p);
                h[0][0] += w * s * s;
                h[0][1] += w * s;
                h[1][1] += w;
            }
            let hessian = vec![
                vec![h[0][0] / n + RIDGE, h[0][1] / n],
                vec![h[0][1] / n, h[1][1] / n + RIDGE],
            ];
            let direction = solve_spd(&hessian, &g).unwrap_or_else(|| g.to_vec());

            let current = objective(a, b);
            let slope = g[0] * direction[0] + g[1] * direction[1];
            let mut step = 1.0;
            while step >= MIN_STEP
                && objective(a - step * direction[0], b - step * direction[1])
                    > current - 1e-4 * step * slope
            {
                step *= 0.5;
            }
            if step < MIN_STEP {
                break;
            }
            a -= step * direction[0];
            b -= step * direction[1];
            g = gradient(a, b);
        }

        let gradient_norm = g[0].abs().max(g[1].abs());
        Ok((
            Self { a, b },
            FitReport {
                converged: gradient_norm < TOLERANCE,
                iterations,
                gradient_norm,
            },
        ))
    }

    /// Calibrated probability for one raw score.
    pub fn transform(&self, score: f64) -> f64 {
        sigmoid(self.a * score + self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibrated_output_is_monotonic_in_score() {
        let scores: Vec<f64> = (0..100).map(|i| (i as f64 - 50.0) / 10.0).collect();
        let labels: Vec<Label> = (0..100).map(|i| u8::from(i % 7 < i / 15)).collect();
        let (cal, _) = PlattCalibrator::fit(&scores, &labels).unwrap();
        assert!(cal.a > 0.0);
        let mut prev = 0.0;
        for s in [-5.0, -1.0, 0.0, 1.0, 5.0] {
            let p = cal.transform(s);
            assert!(p > prev);
            prev = p;
        }
    }

    #[test]
    fn separable_scores_stay_finite() {
        let scores = vec![-3.0, -2.0, -1.5, 1.5, 2.0, 3.0];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let (cal, report) = PlattCalibrator::fit(&scores, &labels).unwrap();
        assert!(cal.a.is_finite() && cal.b.is_finite());
        assert!(report.converged, "{report:?}");
        // Smoothed targets cap confidence below certainty.
        assert!(cal.transform(3.0) < 0.99);
        assert!(cal.transform(3.0) > 0.5);
        assert!(cal.transform(-3.0) < 0.5);
    }

    #[test]
    fn uninformative_scores_map_to_base_rate() {
        let scores = vec![0.0; 20];
        let labels: Vec<Label> = (0..20).map(|i| u8::from(i < 5)).collect();
        let (cal, _) = PlattCalibrator::fit(&scores, &labels).unwrap();
        // Target mean: (5*6/7 + 15*1/17) / 20
        let expected = (5.0 * 6.0 / 7.0 + 15.0 / 17.0) / 20.0;
        assert!((cal.transform(0.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn rejects_empty_input() {
        let err = PlattCalibrator::fit(&[], &[]).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { column: None, .. }));
        assert!(PlattCalibrator::fit(&[1.0], &[]).is_err());
    }
}
