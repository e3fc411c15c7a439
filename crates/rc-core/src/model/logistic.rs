//! L2-regularised logistic regression fitted by damped Newton iterations.
//!
//! Objective: mean log-loss + λ/2 ‖w‖² with λ = 1 / (C · n); the intercept
//! is not penalised. Each iteration solves the (M+1)² Newton system and
//! backtracks until the Armijo condition holds.

use super::{FitReport, ProbabilisticClassifier};
use rc_common::labels::Label;
use rc_common::{Error, Result};
use rc_config::ModelConfig;
use rc_math::{dot, logit_log_loss, sigmoid, solve_spd};
use tracing::trace;

const HESSIAN_JITTER: f64 = 1e-10;
const ARMIJO: f64 = 1e-4;
const MIN_STEP: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    max_iter: usize,
    tolerance: f64,
    inverse_regularization: f64,
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(max_iter: usize, tolerance: f64, inverse_regularization: f64) -> Self {
        Self {
            max_iter,
            tolerance,
            inverse_regularization,
            weights: Vec::new(),
            intercept: 0.0,
        }
    }

    pub fn from_config(cfg: &ModelConfig) -> Self {
        Self::new(cfg.max_iter, cfg.tolerance, cfg.inverse_regularization)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Raw linear scores `w·x + b`.
    pub fn decision_function(&self, features: &[Vec<f64>]) -> Vec<f64> {
        features
            .iter()
            .map(|row| dot(&self.weights, row) + self.intercept)
            .collect()
    }
}

/// Parameters packed as `[w_0, …, w_{m-1}, b]`.
struct Problem<'a> {
    features: &'a [Vec<f64>],
    targets: Vec<f64>,
    lambda: f64,
    m: usize,
}

impl Problem<'_> {
    fn logit(&self, theta: &[f64], row: &[f64]) -> f64 {
        dot(&theta[..self.m], row) + theta[self.m]
    }

    fn objective(&self, theta: &[f64]) -> f64 {
        let n = self.features.len() as f64;
        let loss: f64 = self
            .features
            .iter()
            .zip(self.targets.iter())
            .map(|(row, &t)| logit_log_loss(self.logit(theta, row), t))
            .sum();
        let penalty: f64 = theta[..self.m].iter().map(|w| w * w).sum();
        loss / n + 0.5 * self.lambda * penalty
    }

    fn gradient(&self, theta: &[f64]) -> Vec<f64> {
        let n = self.features.len() as f64;
        let mut g = vec![0.0; self.m + 1];
        for (row, &t) in self.features.iter().zip(self.targets.iter()) {
            let r = sigmoid(self.logit(theta, row)) - t;
            for (gj, xj) in g.iter_mut().zip(row.iter()) {
                *gj += r * xj;
            }
            g[self.m] += r;
        }
        for (j, gj) in g.iter_mut().enumerate() {
            *gj /= n;
            if j < self.m {
                *gj += self.lambda * theta[j];
            }
        }
        g
    }

    fn hessian(&self, theta: &[f64]) -> Vec<Vec<f64>> {
        let n = self.features.len() as f64;
        let dim = self.m + 1;
        let mut h = vec![vec![0.0; dim]; dim];
        let mut augmented = vec![1.0; dim];
        for row in self.features {
            augmented[..self.m].copy_from_slice(row);
            let p = sigmoid(self.logit(theta, row));
            let w = p * (1.0 - p);
            for i in 0..dim {
                let wi = w * augmented[i];
                for j in 0..=i {
                    h[i][j] += wi * augmented[j];
                }
            }
        }
        for i in 0..dim {
            for j in 0..=i {
                h[i][j] /= n;
                h[j][i] = h[i][j];
            }
            if i < self.m {
                h[i][i] += self.lambda;
            }
            h[i][i] += HESSIAN_JITTER;
        }
        h
    }
}

fn max_norm(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

impl ProbabilisticClassifier for LogisticRegression {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[Label]) -> Result<FitReport> {
        if features.len() != labels.len() {
            return Err(Error::LengthMismatch {
                context: "logistic regression features vs labels",
                left: features.len(),
                right: labels.len(),
            });
        }
        if features.is_empty() {
            return Err(Error::InsufficientData {
                column: None,
                reason: "empty training partition".to_string(),
            });
        }

        let m = features[0].len();
        let problem = Problem {
            features,
            targets: labels.iter().map(|&l| f64::from(l)).collect(),
            lambda: 1.0 / (self.inverse_regularization * features.len() as f64),
            m,
        };

        let mut theta = vec![0.0; m + 1];
        let mut grad = problem.gradient(&theta);
        let mut iterations = 0;

        while iterations < self.max_iter && max_norm(&grad) >= self.tolerance {
            iterations += 1;
            let hessian = problem.hessian(&theta);
            let direction = solve_spd(&hessian, &grad).unwrap_or_else(|| grad.clone());

            let current = problem.objective(&theta);
            let slope = dot(&grad, &direction);
            let mut step = 1.0;
            let mut candidate: Vec<f64>;
            loop {
                candidate = theta
                    .iter()
                    .zip(direction.iter())
                    .map(|(t, d)| t - step * d)
                    .collect();
                if problem.objective(&candidate) <= current - ARMIJO * step * slope
                    || step < MIN_STEP
                {
                    break;
                }
                step *= 0.5;
            }
            if step < MIN_STEP {
                trace!(iterations, "line search stalled");
                break;
            }
            theta = candidate;
            grad = problem.gradient(&theta);
        }

        let gradient_norm = max_norm(&grad);
        self.intercept = theta[m];
        theta.truncate(m);
        self.weights = theta;

        Ok(FitReport {
            converged: gradient_norm < self.tolerance,
            iterations,
            gradient_norm,
        })
    }

    fn predict_proba(&self, features: &[Vec<f64>]) -> Vec<f64> {
        self.decision_function(features)
            .into_iter()
            .map(sigmoid)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<Label>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            let v = i as f64 / 10.0;
            x.push(vec![-1.0 - v, 0.3 * v]);
            y.push(0);
            x.push(vec![1.0 + v, -0.3 * v]);
            y.push(1);
        }
        (x, y)
    }

    #[test]
    fn converges_and_separates() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new(100, 1e-6, 1.0);
        let report = model.fit(&x, &y).unwrap();
        assert!(report.converged, "{report:?}");
        assert!(report.iterations < 100);
        assert!(model.weights()[0] > 0.0);

        let probs = model.predict_proba(&x);
        for (p, &label) in probs.iter().zip(y.iter()) {
            if label == 1 {
                assert!(*p > 0.5);
            } else {
                assert!(*p < 0.5);
            }
        }
    }

    #[test]
    fn stronger_regularisation_shrinks_weights() {
        let (x, y) = separable();
        let mut loose = LogisticRegression::new(100, 1e-6, 10.0);
        let mut tight = LogisticRegression::new(100, 1e-6, 0.01);
        loose.fit(&x, &y).unwrap();
        tight.fit(&x, &y).unwrap();
        assert!(tight.weights()[0].abs() < loose.weights()[0].abs());
    }

    #[test]
    fn exhausted_budget_reports_non_convergence() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new(1, 1e-12, 100.0);
        let report = model.fit(&x, &y).unwrap();
        assert!(!report.converged);
        assert_eq!(report.iterations, 1);
        // Best-effort coefficients still rank the classes.
        let probs = model.predict_proba(&[vec![-2.0, 0.0], vec![2.0, 0.0]]);
        assert!(probs[0] < probs[1]);
    }

    #[test]
    fn intercept_tracks_base_rate_without_features() {
        let x = vec![Vec::new(); 10];
        let y = vec![0, 0, 0, 0, 0, 0, 0, 1, 1, 1];
        let mut model = LogisticRegression::new(100, 1e-8, 1.0);
        model.fit(&x, &y).unwrap();
        let p = model.predict_proba(&[Vec::new()])[0];
        assert!((p - 0.3).abs() < 1e-6);
    }

    #[test]
    fn rejects_empty_and_mismatched_input() {
        let mut model = LogisticRegression::new(10, 1e-6, 1.0);
        let err = model.fit(&[], &[]).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { column: None, .. }));
        assert!(model.fit(&[vec![1.0]], &[0, 1]).is_err());
    }
}
