//! Numerically stable logistic primitives.
//!
//! The classifier and calibrator both work on logits; these helpers keep the
//! sigmoid and the binary log-loss finite for large-magnitude inputs.

/// Logistic sigmoid, evaluated without overflow for large |z|.
pub fn sigmoid(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Compute ln(1 + e^z) stably.
pub fn log1p_exp(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    if z > 35.0 {
        z
    } else if z < -35.0 {
        z.exp()
    } else {
        z.exp().ln_1p()
    }
}

/// Binary cross-entropy of a logit `z` against target `t` in [0, 1].
///
/// Equals `-(t ln σ(z) + (1 - t) ln(1 - σ(z)))` without forming σ(z).
pub fn logit_log_loss(z: f64, t: f64) -> f64 {
    log1p_exp(z) - t * z
}

/// Clamp a probability into the closed unit interval, mapping NaN to NaN.
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        p
    } else {
        p.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn sigmoid_basic_values() {
        assert!(approx_eq(sigmoid(0.0), 0.5, 1e-15));
        assert!(approx_eq(sigmoid(2.0) + sigmoid(-2.0), 1.0, 1e-15));
    }

    #[test]
    fn sigmoid_handles_extremes() {
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert!(sigmoid(f64::NAN).is_nan());
    }

    #[test]
    fn log1p_exp_matches_naive_in_safe_range() {
        for z in [-5.0, -1.0, 0.0, 1.0, 5.0] {
            let naive = (1.0 + f64::exp(z)).ln();
            assert!(approx_eq(log1p_exp(z), naive, 1e-12));
        }
        assert!(approx_eq(log1p_exp(800.0), 800.0, 1e-12));
        assert!(log1p_exp(-800.0) >= 0.0);
    }

    #[test]
    fn log_loss_is_small_for_confident_correct_logits() {
        assert!(logit_log_loss(20.0, 1.0) < 1e-8);
        assert!(logit_log_loss(-20.0, 0.0) < 1e-8);
        assert!(logit_log_loss(20.0, 0.0) > 19.0);
    }

    #[test]
    fn clamp_probability_bounds() {
        assert_eq!(clamp_probability(1.2), 1.0);
        assert_eq!(clamp_probability(-0.1), 0.0);
        assert!(clamp_probability(f64::NAN).is_nan());
    }
}
