//! Column statistics used by preprocessing and resampling.

use serde::{Deserialize, Serialize};

/// Summary statistics for one feature column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub mean: f64,
    /// Population variance (divides by N).
    pub variance: f64,
}

impl ColumnStats {
    /// Compute statistics over a column. Returns None when the column is empty.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        let variance = population_variance(values)?;
        Some(Self { mean, variance })
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// Arithmetic mean; None for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (two-pass); None for an empty slice.
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(ss / values.len() as f64)
}

/// Median of the present values, ignoring missing (`None`) and NaN entries.
///
/// Returns None when no value is present.
pub fn median_present(values: &[Option<f64>]) -> Option<f64> {
    let mut present: Vec<f64> = values
        .iter()
        .filter_map(|v| *v)
        .filter(|v| !v.is_nan())
        .collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.total_cmp(b));
    let n = present.len();
    if n % 2 == 1 {
        Some(present[n / 2])
    } else {
        // Halve first so two huge values cannot overflow.
        Some(present[n / 2 - 1] / 2.0 + present[n / 2] / 2.0)
    }
}

/// Dot product over the shorter of the two slices.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Squared Euclidean distance.
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
