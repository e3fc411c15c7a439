//! Feature preprocessing: median imputation, zero-variance filtering, and
//! standardisation, applied in that order.
//!
//! Each stage consumes the previous stage's output. Medians resist the
//! heavy tails of the raw features. Constant columns are removed before
//! scaling, and a column whose scaled values are not finite or collapse to
//! one value is dropped too, so no surviving column has a zero standard
//! deviation.

use crate::dataset::{Matrix, RawMatrix};
use rc_common::{Error, Result};
use rc_math::{median_present, ColumnStats};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn};

/// What preprocessing did, by original column index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessSummary {
    pub input_columns: usize,
    /// Original indices of the columns that survived, in output order.
    pub kept_columns: Vec<usize>,
    /// Original indices of zero-variance columns that were dropped.
    pub dropped_columns: Vec<usize>,
    /// Median used to fill each input column.
    pub medians: Vec<f64>,
    /// Missing cells filled, per input column.
    pub imputed_per_column: Vec<usize>,
    /// Mean and standard deviation used to scale each kept column.
    pub means: Vec<f64>,
    pub std_devs: Vec<f64>,
}

impl PreprocessSummary {
    pub fn imputed_cells(&self) -> usize {
        self.imputed_per_column.iter().sum()
    }
}

/// Preprocessed matrix plus its summary.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub features: Matrix,
    pub summary: PreprocessSummary,
}

/// Stateless preprocessing stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeaturePreprocessor;

impl FeaturePreprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Run all three stages over `raw` (N×M) and return X' (N×M').
    ///
    /// Fails with `InsufficientData` when there are no rows or a column has
    /// no present value (its median is undefined).
    pub fn fit_transform(&self, raw: &RawMatrix) -> Result<Preprocessed> {
        let _span = info_span!("preprocess", rows = raw.len()).entered();

        let n_rows = raw.len();
        if n_rows == 0 {
            return Err(Error::InsufficientData {
                column: None,
                reason: "dataset has no rows".to_string(),
            });
        }
        let n_cols = raw[0].len();
        if let Some(i) = raw.iter().position(|row| row.len() != n_cols) {
            return Err(Error::Dataset {
                row: i + 1,
                message: format!("expected {} features, found {}", n_cols, raw[i].len()),
            });
        }

        let (imputed, medians, imputed_per_column) = impute_medians(raw, n_cols)?;
        let (candidates, mut dropped_columns) = split_constant_columns(&imputed, n_cols);

        let mut kept_columns = Vec::with_capacity(candidates.len());
        let mut means = Vec::with_capacity(candidates.len());
        let mut std_devs = Vec::with_capacity(candidates.len());
        let mut scaled_columns = Vec::with_capacity(candidates.len());
        for j in candidates {
            let column: Vec<f64> = imputed.iter().map(|row| row[j]).collect();
            match standardize_column(&column) {
                Some(scaled) => {
                    kept_columns.push(j);
                    means.push(scaled.mean);
                    std_devs.push(scaled.std_dev);
                    scaled_columns.push(scaled.values);
                }
                None => {
                    debug!(column = j, "standardised column is degenerate");
                    dropped_columns.push(j);
                }
            }
        }
        dropped_columns.sort_unstable();

        if !dropped_columns.is_empty() {
            debug!(dropped = ?dropped_columns, "dropping zero-variance columns");
        }
        if kept_columns.is_empty() {
            warn!("every feature column is constant; the classifier sees only an intercept");
        }

        let features: Matrix = (0..n_rows)
            .map(|i| scaled_columns.iter().map(|col| col[i]).collect())
            .collect();

        let summary = PreprocessSummary {
            input_columns: n_cols,
            kept_columns,
            dropped_columns,
            medians,
            imputed_per_column,
            means,
            std_devs,
        };
        debug!(
            imputed = summary.imputed_cells(),
            kept = summary.kept_columns.len(),
            "preprocessing complete"
        );
        Ok(Preprocessed { features, summary })
    }
}

type Imputed = (Matrix, Vec<f64>, Vec<usize>);

fn impute_medians(raw: &RawMatrix, n_cols: usize) -> Result<Imputed> {
    let mut medians = Vec::with_capacity(n_cols);
    for j in 0..n_cols {
        let column: Vec<Option<f64>> = raw.iter().map(|row| row[j]).collect();
        let median = median_present(&column).ok_or_else(|| Error::InsufficientData {
            column: Some(j),
            reason: "every value is missing, median is undefined".to_string(),
        })?;
        medians.push(median);
    }

    let mut imputed_per_column = vec![0usize; n_cols];
    let imputed = raw
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(j, cell)| match cell {
                    Some(v) if !v.is_nan() => *v,
                    _ => {
                        imputed_per_column[j] += 1;
                        medians[j]
                    }
                })
                .collect()
        })
        .collect();

    Ok((imputed, medians, imputed_per_column))
}

/// Partition column indices into (kept, dropped) by exact constancy.
///
/// Comparing against the first value avoids a rounding residue in the
/// computed variance of a constant column.
fn split_constant_columns(matrix: &Matrix, n_cols: usize) -> (Vec<usize>, Vec<usize>) {
    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for j in 0..n_cols {
        let first = matrix[0][j];
        if matrix.iter().all(|row| row[j] == first) {
            dropped.push(j);
        } else {
            kept.push(j);
        }
    }
    (kept, dropped)
}

struct ScaledColumn {
    mean: f64,
    std_dev: f64,
    values: Vec<f64>,
}

/// Z-score one column in units of its largest magnitude, so the variance
/// neither underflows nor overflows.
///
/// Returns None when the scaled values are not finite or collapse to a
/// single value. The reported mean and standard deviation are in original
/// units.
fn standardize_column(column: &[f64]) -> Option<ScaledColumn> {
    let scale = column.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if !(scale.is_finite() && scale > 0.0) {
        return None;
    }
    let unit: Vec<f64> = column.iter().map(|v| v / scale).collect();
    let stats = ColumnStats::from_values(&unit)?;
    let std_dev = stats.std_dev();
    if !(std_dev.is_finite() && std_dev > 0.0) {
        return None;
    }
    let values: Vec<f64> = unit.iter().map(|v| (v - stats.mean) / std_dev).collect();
    let first = *values.first()?;
    if values.iter().any(|v| !v.is_finite()) || values.iter().all(|&v| v == first) {
        return None;
    }
    Some(ScaledColumn {
        mean: stats.mean * scale,
        std_dev: std_dev * scale,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(m: &Matrix, j: usize) -> Vec<f64> {
        m.iter().map(|r| r[j]).collect()
    }

    #[test]
    fn imputes_with_median_not_mean() {
        let raw = vec![
            vec![Some(1.0), Some(0.0)],
            vec![Some(2.0), Some(1.0)],
            vec![None, Some(2.0)],
            vec![Some(1000.0), Some(3.0)],
        ];
        let out = FeaturePreprocessor::new().fit_transform(&raw).unwrap();
        assert_eq!(out.summary.medians[0], 2.0);
        assert_eq!(out.summary.imputed_per_column, vec![1, 0]);
        assert_eq!(out.summary.imputed_cells(), 1);
    }

    #[test]
    fn drops_constant_columns() {
        let raw = vec![
            vec![Some(5.0), Some(1.0), Some(0.1)],
            vec![Some(5.0), Some(2.0), Some(0.1)],
            vec![None, Some(3.0), Some(0.1)],
        ];
        let out = FeaturePreprocessor::new().fit_transform(&raw).unwrap();
        assert_eq!(out.summary.kept_columns, vec![1]);
        assert_eq!(out.summary.dropped_columns, vec![0, 2]);
        assert!(out.features.iter().all(|r| r.len() == 1));
    }

    #[test]
    fn output_is_standardized() {
        let raw: RawMatrix = (0..50)
            .map(|i| vec![Some(i as f64), Some((i * i) as f64)])
            .collect();
        let out = FeaturePreprocessor::new().fit_transform(&raw).unwrap();
        for j in 0..2 {
            let stats = ColumnStats::from_values(&column(&out.features, j)).unwrap();
            assert!(stats.mean.abs() < 1e-9);
            assert!((stats.variance - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn all_missing_column_fails_with_column_index() {
        let raw = vec![vec![Some(1.0), None], vec![Some(2.0), None]];
        let err = FeaturePreprocessor::new().fit_transform(&raw).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { column: Some(1), .. }));
        assert_eq!(err.kind(), "InsufficientDataError");
    }

    #[test]
    fn empty_input_fails() {
        let err = FeaturePreprocessor::new().fit_transform(&Vec::new()).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { column: None, .. }));
        assert!(!err.to_string().contains("column"));
    }

    #[test]
    fn nan_cells_are_treated_as_missing() {
        let raw = vec![
            vec![Some(1.0)],
            vec![Some(f64::NAN)],
            vec![Some(3.0)],
        ];
        let out = FeaturePreprocessor::new().fit_transform(&raw).unwrap();
        assert!(out.features.iter().all(|r| r[0].is_finite()));
        assert_eq!(out.summary.imputed_per_column, vec![1]);
    }

    #[test]
    fn tiny_magnitudes_standardize_to_finite_values() {
        let raw = vec![
            vec![Some(0.0), Some(1.0)],
            vec![Some(1e-200), Some(2.0)],
            vec![Some(0.0), Some(3.0)],
            vec![Some(1e-200), Some(4.0)],
        ];
        let out = FeaturePreprocessor::new().fit_transform(&raw).unwrap();
        assert_eq!(out.summary.kept_columns, vec![0, 1]);
        assert_eq!(column(&out.features, 0), vec![-1.0, 1.0, -1.0, 1.0]);
        assert!(out.summary.std_devs[0] > 0.0);
    }

    #[test]
    fn huge_magnitudes_standardize_to_finite_values() {
        let raw = vec![
            vec![Some(1e200)],
            vec![Some(-1e200)],
            vec![Some(1e200)],
            vec![Some(-1e200)],
        ];
        let out = FeaturePreprocessor::new().fit_transform(&raw).unwrap();
        assert_eq!(out.summary.kept_columns, vec![0]);
        assert_eq!(column(&out.features, 0), vec![1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn largest_finite_values_stay_finite() {
        let raw = vec![
            vec![Some(f64::MAX), Some(1.0)],
            vec![Some(-f64::MAX), Some(2.0)],
            vec![Some(f64::MAX), Some(3.0)],
        ];
        let out = FeaturePreprocessor::new().fit_transform(&raw).unwrap();
        assert!(out.features.iter().flatten().all(|v| v.is_finite()));
        for j in 0..out.summary.kept_columns.len() {
            let col = column(&out.features, j);
            assert!(col.iter().any(|&v| v != col[0]));
        }
    }
}
