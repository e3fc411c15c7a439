//! Tabular input: feature matrix plus binary labels.
//!
//! CSV parsing uses the `csv` crate. The identifier column is dropped, the
//! label column is binarised against the configured negative sentinel, and
//! every other column must be numeric or one of the missing-value tokens.

use rc_common::labels::{binarize, Label, NEGATIVE, POSITIVE};
use rc_common::{Error, Result};
use rc_config::DataConfig;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Feature matrix that may contain missing cells.
pub type RawMatrix = Vec<Vec<Option<f64>>>;

/// Dense real-valued feature matrix.
pub type Matrix = Vec<Vec<f64>>;

/// Loaded samples, aligned by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub ids: Vec<String>,
    pub feature_names: Vec<String>,
    pub features: RawMatrix,
    pub labels: Vec<Label>,
}

impl Dataset {
    /// Build a dataset from in-memory parts, checking alignment and that
    /// every label is 0 or 1.
    ///
    /// Row ids default to the 1-based row number.
    pub fn new(feature_names: Vec<String>, features: RawMatrix, labels: Vec<Label>) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(Error::LengthMismatch {
                context: "features vs labels",
                left: features.len(),
                right: labels.len(),
            });
        }
        if let Some(i) = labels.iter().position(|&l| l != NEGATIVE && l != POSITIVE) {
            return Err(Error::Dataset {
                row: i + 1,
                message: format!("label {} is not binary", labels[i]),
            });
        }
        for (i, row) in features.iter().enumerate() {
            if row.len() != feature_names.len() {
                return Err(Error::Dataset {
                    row: i + 1,
                    message: format!(
                        "expected {} features, found {}",
                        feature_names.len(),
                        row.len()
                    ),
                });
            }
        }
        let ids = (1..=features.len()).map(|i| i.to_string()).collect();
        Ok(Self {
            ids,
            feature_names,
            features,
            labels,
        })
    }

    /// Build a dataset from complete (no missing cells) rows.
    pub fn from_dense(features: Matrix, labels: Vec<Label>) -> Result<Self> {
        let width = features.first().map(|r| r.len()).unwrap_or(0);
        let names = (0..width).map(|j| format!("f{j}")).collect();
        let raw = features
            .into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect();
        Self::new(names, raw, labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Load a CSV file.
    pub fn from_csv_path(path: &Path, data: &DataConfig) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        debug!(path = %path.display(), "reading dataset");
        Self::from_csv_reader(file, data)
    }

    /// Parse CSV content with a header row.
    pub fn from_csv_reader<R: Read>(reader: R, data: &DataConfig) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();

        let label_idx = headers
            .iter()
            .position(|h| h == data.label_column)
            .ok_or_else(|| Error::Dataset {
                row: 0,
                message: format!("label column '{}' not found in header", data.label_column),
            })?;
        let id_idx = data
            .id_column
            .as_deref()
            .and_then(|name| headers.iter().position(|h| h == name));
        if id_idx.is_none() {
            if let Some(name) = &data.id_column {
                debug!(column = %name, "id column not present, using row numbers");
            }
        }

        let feature_cols: Vec<usize> = (0..headers.len())
            .filter(|&j| j != label_idx && Some(j) != id_idx)
            .collect();
        let feature_names: Vec<String> = feature_cols
            .iter()
            .map(|&j| headers[j].to_string())
            .collect();

        let mut ids = Vec::new();
        let mut features = Vec::new();
        let mut raw_labels = Vec::new();

        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            let row_number = i + 1;

            let mut row = Vec::with_capacity(feature_cols.len());
            for &j in &feature_cols {
                let cell = record.get(j).unwrap_or("");
                row.push(parse_cell(cell, &data.missing_tokens).map_err(|_| {
                    Error::Dataset {
                        row: row_number,
                        message: format!("non-numeric value '{}' in column '{}'", cell, &headers[j]),
                    }
                })?);
            }

            let id = match id_idx {
                Some(j) => record.get(j).unwrap_or("").to_string(),
                None => row_number.to_string(),
            };
            ids.push(id);
            raw_labels.push(record.get(label_idx).unwrap_or("").to_string());
            features.push(row);
        }

        let label_refs: Vec<&str> = raw_labels.iter().map(String::as_str).collect();
        let labels = binarize(&label_refs, data.negative_label.as_str());

        debug!(
            rows = features.len(),
            features = feature_names.len(),
            "dataset parsed"
        );

        Ok(Self {
            ids,
            feature_names,
            features,
            labels,
        })
    }
}

/// Gather the elements at `indices`, in order.
pub fn take_rows<T: Clone>(rows: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| rows[i].clone()).collect()
}

/// Parse one cell: missing tokens and non-finite numbers become None.
fn parse_cell(cell: &str, missing_tokens: &[String]) -> std::result::Result<Option<f64>, ()> {
    if missing_tokens.iter().any(|t| t == cell) {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Ok(None),
        Err(_) => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
FileName,Machine,DebugSize,Benign
a.exe,332,0,1
b.exe,332,NA,0
c.exe,?,28,1
d.exe,34404,56,0
";

    #[test]
    fn parses_features_labels_and_missing_values() {
        let ds = Dataset::from_csv_reader(CSV.as_bytes(), &DataConfig::default()).unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.feature_names, vec!["Machine", "DebugSize"]);
        assert_eq!(ds.ids, vec!["a.exe", "b.exe", "c.exe", "d.exe"]);
        // Benign == "1" is the negative class
        assert_eq!(ds.labels, vec![0, 1, 0, 1]);
        assert_eq!(ds.features[1], vec![Some(332.0), None]);
        assert_eq!(ds.features[2], vec![None, Some(28.0)]);
    }

    #[test]
    fn missing_label_column_is_reported() {
        let cfg = DataConfig {
            label_column: "Class".to_string(),
            ..Default::default()
        };
        let err = Dataset::from_csv_reader(CSV.as_bytes(), &cfg).unwrap_err();
        assert!(matches!(err, Error::Dataset { row: 0, .. }));
    }

    #[test]
    fn non_numeric_cell_names_row_and_column() {
        let csv = "FileName,Machine,Benign\na.exe,abc,1\n";
        let err = Dataset::from_csv_reader(csv.as_bytes(), &DataConfig::default()).unwrap_err();
        match err {
            Error::Dataset { row, message } => {
                assert_eq!(row, 1);
                assert!(message.contains("Machine"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn absent_id_column_falls_back_to_row_numbers() {
        let csv = "x,Benign\n1.5,1\n2.5,0\n";
        let ds = Dataset::from_csv_reader(csv.as_bytes(), &DataConfig::default()).unwrap();
        assert_eq!(ds.ids, vec!["1", "2"]);
        assert_eq!(ds.feature_names, vec!["x"]);
    }

    #[test]
    fn take_rows_preserves_order() {
        let rows = vec![10, 11, 12, 13];
        assert_eq!(take_rows(&rows, &[3, 0, 2]), vec![13, 10, 12]);
    }

    #[test]
    fn new_checks_alignment() {
        let err = Dataset::new(vec!["a".into()], vec![vec![Some(1.0)]], vec![0, 1]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));

        let err = Dataset::new(vec!["a".into()], vec![vec![Some(1.0), None]], vec![0]).unwrap_err();
        assert!(matches!(err, Error::Dataset { row: 1, .. }));
    }

    #[test]
    fn non_binary_labels_are_rejected() {
        let x: Matrix = (0..40).map(|i| vec![i as f64]).collect();
        let y: Vec<Label> = (0..40).map(|i| (i % 3) as Label).collect();
        let err = Dataset::from_dense(x, y).unwrap_err();
        match err {
            Error::Dataset { row, message } => {
                assert_eq!(row, 3);
                assert!(message.contains("label 2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
