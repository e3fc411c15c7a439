//! Semantic validation for pipeline configuration.

use crate::pipeline::PipelineConfig;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("unsupported config format: '.{extension}' (expected toml, yaml, yml, or json)")]
    UnsupportedFormat { extension: String },

    #[error("incompatible schema version {found} (expected major version of {expected})")]
    IncompatibleSchema { found: String, expected: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl From<ValidationError> for rc_common::Error {
    fn from(err: ValidationError) -> Self {
        rc_common::Error::Config(err.to_string())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

/// Collect every semantic problem in the config.
pub fn collect_issues(cfg: &PipelineConfig) -> Vec<ValidationError> {
    let mut issues = Vec::new();

    if !rc_common::schema::is_compatible(&cfg.schema_version) {
        issues.push(ValidationError::IncompatibleSchema {
            found: cfg.schema_version.clone(),
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
        });
    }

    if cfg.data.label_column.trim().is_empty() {
        issues.push(invalid("data.label_column", "must not be empty"));
    }
    if cfg.data.id_column.as_deref() == Some(cfg.data.label_column.as_str()) {
        issues.push(invalid("data.id_column", "must differ from data.label_column"));
    }

    let r = &cfg.resampling;
    if !(r.minority_trigger > 0.0 && r.minority_trigger <= 1.0) {
        issues.push(invalid(
            "resampling.minority_trigger",
            format!("{} is outside (0, 1]", r.minority_trigger),
        ));
    }
    if !(r.target_ratio > 0.0 && r.target_ratio <= 1.0) {
        issues.push(invalid(
            "resampling.target_ratio",
            format!("{} is outside (0, 1]", r.target_ratio),
        ));
    }
    if r.k_neighbors == 0 {
        issues.push(invalid("resampling.k_neighbors", "must be at least 1"));
    }

    if cfg.folds.count < 2 {
        issues.push(invalid(
            "folds.count",
            format!("{} folds; at least 2 are required", cfg.folds.count),
        ));
    }

    let c = &cfg.costs;
    for (field, value) in [
        ("costs.false_positive", c.false_positive),
        ("costs.false_negative", c.false_negative),
    ] {
        if !value.is_finite() || value < 0.0 {
            issues.push(invalid(field, format!("{value} must be finite and non-negative")));
        }
    }
    if c.false_positive == 0.0 && c.false_negative == 0.0 {
        issues.push(invalid("costs", "at least one weight must be positive"));
    }

    let g = &cfg.grid;
    if g.points == 0 {
        issues.push(invalid("grid.points", "must be at least 1"));
    }
    if !(g.low > 0.0 && g.high < 1.0) {
        issues.push(invalid(
            "grid",
            format!("[{}, {}] must lie strictly inside (0, 1)", g.low, g.high),
        ));
    }
    if g.low > g.high {
        issues.push(invalid("grid", format!("low {} exceeds high {}", g.low, g.high)));
    }

    let m = &cfg.model;
    if m.max_iter == 0 {
        issues.push(invalid("model.max_iter", "must be at least 1"));
    }
    if !(m.tolerance > 0.0 && m.tolerance.is_finite()) {
        issues.push(invalid("model.tolerance", "must be positive"));
    }
    if !(m.inverse_regularization > 0.0 && m.inverse_regularization.is_finite()) {
        issues.push(invalid("model.inverse_regularization", "must be positive"));
    }
    if m.calibration_folds < 2 {
        issues.push(invalid("model.calibration_folds", "must be at least 2"));
    }

    issues
}

/// Validate a config, returning the first problem found.
pub fn validate_config(cfg: &PipelineConfig) -> Result<(), ValidationError> {
    match collect_issues(cfg).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(collect_issues(&PipelineConfig::default()).is_empty());
        assert!(validate_config(&PipelineConfig::default()).is_ok());
    }

    #[test]
    fn grid_endpoints_must_be_inside_unit_interval() {
        let mut cfg = PipelineConfig::default();
        cfg.grid.low = 0.0;
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { field: "grid", .. }));

        let mut cfg = PipelineConfig::default();
        cfg.grid.low = 0.8;
        cfg.grid.high = 0.2;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn rejects_single_fold_and_zero_weights() {
        let mut cfg = PipelineConfig::default();
        cfg.folds.count = 1;
        cfg.costs.false_positive = 0.0;
        cfg.costs.false_negative = 0.0;
        let issues = collect_issues(&cfg);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn rejects_negative_weight_and_bad_ratio() {
        let mut cfg = PipelineConfig::default();
        cfg.costs.false_positive = -1.0;
        cfg.resampling.target_ratio = 1.5;
        let fields: Vec<_> = collect_issues(&cfg)
            .into_iter()
            .filter_map(|e| match e {
                ValidationError::InvalidValue { field, .. } => Some(field),
                _ => None,
            })
            .collect();
        assert!(fields.contains(&"costs.false_positive"));
        assert!(fields.contains(&"resampling.target_ratio"));
    }

    #[test]
    fn rejects_incompatible_schema() {
        let cfg = PipelineConfig {
            schema_version: "2.0.0".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::IncompatibleSchema { .. })
        ));
    }

    #[test]
    fn converts_into_common_config_error() {
        let err: rc_common::Error = invalid("folds.count", "bad").into();
        assert_eq!(err.kind(), "ConfigError");
    }
}
