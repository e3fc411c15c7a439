//! Run reports: JSON for machines, a short summary for people.

use crate::pipeline::PipelineOutcome;
use chrono::{DateTime, Utc};
use rc_common::{Error, RunId, SCHEMA_VERSION};
use rc_config::ConfigSnapshot;
use serde::Serialize;
use std::fmt::Write as _;

/// Full record of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub schema_version: String,
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub config: ConfigSnapshot,
    #[serde(flatten)]
    pub outcome: PipelineOutcome,
}

impl PipelineReport {
    pub fn new(config: ConfigSnapshot, outcome: PipelineOutcome) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            run_id: RunId::new(),
            generated_at: Utc::now(),
            config,
            outcome,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human summary.
    pub fn render_summary(&self) -> String {
        let o = &self.outcome;
        let mut out = String::new();
        let fingerprint = self.config.fingerprint.get(..12).unwrap_or(&self.config.fingerprint);
        let _ = writeln!(out, "riskcut {} (config {fingerprint})", self.run_id);
        let _ = writeln!(
            out,
            "selected threshold: {}   expected cost: {}",
            format_threshold(o.selection.threshold),
            format_cost(o.selection.mean_cost)
        );
        let _ = writeln!(
            out,
            "rows: {} in, {} scored   features: {} kept of {}",
            o.rows_in,
            o.rows_scored,
            o.preprocess.kept_columns.len(),
            o.preprocess.input_columns
        );
        if o.resample.triggered {
            let _ = writeln!(
                out,
                "resampling: +{} synthetic positives (minority ratio {:.3})",
                o.resample.synthetic, o.resample.ratio_after
            );
        } else {
            let _ = writeln!(
                out,
                "resampling: not triggered (prevalence {:.3})",
                o.resample.prevalence_before
            );
        }
        let failed = o.folds.iter().filter(|f| !f.scored).count();
        let _ = writeln!(
            out,
            "folds: {} scored, {} failed, {} convergence warnings",
            o.folds.len() - failed,
            failed,
            o.convergence_warnings()
        );
        let c = &o.diagnostics.confusion;
        let _ = writeln!(
            out,
            "pooled at threshold: TP {} FP {} TN {} FN {}   brier {:.4}",
            c.tp, c.fp, c.tn, c.fn_, o.diagnostics.brier_score
        );
        out
    }
}

/// User-visible description of a failed run.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub schema_version: String,
    pub kind: String,
    pub code: u32,
    pub message: String,
}

impl ErrorReport {
    pub fn from_error(err: &Error) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            kind: err.kind().to_string(),
            code: err.code(),
            message: err.to_string(),
        }
    }

    pub fn render_summary(&self) -> String {
        format!("error: {} ({}): {}", self.kind, self.code, self.message)
    }
}

/// Threshold to three decimals.
pub fn format_threshold(threshold: f64) -> String {
    format!("{threshold:.3}")
}

/// Cost rounded to a whole currency unit with thousands separators.
pub fn format_cost(cost: f64) -> String {
    let rounded = cost.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}")
}
