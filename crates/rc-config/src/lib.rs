//! Riskcut configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the pipeline configuration
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Config fingerprints for run reports

pub mod pipeline;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use pipeline::{
    CostConfig, DataConfig, FoldConfig, GridConfig, ModelConfig, PipelineConfig, ResamplingConfig,
};
pub use resolve::{load_config_from_path, parse_config_str, resolve_config, ConfigFormat, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_config, ValidationError};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
