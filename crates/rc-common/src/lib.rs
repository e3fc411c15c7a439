//! Riskcut common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the riskcut crates:
//! - The unified error type and its stable codes
//! - Binary label encoding
//! - Run identifiers and schema versioning
//! - Output format specifications

pub mod error;
pub mod id;
pub mod labels;
pub mod output;
pub mod schema;

pub use error::{Error, Result};
pub use id::RunId;
pub use labels::{binarize, Label};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
