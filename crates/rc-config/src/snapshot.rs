//! Config snapshots embedded in run reports.

use crate::pipeline::PipelineConfig;
use crate::resolve::ConfigSource;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Effective config plus provenance and a content fingerprint.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    pub source: ConfigSource,
    /// SHA-256 of the canonical JSON encoding of `config`.
    pub fingerprint: String,
    pub config: PipelineConfig,
}

impl ConfigSnapshot {
    pub fn new(config: PipelineConfig, source: ConfigSource) -> Result<Self, serde_json::Error> {
        let fingerprint = fingerprint(&config)?;
        Ok(Self {
            source,
            fingerprint,
            config,
        })
    }
}

/// Hex SHA-256 of the config's JSON encoding.
pub fn fingerprint(config: &PipelineConfig) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(config)?;
    let digest = Sha256::digest(&bytes);
    Ok(hex::encode(digest))
}
