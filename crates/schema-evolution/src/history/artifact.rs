//! Schema history artifact.
//!
//! The artifact (`schema.history.json` by default) captures a resolved schema
//! and its full migration log. It is written at the end of every successful
//! regeneration so later builds can diff against it.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use xxhash_rust::xxh3::xxh3_64;

use crate::diagnostic::SchemaError;
use crate::resolve::FinalSchema;

/// The artifact format version.
pub const ARTIFACT_FORMAT_VERSION: &str = "1.0";

/// A persisted [`FinalSchema`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryArtifact {
    /// Artifact format version.
    #[serde(rename = "formatVersion")]
    pub format_version: String,

    /// When this artifact was generated.
    #[serde(rename = "generatedAt")]
    pub generated_at: String,

    /// Engine version that generated this file.
    #[serde(rename = "engineVersion")]
    pub engine_version: String,

    /// Content hash of `schema`. Independent of timestamps.
    pub hash: String,

    pub schema: FinalSchema,
}

impl HistoryArtifact {
    /// Wraps a resolved schema.
    pub fn from_schema(schema: FinalSchema, engine_version: &str) -> Result<Self, SchemaError> {
        Ok(Self {
            format_version: ARTIFACT_FORMAT_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            engine_version: engine_version.to_string(),
            hash: compute_hash(&schema)?,
            schema,
        })
    }

    /// Load an artifact from disk.
    ///
    /// Returns `Ok(None)` if the file doesn't exist. A recorded hash that does
    /// not match the content is an error.
    pub fn load(path: &Path) -> Result<Option<Self>, SchemaError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::io(path, e.to_string()))?;

        let artifact: Self =
            serde_json::from_str(&content).map_err(|e| SchemaError::InvalidArtifact {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let computed = compute_hash(&artifact.schema)?;
        if computed != artifact.hash {
            return Err(SchemaError::HashMismatch {
                path: path.to_path_buf(),
                recorded: artifact.hash,
                computed,
            });
        }

        info!(path = %path.display(), hash = %artifact.hash, "loaded schema history artifact");
        Ok(Some(artifact))
    }

    /// Save the artifact to disk.
    pub fn save(&self, path: &Path) -> Result<(), SchemaError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SchemaError::io(parent, e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|e| SchemaError::InvalidArtifact {
            path: path.to_path_buf(),
            message: format!("Failed to serialize artifact: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| SchemaError::io(path, e.to_string()))?;

        info!(path = %path.display(), hash = %self.hash, "saved schema history artifact");
        Ok(())
    }

    pub fn into_schema(self) -> FinalSchema {
        self.schema
    }
}

/// Compute a content hash for a resolved schema.
///
/// Covers the whole serialized schema, every command payload included.
pub fn compute_hash(schema: &FinalSchema) -> Result<String, SchemaError> {
    let bytes = serde_json::to_vec(schema).map_err(|e| SchemaError::Serialization {
        message: e.to_string(),
    })?;
    Ok(format!("xxh3:{:016x}", xxh3_64(&bytes)))
}
