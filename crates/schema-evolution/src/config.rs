//! Engine configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// How command version stamps are checked during replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VersionPolicy {
    /// Versions must be at least 1 and never lower than the current version.
    #[default]
    NonDecreasing,
    /// Lower versions are accepted with a warning; the current version stays the maximum.
    /// Version 0 is still rejected.
    Lenient,
}

/// Configuration for the schema evolution engine and its file outputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvolutionConfig {
    /// Version stamp checking during replay.
    pub version_policy: VersionPolicy,

    /// Where the schema history artifact is written.
    pub history_file: PathBuf,

    /// Directory for generated record migration modules.
    pub upcast_out_dir: PathBuf,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            version_policy: VersionPolicy::NonDecreasing,
            history_file: PathBuf::from("schema.history.json"),
            upcast_out_dir: PathBuf::from("src/generated/migrations"),
        }
    }
}
