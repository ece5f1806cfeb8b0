//! Error types.
#![allow(unused_assignments)]

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::model::{CommandKind, SchemaCommand};

/// Why a single command could not be applied.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ReplayErrorKind {
    #[error("document '{document}' is already declared")]
    #[diagnostic(
        code(schema_evolution::replay::duplicate_document),
        help("Each document is declared once with NewDocument; evolve it afterwards with field commands.")
    )]
    DuplicateDocument { document: String },

    #[error("document '{document}' has not been declared")]
    #[diagnostic(
        code(schema_evolution::replay::unknown_document),
        help("Declare the document with NewDocument before any command that targets it.")
    )]
    UnknownDocument { document: String },

    #[error("field '{field}' already exists in document '{document}'")]
    #[diagnostic(code(schema_evolution::replay::duplicate_field))]
    DuplicateField { document: String, field: String },

    #[error("field '{field}' does not exist in document '{document}'")]
    #[diagnostic(code(schema_evolution::replay::unknown_field))]
    UnknownField { document: String, field: String },

    #[error("command version {version} is lower than the current schema version {current}")]
    #[diagnostic(
        code(schema_evolution::replay::invalid_version),
        help("Command versions start at 1 and must never decrease. Use the lenient version policy to accept out-of-order stamps.")
    )]
    InvalidCommandVersion { version: u32, current: u32 },
}

/// A replay failure, located at the offending command.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("command #{index} ({kind} on '{document}') rejected: {reason}")]
#[diagnostic(code(schema_evolution::replay::rejected))]
pub struct EvolutionError {
    /// Zero-based position of the command in the replayed sequence.
    pub index: usize,
    pub kind: CommandKind,
    pub document: String,
    pub field: Option<String>,
    #[source]
    #[diagnostic_source]
    pub reason: ReplayErrorKind,
}

impl EvolutionError {
    pub(crate) fn at(index: usize, command: &SchemaCommand, reason: ReplayErrorKind) -> Self {
        Self {
            index,
            kind: command.kind(),
            document: command.document_name().to_string(),
            field: command.field_name().map(str::to_string),
            reason,
        }
    }
}

/// Errors reading the migration history.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("document '{document}' does not appear in the schema history")]
    #[diagnostic(code(schema_evolution::history::unknown_document))]
    UnknownDocument { document: String },

    #[error("record version v{found} is newer than the current schema version v{current}")]
    #[diagnostic(
        code(schema_evolution::history::future_version),
        help("The record was written by a newer schema. Upgrade the schema source before reading it.")
    )]
    FutureVersion { found: u32, current: u32 },
}

/// Errors from the file-facing surfaces: command scripts, history artifacts
/// and generated output.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum SchemaError {
    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("Failed to access '{path}': {message}")]
    #[diagnostic(code(schema_evolution::io::access_failed))]
    IoError { path: PathBuf, message: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Invalid command script: {message}")]
    #[diagnostic(
        code(schema_evolution::parse::invalid_script),
        help("A command script is a JSON array of commands, or an object with a \"commands\" array.")
    )]
    InvalidScript { message: String },

    #[error("Invalid history artifact '{path}': {message}")]
    #[diagnostic(code(schema_evolution::parse::invalid_artifact))]
    InvalidArtifact { path: PathBuf, message: String },

    #[error("History artifact '{path}' hash mismatch: recorded {recorded}, computed {computed}")]
    #[diagnostic(
        code(schema_evolution::artifact::hash_mismatch),
        help("The artifact was edited by hand. Regenerate it from the command script.")
    )]
    HashMismatch {
        path: PathBuf,
        recorded: String,
        computed: String,
    },

    #[error("Failed to serialize schema: {message}")]
    #[diagnostic(code(schema_evolution::artifact::serialize_failed))]
    Serialization { message: String },

    // =========================================================================
    // Codegen Errors
    // =========================================================================
    #[error("Documents '{first}' and '{second}' both generate migration module '{module}'")]
    #[diagnostic(
        code(schema_evolution::codegen::module_collision),
        help("Generated module and type names are derived from document names. Rename one of the documents.")
    )]
    ModuleCollision {
        module: String,
        first: String,
        second: String,
    },

    // =========================================================================
    // Engine Errors
    // =========================================================================
    #[error(transparent)]
    #[diagnostic(transparent)]
    Replay(#[from] EvolutionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    History(#[from] HistoryError),
}

impl SchemaError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
        }
    }
}
