//! # Schema Evolution
//!
//! This crate replays an ordered sequence of declarative schema commands
//! (declare a document, add, remove, rename or retype a field) into a fully
//! resolved schema per document, together with the complete migration history
//! needed to bring stored records up to date.
//!
//! ## Architecture
//!
//! ```text
//! Command sequence (values or JSON script)
//!        │
//!        ▼
//! ┌──────────────┐
//! │    Engine    │  In-order replay, invariant checks
//! │  (commands)  │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Resolve    │  Immutable FinalSchema + history
//! └──────┬───────┘
//!        │
//!        ├──────────────────────┐
//!        ▼                      ▼
//! ┌──────────────┐       ┌──────────────┐
//! │   History    │       │   Codegen    │  Record upcasts (TypeScript)
//! │ artifact/diff│       │              │
//! └──────────────┘       └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use schema_evolution::{replay, FieldDefinition, FieldType, SchemaCommand};
//!
//! let schema = replay(vec![
//!     SchemaCommand::new_document(
//!         "User",
//!         vec![
//!             FieldDefinition::new("id", FieldType::String),
//!             FieldDefinition::new("email", FieldType::String),
//!         ],
//!         1,
//!     ),
//!     SchemaCommand::add_field("User", "name", FieldType::String, Some("\"\"".into()), 2),
//!     SchemaCommand::remove_field("User", "email", 3),
//! ])
//! .unwrap();
//!
//! assert_eq!(schema.current_version(), 3);
//! assert_eq!(schema.document("User").unwrap().field_names(), vec!["id", "name"]);
//! ```

pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod document;
pub mod engine;
pub mod history;
pub mod model;
pub mod resolve;
pub mod script;

use std::path::Path;

use tracing::{info, warn};

pub use config::{EvolutionConfig, VersionPolicy};
pub use diagnostic::{EvolutionError, HistoryError, ReplayErrorKind, SchemaError};
pub use engine::SchemaEvolution;
pub use history::{
    diff_schemas, HistoryArtifact, MigrationHistory, MigrationOp, MigrationPlan, MigrationStep,
    SchemaDiff,
};
pub use model::{CommandKind, DocumentDefinition, FieldDefinition, FieldType, SchemaCommand};
pub use resolve::{resolve, FinalSchema};
pub use script::CommandScript;

/// Replays commands with the default version policy and resolves the result.
pub fn replay<I>(commands: I) -> Result<FinalSchema, EvolutionError>
where
    I: IntoIterator<Item = SchemaCommand>,
{
    replay_with(VersionPolicy::default(), commands)
}

/// Replays commands under an explicit version policy.
pub fn replay_with<I>(policy: VersionPolicy, commands: I) -> Result<FinalSchema, EvolutionError>
where
    I: IntoIterator<Item = SchemaCommand>,
{
    let mut evolution = SchemaEvolution::with_policy(policy);
    evolution.apply_all(commands)?;
    Ok(evolution.resolve())
}

/// Drives a full regeneration from a command script on disk.
pub struct SchemaEngine {
    config: EvolutionConfig,
}

/// Summary of a regeneration run.
#[derive(Debug)]
pub struct RegenerateResult {
    pub schema: FinalSchema,
    /// Changes against the previous history artifact, empty on first run.
    pub changes: Vec<SchemaDiff>,
    pub hash: String,
    pub files_written: usize,
}

impl RegenerateResult {
    pub fn has_breaking_changes(&self) -> bool {
        self.changes.iter().any(|d| d.is_breaking())
    }
}

impl SchemaEngine {
    /// Creates an engine with the given configuration.
    pub fn new(config: EvolutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Replays commands under the configured version policy.
    pub fn replay<I>(&self, commands: I) -> Result<FinalSchema, EvolutionError>
    where
        I: IntoIterator<Item = SchemaCommand>,
    {
        let mut evolution = SchemaEvolution::with_config(&self.config);
        evolution.apply_all(commands)?;
        Ok(evolution.resolve())
    }

    /// Regenerates every output from a command script.
    ///
    /// This runs the full pipeline:
    /// 1. Load the command script
    /// 2. Replay and resolve
    /// 3. Diff against the previous history artifact, if any
    /// 4. Generate and write record migration modules
    /// 5. Save the new history artifact
    ///
    /// Nothing is written when the replay fails. The history artifact is
    /// written last, so a failed run leaves the previous one in place and the
    /// next run diffs against it again.
    pub fn regenerate(&self, script_path: &Path) -> Result<RegenerateResult, SchemaError> {
        // Phase 1: Load script
        let script = CommandScript::load(script_path)?;

        // Phase 2: Replay
        let schema = self.replay(script)?;

        // Phase 3: Diff against the last build
        let history_path = &self.config.history_file;
        let changes = match HistoryArtifact::load(history_path)? {
            Some(previous) => diff_schemas(&previous.schema, &schema),
            None => Vec::new(),
        };
        for diff in changes.iter().filter(|d| d.is_breaking()) {
            warn!(document = %diff.document, "breaking schema change\n{}", diff.format_changes());
        }

        // Phase 4: Generate migrations
        let artifact = HistoryArtifact::from_schema(schema, env!("CARGO_PKG_VERSION"))?;
        let generated = codegen::generate(&artifact.schema)?;
        generated.write_to(&self.config.upcast_out_dir)?;

        // Phase 5: Persist history
        artifact.save(history_path)?;

        info!(
            documents = artifact.schema.documents().len(),
            current_version = artifact.schema.current_version(),
            changes = changes.len(),
            "regenerated schema outputs"
        );

        Ok(RegenerateResult {
            files_written: generated.files.len(),
            hash: artifact.hash,
            schema: artifact.schema,
            changes,
        })
    }
}
