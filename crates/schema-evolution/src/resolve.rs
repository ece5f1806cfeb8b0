//! Folding replay state into the generation-ready schema.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::SchemaEvolution;
use crate::history::{MigrationHistory, MigrationStep};
use crate::model::DocumentDefinition;

/// The immutable result of a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalSchema {
    /// Final projections in first-declaration order.
    documents: Vec<DocumentDefinition>,
    current_version: u32,
    /// Every applied command, in application order.
    migrations: Vec<MigrationStep>,
}

impl FinalSchema {
    pub fn documents(&self) -> &[DocumentDefinition] {
        &self.documents
    }

    pub fn document(&self, name: &str) -> Option<&DocumentDefinition> {
        self.documents.iter().find(|d| d.name == name)
    }

    /// Highest version among the applied commands, 0 for an empty replay.
    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    pub fn migrations(&self) -> &[MigrationStep] {
        &self.migrations
    }

    /// Read access to the migration log.
    pub fn history(&self) -> MigrationHistory<'_> {
        MigrationHistory::new(&self.migrations, self.current_version)
    }
}

/// Resolves a finished replay. Consumes the builder so stale state cannot be
/// applied to afterwards.
pub fn resolve(evolution: SchemaEvolution) -> FinalSchema {
    let (documents, current_version, migrations) = evolution.into_parts();

    info!(
        documents = documents.len(),
        current_version,
        migrations = migrations.len(),
        "resolved schema"
    );

    FinalSchema {
        documents,
        current_version,
        migrations,
    }
}
