//! The evolution engine.
//!
//! A [`SchemaEvolution`] is the exclusively owned replay state. Each call to
//! [`SchemaEvolution::apply`] is one state transition; commands are applied
//! strictly in the order given, and [`SchemaEvolution::resolve`] consumes the
//! builder into an immutable [`FinalSchema`].

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::{EvolutionConfig, VersionPolicy};
use crate::diagnostic::{EvolutionError, ReplayErrorKind};
use crate::document::DocumentState;
use crate::history::MigrationStep;
use crate::model::{DocumentDefinition, SchemaCommand};
use crate::resolve::{self, FinalSchema};

/// Mutable replay state.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEvolution {
    policy: VersionPolicy,
    /// Document names in first-declaration order.
    order: Vec<String>,
    documents: HashMap<String, DocumentState>,
    commands: Vec<SchemaCommand>,
    current_version: u32,
    migrations: Vec<MigrationStep>,
}

impl Default for SchemaEvolution {
    fn default() -> Self {
        Self::with_policy(VersionPolicy::default())
    }
}

impl SchemaEvolution {
    /// An empty evolution using the default (non-decreasing) version policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: VersionPolicy) -> Self {
        Self {
            policy,
            order: Vec::new(),
            documents: HashMap::new(),
            commands: Vec::new(),
            current_version: 0,
            migrations: Vec::new(),
        }
    }

    pub fn with_config(config: &EvolutionConfig) -> Self {
        Self::with_policy(config.version_policy)
    }

    /// Applies one command.
    ///
    /// On error nothing from this command is retained; earlier commands stay
    /// applied. The error index is the command's position in the applied
    /// sequence.
    pub fn apply(&mut self, command: SchemaCommand) -> Result<(), EvolutionError> {
        let index = self.commands.len();
        self.transition(&command)
            .map_err(|reason| EvolutionError::at(index, &command, reason))?;

        let version = command.version();
        self.current_version = self.current_version.max(version);

        debug!(
            index,
            kind = %command.kind(),
            document = command.document_name(),
            version,
            "applied schema command"
        );

        self.migrations.push(MigrationStep::from_command(&command));
        self.commands.push(command);
        Ok(())
    }

    /// Applies commands in order, stopping at the first failure.
    pub fn apply_all<I>(&mut self, commands: I) -> Result<(), EvolutionError>
    where
        I: IntoIterator<Item = SchemaCommand>,
    {
        for command in commands {
            self.apply(command)?;
        }
        Ok(())
    }

    /// Consumes the builder into the resolved schema.
    pub fn resolve(self) -> FinalSchema {
        resolve::resolve(self)
    }

    /// Current projection of a document.
    pub fn document(&self, name: &str) -> Option<&DocumentDefinition> {
        self.documents.get(name).map(DocumentState::definition)
    }

    /// Current projections in first-declaration order.
    pub fn documents(&self) -> impl Iterator<Item = &DocumentDefinition> + '_ {
        self.order
            .iter()
            .filter_map(|name| self.documents.get(name))
            .map(DocumentState::definition)
    }

    pub fn commands(&self) -> &[SchemaCommand] {
        &self.commands
    }

    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    pub fn migrations(&self) -> &[MigrationStep] {
        &self.migrations
    }

    pub fn policy(&self) -> VersionPolicy {
        self.policy
    }

    /// Splits the builder into its parts, documents in declaration order.
    pub(crate) fn into_parts(mut self) -> (Vec<DocumentDefinition>, u32, Vec<MigrationStep>) {
        let documents = self
            .order
            .iter()
            .filter_map(|name| self.documents.remove(name))
            .map(DocumentState::into_definition)
            .collect();
        (documents, self.current_version, self.migrations)
    }

    fn transition(&mut self, command: &SchemaCommand) -> Result<(), ReplayErrorKind> {
        self.check_version(command)?;

        match command {
            SchemaCommand::NewDocument {
                document_name,
                fields,
                version,
            } => {
                if self.documents.contains_key(document_name) {
                    return Err(ReplayErrorKind::DuplicateDocument {
                        document: document_name.clone(),
                    });
                }
                let state = DocumentState::declare(document_name, fields.clone(), *version)?;
                self.order.push(document_name.clone());
                self.documents.insert(document_name.clone(), state);
            }
            SchemaCommand::AddField {
                document_name,
                field_name,
                field_type,
                default_value,
                ..
            } => {
                self.target(document_name)?
                    .add_field(field_name, *field_type, default_value.clone())?;
            }
            SchemaCommand::RemoveField {
                document_name,
                field_name,
                ..
            } => {
                self.target(document_name)?.remove_field(field_name)?;
            }
            SchemaCommand::RenameField {
                document_name,
                old_field_name,
                new_field_name,
                ..
            } => {
                self.target(document_name)?
                    .rename_field(old_field_name, new_field_name)?;
            }
            SchemaCommand::ChangeType {
                document_name,
                field_name,
                new_type,
                ..
            } => {
                self.target(document_name)?.change_type(field_name, *new_type)?;
            }
        }

        Ok(())
    }

    fn check_version(&self, command: &SchemaCommand) -> Result<(), ReplayErrorKind> {
        let version = command.version();
        let invalid = ReplayErrorKind::InvalidCommandVersion {
            version,
            current: self.current_version,
        };

        if version == 0 {
            return Err(invalid);
        }
        if version < self.current_version {
            match self.policy {
                VersionPolicy::NonDecreasing => return Err(invalid),
                VersionPolicy::Lenient => warn!(
                    version,
                    current = self.current_version,
                    document = command.document_name(),
                    "accepting command stamped with an older version"
                ),
            }
        }
        Ok(())
    }

    fn target(&mut self, document_name: &str) -> Result<&mut DocumentState, ReplayErrorKind> {
        self.documents
            .get_mut(document_name)
            .ok_or_else(|| ReplayErrorKind::UnknownDocument {
                document: document_name.to_string(),
            })
    }
}
