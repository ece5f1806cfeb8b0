//! Migration history.
//!
//! The history is the ordered list of [`MigrationStep`]s carried by a
//! [`FinalSchema`](crate::FinalSchema). It is replay-equivalent to the
//! original command sequence and is what record migrations are derived from:
//!
//! 1. [`MigrationHistory::plan`] turns the steps after a record's stored
//!    version into ordered [`MigrationOp`]s
//! 2. [`diff_schemas`] compares two resolved schemas across builds
//! 3. [`HistoryArtifact`] persists the whole thing with a content hash

pub mod artifact;
pub mod diff;

pub use artifact::{HistoryArtifact, ARTIFACT_FORMAT_VERSION};
pub use diff::{diff_schemas, DocumentStatus, FieldChange, SchemaDiff};

use serde::{Deserialize, Serialize};

use crate::diagnostic::HistoryError;
use crate::model::{FieldType, SchemaCommand};

/// One applied command with the version it took effect at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStep {
    pub version: u32,
    pub command: SchemaCommand,
    pub description: String,
}

impl MigrationStep {
    pub fn from_command(command: &SchemaCommand) -> Self {
        Self {
            version: command.version(),
            command: command.clone(),
            description: command.describe(),
        }
    }
}

/// A record-level transform derived from one migration step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOp {
    AddField {
        name: String,
        field_type: FieldType,
        default_value: Option<String>,
    },
    RemoveField {
        name: String,
    },
    RenameField {
        from: String,
        to: String,
    },
    ChangeType {
        name: String,
        new_type: FieldType,
        migration_function: String,
    },
}

/// The ops taking effect at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStage {
    pub version: u32,
    pub ops: Vec<MigrationOp>,
}

/// Ordered transforms bringing one document's record from a stored version
/// up to the current version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub document: String,
    pub from_version: u32,
    pub to_version: u32,
    pub stages: Vec<PlanStage>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// All ops in application order.
    pub fn ops(&self) -> impl Iterator<Item = &MigrationOp> + '_ {
        self.stages.iter().flat_map(|s| s.ops.iter())
    }
}

/// Read-only view over a migration log.
#[derive(Debug, Clone, Copy)]
pub struct MigrationHistory<'a> {
    steps: &'a [MigrationStep],
    current_version: u32,
}

impl<'a> MigrationHistory<'a> {
    pub fn new(steps: &'a [MigrationStep], current_version: u32) -> Self {
        Self {
            steps,
            current_version,
        }
    }

    pub fn steps(&self) -> &'a [MigrationStep] {
        self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    /// The command sequence the history was built from.
    pub fn commands(&self) -> Vec<SchemaCommand> {
        self.steps.iter().map(|s| s.command.clone()).collect()
    }

    /// Steps touching one document, in application order.
    pub fn for_document<'n>(&self, document: &'n str) -> impl Iterator<Item = &'a MigrationStep> + 'n
    where
        'a: 'n,
    {
        let steps: &'a [MigrationStep] = self.steps;
        steps
            .iter()
            .filter(move |s| s.command.document_name() == document)
    }

    /// Steps touching one document, each paired with its effective version:
    /// the schema version in force once the step was applied.
    ///
    /// Equal to the step's own stamp unless a lenient replay accepted a stamp
    /// lower than an earlier one, in which case the step takes effect at the
    /// highest version applied before it.
    pub fn effective_for_document<'n>(
        &self,
        document: &'n str,
    ) -> impl Iterator<Item = (u32, &'a MigrationStep)> + 'n
    where
        'a: 'n,
    {
        let steps: &'a [MigrationStep] = self.steps;
        steps
            .iter()
            .scan(0u32, |applied, step| {
                *applied = (*applied).max(step.version);
                Some((*applied, step))
            })
            .filter(move |(_, s)| s.command.document_name() == document)
    }

    /// Effective version at which a document was declared, if it ever was.
    pub fn declared_at(&self, document: &str) -> Option<u32> {
        self.effective_for_document(document)
            .find_map(|(version, s)| match s.command {
                SchemaCommand::NewDocument { .. } => Some(version),
                _ => None,
            })
    }

    /// Builds the transform chain for a record stored at `from_version`.
    ///
    /// A record stored at version `v` already has the shape produced by every
    /// step in effect at `<= v`, so only later steps contribute. Steps keep
    /// their application order; consecutive steps sharing an effective
    /// version form one stage, so stage versions never decrease.
    pub fn plan(&self, document: &str, from_version: u32) -> Result<MigrationPlan, HistoryError> {
        if self.declared_at(document).is_none() {
            return Err(HistoryError::UnknownDocument {
                document: document.to_string(),
            });
        }
        if from_version > self.current_version {
            return Err(HistoryError::FutureVersion {
                found: from_version,
                current: self.current_version,
            });
        }

        let mut stages: Vec<PlanStage> = Vec::new();
        for (version, step) in self.effective_for_document(document) {
            if version <= from_version {
                continue;
            }
            let Some(op) = op_for(&step.command) else {
                continue;
            };
            match stages.last_mut() {
                Some(stage) if stage.version == version => stage.ops.push(op),
                _ => stages.push(PlanStage {
                    version,
                    ops: vec![op],
                }),
            }
        }

        Ok(MigrationPlan {
            document: document.to_string(),
            from_version,
            to_version: self.current_version,
            stages,
        })
    }
}

fn op_for(command: &SchemaCommand) -> Option<MigrationOp> {
    match command {
        SchemaCommand::NewDocument { .. } => None,
        SchemaCommand::AddField {
            field_name,
            field_type,
            default_value,
            ..
        } => Some(MigrationOp::AddField {
            name: field_name.clone(),
            field_type: *field_type,
            default_value: default_value.clone(),
        }),
        SchemaCommand::RemoveField { field_name, .. } => Some(MigrationOp::RemoveField {
            name: field_name.clone(),
        }),
        SchemaCommand::RenameField {
            old_field_name,
            new_field_name,
            ..
        } => Some(MigrationOp::RenameField {
            from: old_field_name.clone(),
            to: new_field_name.clone(),
        }),
        SchemaCommand::ChangeType {
            field_name,
            new_type,
            migration_function,
            ..
        } => Some(MigrationOp::ChangeType {
            name: field_name.clone(),
            new_type: *new_type,
            migration_function: migration_function.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VersionPolicy;
    use crate::model::FieldDefinition;
    use crate::SchemaEvolution;

    fn schema() -> crate::FinalSchema {
        let mut evolution = SchemaEvolution::new();
        evolution
            .apply_all(vec![
                SchemaCommand::new_document(
                    "User",
                    vec![
                        FieldDefinition::new("id", FieldType::String),
                        FieldDefinition::new("createdAt", FieldType::Number),
                    ],
                    1,
                ),
                SchemaCommand::new_document("Order", vec![FieldDefinition::new("id", FieldType::String)], 1),
                SchemaCommand::add_field("User", "name", FieldType::String, Some("\"\"".into()), 2),
                SchemaCommand::rename_field("User", "name", "displayName", 2),
                SchemaCommand::add_field("Order", "total", FieldType::Number, Some("0".into()), 3),
                SchemaCommand::change_type(
                    "User",
                    "createdAt",
                    FieldType::String,
                    "new Date(value).toISOString()",
                    4,
                ),
            ])
            .unwrap();
        evolution.resolve()
    }

    #[test]
    fn test_for_document_filters() {
        let schema = schema();
        let history = schema.history();
        assert_eq!(history.len(), 6);
        assert_eq!(history.for_document("Order").count(), 2);
        assert_eq!(history.for_document("User").count(), 4);
        assert_eq!(history.declared_at("Order"), Some(1));
        assert_eq!(history.declared_at("Invoice"), None);
    }

    #[test]
    fn test_plan_from_declaration() {
        let schema = schema();
        let plan = schema.history().plan("User", 1).unwrap();
        assert_eq!(plan.to_version, 4);
        assert_eq!(plan.stages.len(), 2);
        assert_eq!(plan.stages[0].version, 2);
        assert_eq!(
            plan.stages[0].ops,
            vec![
                MigrationOp::AddField {
                    name: "name".into(),
                    field_type: FieldType::String,
                    default_value: Some("\"\"".into()),
                },
                MigrationOp::RenameField {
                    from: "name".into(),
                    to: "displayName".into(),
                },
            ]
        );
        assert_eq!(
            plan.stages[1].ops,
            vec![MigrationOp::ChangeType {
                name: "createdAt".into(),
                new_type: FieldType::String,
                migration_function: "new Date(value).toISOString()".into(),
            }]
        );
    }

    #[test]
    fn test_plan_skips_applied_versions() {
        let schema = schema();
        let plan = schema.history().plan("User", 2).unwrap();
        assert_eq!(plan.ops().count(), 1);

        let plan = schema.history().plan("User", 4).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_errors() {
        let schema = schema();
        assert_eq!(
            schema.history().plan("Invoice", 1),
            Err(HistoryError::UnknownDocument {
                document: "Invoice".into()
            })
        );
        assert_eq!(
            schema.history().plan("User", 9),
            Err(HistoryError::FutureVersion { found: 9, current: 4 })
        );
    }

    #[test]
    fn test_commands_replay_round_trip() {
        let schema = schema();
        let mut replayed = SchemaEvolution::new();
        replayed.apply_all(schema.history().commands()).unwrap();
        assert_eq!(replayed.resolve(), schema);
    }

    fn lenient_schema() -> crate::FinalSchema {
        let mut evolution = SchemaEvolution::with_policy(VersionPolicy::Lenient);
        evolution
            .apply_all(vec![
                SchemaCommand::new_document(
                    "Note",
                    vec![
                        FieldDefinition::new("id", FieldType::String),
                        FieldDefinition::new("body", FieldType::String),
                    ],
                    1,
                ),
                SchemaCommand::add_field("Note", "pinned", FieldType::Boolean, Some("false".into()), 5),
                SchemaCommand::remove_field("Note", "body", 2),
            ])
            .unwrap();
        evolution.resolve()
    }

    #[test]
    fn test_lower_stamp_takes_effect_at_applied_version() {
        let schema = lenient_schema();
        let effective: Vec<u32> = schema
            .history()
            .effective_for_document("Note")
            .map(|(version, _)| version)
            .collect();
        assert_eq!(effective, vec![1, 5, 5]);

        let plan = schema.history().plan("Note", 1).unwrap();
        assert_eq!(plan.stages.len(), 1);
        assert_eq!(plan.stages[0].version, 5);
        assert_eq!(plan.stages[0].ops.len(), 2);
    }

    #[test]
    fn test_lower_stamp_not_skipped_for_later_records() {
        // A record stored at v3 predates the removal, which was applied after v5.
        let plan = lenient_schema().history().plan("Note", 3).unwrap();
        assert_eq!(
            plan.ops().last(),
            Some(&MigrationOp::RemoveField { name: "body".into() })
        );
    }
}
