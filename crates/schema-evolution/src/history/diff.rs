//! Schema diff between two resolved schemas.
//!
//! Compares a previously persisted schema against a freshly resolved one,
//! typically the artifact from the last build against the current replay.
//! Changes are classified as:
//!
//! - **Non-breaking**: stored records keep working (e.g. adding a field with a default)
//! - **Breaking**: consumers of the old shape need the migration chain (e.g. removing fields, changing types)
//!
//! Renames recorded in the current history after the previous schema's
//! version are reported as renames rather than a remove/add pair.

use std::collections::HashMap;

use crate::model::{DocumentDefinition, FieldDefinition, FieldType, SchemaCommand};
use crate::resolve::FinalSchema;

/// A change to a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    /// A new field was added.
    Added { name: String, field: FieldDefinition },

    /// A field was removed.
    Removed { name: String, field: FieldDefinition },

    /// A field was renamed through the history.
    Renamed { from: String, to: String },

    /// A field's type changed.
    TypeChanged {
        name: String,
        old_type: FieldType,
        new_type: FieldType,
    },

    /// A field's default expression changed.
    DefaultChanged {
        name: String,
        old_default: Option<String>,
        new_default: Option<String>,
    },
}

impl FieldChange {
    /// Whether this change is breaking.
    pub fn is_breaking(&self) -> bool {
        match self {
            // Adding a required field is breaking
            FieldChange::Added { field, .. } => field.is_required(),
            FieldChange::Removed { .. } => true,
            FieldChange::Renamed { .. } => false,
            FieldChange::TypeChanged { .. } => true,
            // Dropping the default makes the field required
            FieldChange::DefaultChanged { new_default, .. } => new_default.is_none(),
        }
    }
}

/// Whether a document still exists in the current schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Modified,
    Removed,
}

/// Diff result for a single document.
#[derive(Debug, Clone)]
pub struct SchemaDiff {
    pub document: String,
    pub status: DocumentStatus,
    pub changes: Vec<FieldChange>,
}

impl SchemaDiff {
    /// Whether this diff contains any breaking changes.
    pub fn is_breaking(&self) -> bool {
        self.status == DocumentStatus::Removed || self.changes.iter().any(|c| c.is_breaking())
    }

    /// Format the diff for display.
    pub fn format_changes(&self) -> String {
        if self.status == DocumentStatus::Removed {
            return format!("  - Document '{}' removed (BREAKING)", self.document);
        }

        let mut lines = Vec::new();

        for change in &self.changes {
            let desc = match change {
                FieldChange::Added { name, field } => {
                    let default = field
                        .default_value
                        .as_ref()
                        .map(|d| format!(" = {}", d))
                        .unwrap_or_default();
                    format!("+ Field '{}': {}{}", name, field.field_type, default)
                }
                FieldChange::Removed { name, .. } => format!("- Field '{}' removed", name),
                FieldChange::Renamed { from, to } => {
                    format!("~ Field '{}' renamed to '{}'", from, to)
                }
                FieldChange::TypeChanged {
                    name,
                    old_type,
                    new_type,
                } => format!("~ Field '{}' type changed: {} -> {}", name, old_type, new_type),
                FieldChange::DefaultChanged {
                    name,
                    old_default,
                    new_default,
                } => format!(
                    "~ Field '{}' default changed: {} -> {}",
                    name,
                    old_default.as_deref().unwrap_or("(none)"),
                    new_default.as_deref().unwrap_or("(none)")
                ),
            };

            let marker = if change.is_breaking() { "(BREAKING)" } else { "(OK)" };
            lines.push(format!("  {} {}", desc, marker));
        }

        lines.join("\n")
    }
}

/// Compare two resolved schemas.
///
/// Returns one diff per changed or removed document, in the previous
/// schema's declaration order. New documents are not reported; nothing
/// stored can depend on them yet.
pub fn diff_schemas(previous: &FinalSchema, current: &FinalSchema) -> Vec<SchemaDiff> {
    let mut diffs = Vec::new();

    for locked in previous.documents() {
        let Some(doc) = current.document(&locked.name) else {
            diffs.push(SchemaDiff {
                document: locked.name.clone(),
                status: DocumentStatus::Removed,
                changes: Vec::new(),
            });
            continue;
        };

        let renames = renames_since(current, &locked.name, previous.current_version());
        let changes = diff_documents(locked, doc, &renames);

        if !changes.is_empty() {
            diffs.push(SchemaDiff {
                document: locked.name.clone(),
                status: DocumentStatus::Modified,
                changes,
            });
        }
    }

    diffs
}

/// Maps each old field name to its final name after renames taking effect later
/// than `since`.
fn renames_since(schema: &FinalSchema, document: &str, since: u32) -> HashMap<String, String> {
    // final name -> original name, so chained renames collapse
    let mut origin: HashMap<String, String> = HashMap::new();

    for (version, step) in schema.history().effective_for_document(document) {
        if version <= since {
            continue;
        }
        if let SchemaCommand::RenameField {
            old_field_name,
            new_field_name,
            ..
        } = &step.command
        {
            let first = origin
                .remove(old_field_name)
                .unwrap_or_else(|| old_field_name.clone());
            origin.insert(new_field_name.clone(), first);
        }
    }

    origin.into_iter().map(|(to, from)| (from, to)).collect()
}

fn diff_documents(
    locked: &DocumentDefinition,
    current: &DocumentDefinition,
    renames: &HashMap<String, String>,
) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let mut matched: Vec<&str> = Vec::new();

    // Check for removed, renamed or changed fields
    for old in &locked.fields {
        let current_name = renames.get(&old.name).unwrap_or(&old.name);
        let Some(new) = current.field(current_name) else {
            changes.push(FieldChange::Removed {
                name: old.name.clone(),
                field: old.clone(),
            });
            continue;
        };
        matched.push(new.name.as_str());

        if current_name != &old.name {
            changes.push(FieldChange::Renamed {
                from: old.name.clone(),
                to: current_name.clone(),
            });
        }
        if old.field_type != new.field_type {
            changes.push(FieldChange::TypeChanged {
                name: new.name.clone(),
                old_type: old.field_type,
                new_type: new.field_type,
            });
        } else if old.default_value != new.default_value {
            changes.push(FieldChange::DefaultChanged {
                name: new.name.clone(),
                old_default: old.default_value.clone(),
                new_default: new.default_value.clone(),
            });
        }
    }

    // Check for added fields
    for field in &current.fields {
        if !matched.contains(&field.name.as_str()) {
            changes.push(FieldChange::Added {
                name: field.name.clone(),
                field: field.clone(),
            });
        }
    }

    changes
}
