//! Schema mutation commands.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::field::{FieldDefinition, FieldType};

/// A single schema mutation, stamped with the version at which it takes effect.
///
/// Commands are plain values. Whether a command makes sense is only decided
/// when the engine applies it against the current document state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SchemaCommand {
    /// First declaration of a document with its initial fields.
    NewDocument {
        document_name: String,
        fields: Vec<FieldDefinition>,
        version: u32,
    },

    AddField {
        document_name: String,
        field_name: String,
        field_type: FieldType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_value: Option<String>,
        version: u32,
    },

    RemoveField {
        document_name: String,
        field_name: String,
        version: u32,
    },

    RenameField {
        document_name: String,
        old_field_name: String,
        new_field_name: String,
        version: u32,
    },

    /// Retypes a field. `migration_function` is an opaque `value -> newValue`
    /// expression handed to generated migrations as-is.
    ChangeType {
        document_name: String,
        field_name: String,
        new_type: FieldType,
        migration_function: String,
        version: u32,
    },
}

/// Discriminant of a [`SchemaCommand`], used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandKind {
    NewDocument,
    AddField,
    RemoveField,
    RenameField,
    ChangeType,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::NewDocument => "NewDocument",
            CommandKind::AddField => "AddField",
            CommandKind::RemoveField => "RemoveField",
            CommandKind::RenameField => "RenameField",
            CommandKind::ChangeType => "ChangeType",
        };
        f.write_str(name)
    }
}

impl SchemaCommand {
    pub fn new_document(
        document_name: impl Into<String>,
        fields: Vec<FieldDefinition>,
        version: u32,
    ) -> Self {
        Self::NewDocument {
            document_name: document_name.into(),
            fields,
            version,
        }
    }

    pub fn add_field(
        document_name: impl Into<String>,
        field_name: impl Into<String>,
        field_type: FieldType,
        default_value: Option<String>,
        version: u32,
    ) -> Self {
        Self::AddField {
            document_name: document_name.into(),
            field_name: field_name.into(),
            field_type,
            default_value,
            version,
        }
    }

    pub fn remove_field(
        document_name: impl Into<String>,
        field_name: impl Into<String>,
        version: u32,
    ) -> Self {
        Self::RemoveField {
            document_name: document_name.into(),
            field_name: field_name.into(),
            version,
        }
    }

    pub fn rename_field(
        document_name: impl Into<String>,
        old_field_name: impl Into<String>,
        new_field_name: impl Into<String>,
        version: u32,
    ) -> Self {
        Self::RenameField {
            document_name: document_name.into(),
            old_field_name: old_field_name.into(),
            new_field_name: new_field_name.into(),
            version,
        }
    }

    pub fn change_type(
        document_name: impl Into<String>,
        field_name: impl Into<String>,
        new_type: FieldType,
        migration_function: impl Into<String>,
        version: u32,
    ) -> Self {
        Self::ChangeType {
            document_name: document_name.into(),
            field_name: field_name.into(),
            new_type,
            migration_function: migration_function.into(),
            version,
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::NewDocument { .. } => CommandKind::NewDocument,
            Self::AddField { .. } => CommandKind::AddField,
            Self::RemoveField { .. } => CommandKind::RemoveField,
            Self::RenameField { .. } => CommandKind::RenameField,
            Self::ChangeType { .. } => CommandKind::ChangeType,
        }
    }

    /// Name of the document this command targets.
    pub fn document_name(&self) -> &str {
        match self {
            Self::NewDocument { document_name, .. }
            | Self::AddField { document_name, .. }
            | Self::RemoveField { document_name, .. }
            | Self::RenameField { document_name, .. }
            | Self::ChangeType { document_name, .. } => document_name,
        }
    }

    pub fn version(&self) -> u32 {
        match self {
            Self::NewDocument { version, .. }
            | Self::AddField { version, .. }
            | Self::RemoveField { version, .. }
            | Self::RenameField { version, .. }
            | Self::ChangeType { version, .. } => *version,
        }
    }

    /// The field the command operates on. For renames this is the old name.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::NewDocument { .. } => None,
            Self::AddField { field_name, .. }
            | Self::RemoveField { field_name, .. }
            | Self::ChangeType { field_name, .. } => Some(field_name),
            Self::RenameField { old_field_name, .. } => Some(old_field_name),
        }
    }

    /// Deterministic human-readable rendering, used as the migration step description.
    pub fn describe(&self) -> String {
        match self {
            Self::NewDocument {
                document_name,
                fields,
                ..
            } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{}:{}", f.name, f.field_type))
                    .collect();
                format!(
                    "create document {} with fields [{}]",
                    document_name,
                    fields.join(", ")
                )
            }
            Self::AddField {
                document_name,
                field_name,
                field_type,
                default_value,
                ..
            } => {
                let default = default_value
                    .as_ref()
                    .map(|d| format!(" (default: {})", d))
                    .unwrap_or_default();
                format!(
                    "add field {}:{} to document {}{}",
                    field_name, field_type, document_name, default
                )
            }
            Self::RemoveField {
                document_name,
                field_name,
                ..
            } => format!("remove field {} from document {}", field_name, document_name),
            Self::RenameField {
                document_name,
                old_field_name,
                new_field_name,
                ..
            } => format!(
                "rename field {} to {} in document {}",
                old_field_name, new_field_name, document_name
            ),
            Self::ChangeType {
                document_name,
                field_name,
                new_type,
                ..
            } => format!(
                "change type of field {} to {} in document {}",
                field_name, new_type, document_name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let cmd = SchemaCommand::new_document(
            "User",
            vec![
                FieldDefinition::new("id", FieldType::String),
                FieldDefinition::new("email", FieldType::String),
            ],
            1,
        );
        assert_eq!(
            cmd.describe(),
            "create document User with fields [id:string, email:string]"
        );

        let cmd = SchemaCommand::add_field("User", "name", FieldType::String, Some("\"\"".into()), 2);
        assert_eq!(cmd.describe(), "add field name:string to document User (default: \"\")");

        let cmd = SchemaCommand::remove_field("User", "email", 3);
        assert_eq!(cmd.describe(), "remove field email from document User");

        let cmd = SchemaCommand::rename_field("User", "name", "fullName", 4);
        assert_eq!(cmd.describe(), "rename field name to fullName in document User");

        let cmd = SchemaCommand::change_type("User", "createdAt", FieldType::String, "String(value)", 5);
        assert_eq!(
            cmd.describe(),
            "change type of field createdAt to string in document User"
        );
    }

    #[test]
    fn test_accessors() {
        let cmd = SchemaCommand::rename_field("Order", "total", "amount", 7);
        assert_eq!(cmd.kind(), CommandKind::RenameField);
        assert_eq!(cmd.document_name(), "Order");
        assert_eq!(cmd.field_name(), Some("total"));
        assert_eq!(cmd.version(), 7);
        assert_eq!(cmd.kind().to_string(), "RenameField");
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "kind": "changeType",
            "documentName": "User",
            "fieldName": "createdAt",
            "newType": "string",
            "migrationFunction": "new Date(value).toISOString()",
            "version": 5
        }"#;
        let cmd: SchemaCommand = serde_json::from_str(json).unwrap();
        assert_eq!(
            cmd,
            SchemaCommand::change_type(
                "User",
                "createdAt",
                FieldType::String,
                "new Date(value).toISOString()",
                5
            )
        );

        let add = serde_json::to_value(SchemaCommand::add_field("User", "age", FieldType::Number, None, 2)).unwrap();
        assert_eq!(add["kind"], "addField");
        assert_eq!(add["fieldType"], "number");
        assert!(add.get("defaultValue").is_none());
    }
}
