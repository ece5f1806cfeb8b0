//! Command scripts: the JSON form of a command sequence.
//!
//! Either a bare array of commands or `{ "commands": [...] }`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostic::SchemaError;
use crate::model::SchemaCommand;

/// An ordered command sequence loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CommandScript {
    pub commands: Vec<SchemaCommand>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptRepr {
    Bare(Vec<SchemaCommand>),
    Wrapped { commands: Vec<SchemaCommand> },
}

impl CommandScript {
    pub fn new(commands: Vec<SchemaCommand>) -> Self {
        Self { commands }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        let repr: ScriptRepr = serde_json::from_str(json).map_err(|e| SchemaError::InvalidScript {
            message: e.to_string(),
        })?;
        let commands = match repr {
            ScriptRepr::Bare(commands) | ScriptRepr::Wrapped { commands } => commands,
        };
        Ok(Self { commands })
    }

    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SchemaError::io(path, e.to_string()))?;
        Self::from_json_str(&content)
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        serde_json::to_string_pretty(self).map_err(|e| SchemaError::InvalidScript {
            message: e.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl IntoIterator for CommandScript {
    type Item = SchemaCommand;
    type IntoIter = std::vec::IntoIter<SchemaCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommandKind, FieldType};

    const SCRIPT: &str = r#"[
        { "kind": "newDocument", "documentName": "User", "version": 1,
          "fields": [ { "name": "id", "type": "string" } ] },
        { "kind": "addField", "documentName": "User", "fieldName": "tags",
          "fieldType": "string-array", "defaultValue": "[]", "version": 2 }
    ]"#;

    #[test]
    fn test_bare_array() {
        let script = CommandScript::from_json_str(SCRIPT).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.commands[1].kind(), CommandKind::AddField);
    }

    #[test]
    fn test_wrapped_object() {
        let wrapped = format!("{{ \"commands\": {} }}", SCRIPT);
        let script = CommandScript::from_json_str(&wrapped).unwrap();
        assert_eq!(script, CommandScript::from_json_str(SCRIPT).unwrap());
    }

    #[test]
    fn test_to_json_reloads() {
        let script = CommandScript::new(vec![SchemaCommand::add_field(
            "User",
            "score",
            FieldType::Number,
            Some("0".into()),
            3,
        )]);
        assert_eq!(CommandScript::from_json_str(&script.to_json().unwrap()).unwrap(), script);
    }

    #[test]
    fn test_unknown_field_type_rejected() {
        let json = r#"[{ "kind": "addField", "documentName": "User", "fieldName": "at",
                         "fieldType": "date", "version": 2 }]"#;
        assert!(matches!(
            CommandScript::from_json_str(json),
            Err(SchemaError::InvalidScript { .. })
        ));
    }
}
