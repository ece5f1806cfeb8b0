//! Field and document definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of field types a document field can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "string-array")]
    StringArray,
    #[serde(rename = "number-array")]
    NumberArray,
    #[serde(rename = "object")]
    Object,
}

impl FieldType {
    /// Every field type, in declaration order.
    pub const ALL: [FieldType; 6] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::StringArray,
        FieldType::NumberArray,
        FieldType::Object,
    ];

    /// The canonical spelling used in command scripts and history artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::StringArray => "string-array",
            FieldType::NumberArray => "number-array",
            FieldType::Object => "object",
        }
    }

    /// TypeScript type used by generated migration modules.
    pub fn ts_type(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::StringArray => "string[]",
            FieldType::NumberArray => "number[]",
            FieldType::Object => "Record<string, unknown>",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the known field type spellings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field type '{0}' (expected one of: string, number, boolean, string-array, number-array, object)")]
pub struct ParseFieldTypeError(pub String);

impl FromStr for FieldType {
    type Err = ParseFieldTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseFieldTypeError(s.to_string()))
    }
}

/// A single named field of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Serialized default expression, passed through to generators verbatim.
    /// `None` means the field is required.
    #[serde(rename = "defaultValue", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl FieldDefinition {
    /// A required field with no default.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default_value: None,
        }
    }

    /// A field carrying a default expression.
    pub fn with_default(
        name: impl Into<String>,
        field_type: FieldType,
        default_value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            default_value: Some(default_value.into()),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default_value.is_none()
    }
}

/// A named document and its ordered fields.
///
/// Field order is declaration order and is significant for generated layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    /// Version at which the document was first declared.
    pub version: u32,
}

impl DocumentDefinition {
    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of a field in declaration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}
