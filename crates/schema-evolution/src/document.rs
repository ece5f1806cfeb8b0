//! Per-document projection maintained during replay.
//!
//! Every operation validates before it mutates, so a rejected operation
//! leaves the projection exactly as it was.

use std::collections::HashSet;

use crate::diagnostic::ReplayErrorKind;
use crate::model::{DocumentDefinition, FieldDefinition, FieldType};

/// One document's current shape during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    definition: DocumentDefinition,
}

impl DocumentState {
    /// Creates a projection from an initial field list.
    ///
    /// Duplicate document names are caught by the engine, which owns the
    /// document collection. Here only the initial fields are checked.
    pub fn declare(
        name: &str,
        fields: Vec<FieldDefinition>,
        version: u32,
    ) -> Result<Self, ReplayErrorKind> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ReplayErrorKind::DuplicateField {
                    document: name.to_string(),
                    field: field.name.clone(),
                });
            }
        }

        Ok(Self {
            definition: DocumentDefinition {
                name: name.to_string(),
                fields,
                version,
            },
        })
    }

    pub fn definition(&self) -> &DocumentDefinition {
        &self.definition
    }

    pub fn into_definition(self) -> DocumentDefinition {
        self.definition
    }

    /// Appends a field at the end of the layout.
    pub fn add_field(
        &mut self,
        field_name: &str,
        field_type: FieldType,
        default_value: Option<String>,
    ) -> Result<(), ReplayErrorKind> {
        if self.definition.position(field_name).is_some() {
            return Err(self.duplicate(field_name));
        }
        self.definition.fields.push(FieldDefinition {
            name: field_name.to_string(),
            field_type,
            default_value,
        });
        Ok(())
    }

    /// Removes a field, keeping the order of the others.
    pub fn remove_field(&mut self, field_name: &str) -> Result<FieldDefinition, ReplayErrorKind> {
        let index = self.index_of(field_name)?;
        Ok(self.definition.fields.remove(index))
    }

    /// Renames in place; position, type and default are kept.
    pub fn rename_field(&mut self, old_name: &str, new_name: &str) -> Result<(), ReplayErrorKind> {
        let index = self.index_of(old_name)?;
        if self.definition.position(new_name).is_some() {
            return Err(self.duplicate(new_name));
        }
        self.definition.fields[index].name = new_name.to_string();
        Ok(())
    }

    /// Retypes a field and drops its default.
    ///
    /// The migration function is not applied here; it lives on in the
    /// migration history.
    pub fn change_type(&mut self, field_name: &str, new_type: FieldType) -> Result<(), ReplayErrorKind> {
        let index = self.index_of(field_name)?;
        let field = &mut self.definition.fields[index];
        field.field_type = new_type;
        field.default_value = None;
        Ok(())
    }

    fn index_of(&self, field_name: &str) -> Result<usize, ReplayErrorKind> {
        self.definition
            .position(field_name)
            .ok_or_else(|| ReplayErrorKind::UnknownField {
                document: self.definition.name.clone(),
                field: field_name.to_string(),
            })
    }

    fn duplicate(&self, field_name: &str) -> ReplayErrorKind {
        ReplayErrorKind::DuplicateField {
            document: self.definition.name.clone(),
            field: field_name.to_string(),
        }
    }
}
