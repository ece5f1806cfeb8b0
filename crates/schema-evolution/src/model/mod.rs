//! Type and command vocabulary.
//!
//! Pure data: field types, field and document definitions, and the
//! [`SchemaCommand`] sum type. Nothing here validates anything; that is the
//! engine's job.

mod command;
mod field;

pub use command::{CommandKind, SchemaCommand};
pub use field::{DocumentDefinition, FieldDefinition, FieldType, ParseFieldTypeError};
