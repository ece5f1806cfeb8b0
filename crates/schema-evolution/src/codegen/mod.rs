//! TypeScript code generation from a resolved schema.
//!
//! Only record migrations are generated here. Typed document structures are
//! left to downstream generators that consume the [`FinalSchema`] directly.

mod names;
mod upcast;

use std::path::Path;

use tracing::info;

use crate::diagnostic::SchemaError;
use crate::resolve::FinalSchema;

pub use names::{to_camel_case, to_pascal_case, to_snake_case};
pub use upcast::UpcastGenerator;

/// Generated TypeScript code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    /// Map of filename to content.
    pub files: Vec<(String, String)>,
}

impl GeneratedCode {
    /// Writes every file below `out_dir`, creating directories as needed.
    pub fn write_to(&self, out_dir: &Path) -> Result<(), SchemaError> {
        std::fs::create_dir_all(out_dir).map_err(|e| SchemaError::io(out_dir, e.to_string()))?;

        for (filename, content) in &self.files {
            let path = out_dir.join(filename);
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| SchemaError::io(parent, e.to_string()))?;
            }
            std::fs::write(&path, content).map_err(|e| SchemaError::io(&path, e.to_string()))?;
        }

        info!(dir = %out_dir.display(), files = self.files.len(), "wrote generated migrations");
        Ok(())
    }
}

/// Generates record migration modules for every document in the schema.
pub fn generate(schema: &FinalSchema) -> Result<GeneratedCode, SchemaError> {
    let files = UpcastGenerator::generate_all(schema)?;
    Ok(GeneratedCode { files })
}
