//! Record migration (upcast) code generation.
//!
//! For each document, generates a TypeScript module with one function per
//! version stage of its migration plan plus an entry point that walks a stored
//! record from its recorded version up to the current one. Change-type
//! migration functions are inlined verbatim as `(value) => expr`.

use std::collections::HashMap;

use crate::diagnostic::{HistoryError, SchemaError};
use crate::history::{MigrationOp, MigrationPlan};
use crate::resolve::FinalSchema;

use super::names::{string_literal, to_camel_case, to_pascal_case, to_snake_case};

/// Generator for record migration TypeScript code.
pub struct UpcastGenerator;

impl UpcastGenerator {
    /// Generate the migration module for one document.
    ///
    /// Returns the content of the module file.
    pub fn generate_module(schema: &FinalSchema, document: &str) -> Result<String, HistoryError> {
        let history = schema.history();
        let declared = history
            .declared_at(document)
            .ok_or_else(|| HistoryError::UnknownDocument {
                document: document.to_string(),
            })?;
        let plan = history.plan(document, declared)?;

        let type_name = to_pascal_case(document);
        let record_type = format!("{}Record", type_name);
        let mut code = String::new();

        // Module header
        code.push_str(&format!(
            r#"/**
 * Auto-generated record migrations for {} document.
 * DO NOT EDIT - regenerate from the schema history
 */

export type {} = Record<string, unknown>;

"#,
            document, record_type
        ));

        let mut registry_entries = Vec::new();
        let mut from_version = plan.from_version;

        for stage in &plan.stages {
            let func_name = format!(
                "migrate{}_v{}_to_v{}",
                type_name, from_version, stage.version
            );

            let lines: Vec<String> = stage.ops.iter().map(render_op).collect();

            code.push_str(&format!(
                r#"// Version {} -> Version {} for {}
export function {}(record: {}): {} {{
  const next: {} = {{ ...record }};
{}
  return next;
}}

"#,
                from_version,
                stage.version,
                document,
                func_name,
                record_type,
                record_type,
                record_type,
                lines.join("\n")
            ));

            registry_entries.push((stage.version, func_name));
            from_version = stage.version;
        }

        code.push_str(&Self::generate_entry_point(&plan, &type_name, &registry_entries));
        Ok(code)
    }

    /// Generate migration modules for every document, plus an index.
    ///
    /// Fails when two documents map to the same module file or the same
    /// exported identifiers.
    pub fn generate_all(schema: &FinalSchema) -> Result<Vec<(String, String)>, SchemaError> {
        let mut files = Vec::new();
        let mut exports = Vec::new();
        let mut claimed: HashMap<String, &str> = HashMap::new();

        for doc in schema.documents() {
            let module = format!("{}.migrations", to_snake_case(&doc.name));
            for key in [module.clone(), to_pascal_case(&doc.name)] {
                if let Some(first) = claimed.insert(key, &doc.name) {
                    return Err(SchemaError::ModuleCollision {
                        module: format!("{}.ts", module),
                        first: first.to_string(),
                        second: doc.name.clone(),
                    });
                }
            }
            files.push((format!("{}.ts", module), Self::generate_module(schema, &doc.name)?));
            exports.push(format!("export * from './{}';", module));
        }

        let mut index = String::from(
            "/**\n * Auto-generated record migrations index.\n * DO NOT EDIT - regenerate from the schema history\n */\n\n",
        );
        index.push_str(&exports.join("\n"));
        index.push('\n');
        files.push(("index.ts".to_string(), index));

        Ok(files)
    }

    fn generate_entry_point(
        plan: &MigrationPlan,
        type_name: &str,
        registry_entries: &[(u32, String)],
    ) -> String {
        let record_type = format!("{}Record", type_name);
        let registry_name = format!("{}Migrations", to_camel_case(type_name));
        let version_const = format!("{}_SCHEMA_VERSION", to_snake_case(type_name).to_uppercase());

        let entries: Vec<String> = registry_entries
            .iter()
            .map(|(version, func)| format!("  {{ version: {}, migrate: {} }},", version, func))
            .collect();

        format!(
            r#"export const {} = {};

const {}: Array<{{ version: number; migrate: (record: {}) => {} }}> = [
{}
];

/**
 * Bring a stored {} record up to the current schema version.
 *
 * @param record - The raw record from storage
 * @param storedVersion - The schema version the record was written with
 * @returns The record in the current schema shape
 */
export function migrate{}Record(record: {}, storedVersion: number): {} {{
  let current = record;
  for (const step of {}) {{
    if (step.version > storedVersion) {{
      current = step.migrate(current);
    }}
  }}
  return current;
}}
"#,
            version_const,
            plan.to_version,
            registry_name,
            record_type,
            record_type,
            entries.join("\n"),
            plan.document,
            type_name,
            record_type,
            record_type,
            registry_name,
        )
    }
}

/// One statement (or comment) applying an op to `next`.
fn render_op(op: &MigrationOp) -> String {
    match op {
        MigrationOp::AddField {
            name,
            field_type,
            default_value,
        } => match default_value {
            Some(default) => format!(
                "  next[{}] = {};  // add field {}:{}",
                string_literal(name),
                default,
                name,
                field_type.ts_type()
            ),
            None => format!(
                "  // add field {}:{} (required, no default; left unset)",
                name,
                field_type.ts_type()
            ),
        },
        MigrationOp::RemoveField { name } => {
            format!("  delete next[{}];  // remove field {}", string_literal(name), name)
        }
        MigrationOp::RenameField { from, to } => format!(
            "  next[{}] = next[{}];\n  delete next[{}];  // rename field {} -> {}",
            string_literal(to),
            string_literal(from),
            string_literal(from),
            from,
            to
        ),
        MigrationOp::ChangeType {
            name,
            new_type,
            migration_function,
        } => format!(
            "  next[{}] = ((value: any) => ({}))(next[{}]);  // change type of {} to {}",
            string_literal(name),
            migration_function,
            string_literal(name),
            name,
            new_type.ts_type()
        ),
    }
}
