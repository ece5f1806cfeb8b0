//! Property-based tests for schema replay.
//!
//! Command sequences are generated from abstract intents resolved against a
//! simulated document state, so every generated sequence is valid:
//! - resolve is idempotent
//! - field names stay unique after every command
//! - currentVersion is the highest applied version
//! - the history replays to an equal schema and plans every structural change

use std::collections::BTreeSet;

use proptest::prelude::*;
use schema_evolution::{
    replay, FieldDefinition, FieldType, MigrationOp, SchemaCommand, SchemaEvolution,
};

const DOCUMENTS: [&str; 3] = ["User", "Order", "Tag"];
const FIELDS: [&str; 8] = ["id", "name", "email", "score", "tags", "createdAt", "meta", "total"];

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

#[derive(Debug, Clone)]
enum Intent {
    Declare(u8),
    Add(u8, u8, u8),
    Remove(u8, u8),
    Rename(u8, u8, u8),
    Retype(u8, u8, u8),
}

fn intent_strategy() -> impl Strategy<Value = Intent> {
    prop_oneof![
        1 => any::<u8>().prop_map(Intent::Declare),
        3 => (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(d, f, t)| Intent::Add(d, f, t)),
        2 => (any::<u8>(), any::<u8>()).prop_map(|(d, f)| Intent::Remove(d, f)),
        2 => (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(d, f, g)| Intent::Rename(d, f, g)),
        2 => (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(d, f, t)| Intent::Retype(d, f, t)),
    ]
}

fn field_type(t: u8) -> FieldType {
    FieldType::ALL[t as usize % FieldType::ALL.len()]
}

/// Turns intents into a valid command sequence, skipping intents that do not
/// fit the simulated state.
fn commands_from(intents: &[(Intent, bool)]) -> Vec<SchemaCommand> {
    let mut docs: Vec<(String, Vec<String>)> = Vec::new();
    let mut commands = Vec::new();
    let mut version = 1;
    // Commands after a declaration move to a later version so that a record
    // stored at the declaration version has exactly the initial fields.
    let mut after_declare = false;

    for (intent, bump) in intents {
        if *bump || after_declare {
            version += 1;
            after_declare = false;
        }

        let command = match intent {
            Intent::Declare(n) => {
                let name = DOCUMENTS[*n as usize % DOCUMENTS.len()];
                if docs.iter().any(|(d, _)| d == name) {
                    continue;
                }
                let initial: Vec<String> = FIELDS[..(*n as usize % 3) + 1]
                    .iter()
                    .map(|f| f.to_string())
                    .collect();
                let fields = initial
                    .iter()
                    .map(|f| FieldDefinition::new(f.as_str(), FieldType::String))
                    .collect();
                docs.push((name.to_string(), initial));
                after_declare = true;
                SchemaCommand::new_document(name, fields, version)
            }
            Intent::Add(d, f, t) => {
                let Some(i) = pick(&docs, *d) else { continue };
                let field = FIELDS[*f as usize % FIELDS.len()];
                if docs[i].1.iter().any(|existing| existing == field) {
                    continue;
                }
                docs[i].1.push(field.to_string());
                let default = (*t % 2 == 0).then(|| "null".to_string());
                SchemaCommand::add_field(docs[i].0.as_str(), field, field_type(*t), default, version)
            }
            Intent::Remove(d, f) => {
                let Some(i) = pick(&docs, *d) else { continue };
                if docs[i].1.is_empty() {
                    continue;
                }
                let at = *f as usize % docs[i].1.len();
                let field = docs[i].1.remove(at);
                SchemaCommand::remove_field(docs[i].0.as_str(), field, version)
            }
            Intent::Rename(d, f, g) => {
                let Some(i) = pick(&docs, *d) else { continue };
                if docs[i].1.is_empty() {
                    continue;
                }
                let to = FIELDS[*g as usize % FIELDS.len()];
                if docs[i].1.iter().any(|existing| existing == to) {
                    continue;
                }
                let at = *f as usize % docs[i].1.len();
                let from = std::mem::replace(&mut docs[i].1[at], to.to_string());
                SchemaCommand::rename_field(docs[i].0.as_str(), from, to, version)
            }
            Intent::Retype(d, f, t) => {
                let Some(i) = pick(&docs, *d) else { continue };
                if docs[i].1.is_empty() {
                    continue;
                }
                let field = docs[i].1[*f as usize % docs[i].1.len()].clone();
                SchemaCommand::change_type(docs[i].0.as_str(), field, field_type(*t), "value", version)
            }
        };
        commands.push(command);
    }

    commands
}

fn pick(docs: &[(String, Vec<String>)], d: u8) -> Option<usize> {
    if docs.is_empty() {
        None
    } else {
        Some(d as usize % docs.len())
    }
}

fn commands_strategy() -> impl Strategy<Value = Vec<SchemaCommand>> {
    prop::collection::vec((intent_strategy(), any::<bool>()), 0..40)
        .prop_map(|intents| commands_from(&intents))
}

// =============================================================================
// REPLAY PROPERTIES
// =============================================================================

proptest! {
    /// Resolving the same built state twice yields equal schemas.
    #[test]
    fn resolve_is_idempotent(commands in commands_strategy()) {
        let mut evolution = SchemaEvolution::new();
        evolution.apply_all(commands).unwrap();

        let first = evolution.clone().resolve();
        let second = evolution.resolve();
        prop_assert_eq!(first, second);
    }

    /// No document ever holds two fields with the same name.
    #[test]
    fn field_names_stay_unique(commands in commands_strategy()) {
        let mut evolution = SchemaEvolution::new();
        for command in commands {
            evolution.apply(command).unwrap();
            for doc in evolution.documents() {
                let names: BTreeSet<&str> = doc.field_names().into_iter().collect();
                prop_assert_eq!(names.len(), doc.fields.len());
            }
        }
    }

    /// currentVersion equals the highest version among applied commands.
    #[test]
    fn current_version_is_max(commands in commands_strategy()) {
        let expected = commands.iter().map(SchemaCommand::version).max().unwrap_or(0);
        let schema = replay(commands).unwrap();
        prop_assert_eq!(schema.current_version(), expected);
    }

    /// One migration step per command, in application order.
    #[test]
    fn migrations_mirror_commands(commands in commands_strategy()) {
        let schema = replay(commands.clone()).unwrap();
        prop_assert_eq!(schema.history().commands(), commands);
    }

    /// Replaying the recorded history reproduces the schema.
    #[test]
    fn history_replays_to_same_schema(commands in commands_strategy()) {
        let schema = replay(commands).unwrap();
        let again = replay(schema.history().commands()).unwrap();
        prop_assert_eq!(again, schema);
    }

    /// Applying the full plan to a freshly declared record yields the final
    /// field set of its document.
    #[test]
    fn plan_covers_structural_changes(commands in commands_strategy()) {
        let schema = replay(commands.clone()).unwrap();
        let history = schema.history();

        for doc in schema.documents() {
            let mut record: BTreeSet<String> = commands
                .iter()
                .find_map(|c| match c {
                    SchemaCommand::NewDocument { document_name, fields, .. }
                        if document_name == &doc.name =>
                    {
                        Some(fields.iter().map(|f| f.name.clone()).collect())
                    }
                    _ => None,
                })
                .unwrap();

            let declared = history.declared_at(&doc.name).unwrap();
            let plan = history.plan(&doc.name, declared).unwrap();
            for op in plan.ops() {
                match op {
                    MigrationOp::AddField { name, .. } => {
                        record.insert(name.clone());
                    }
                    MigrationOp::RemoveField { name } => {
                        record.remove(name);
                    }
                    MigrationOp::RenameField { from, to } => {
                        record.remove(from);
                        record.insert(to.clone());
                    }
                    MigrationOp::ChangeType { .. } => {}
                }
            }

            let expected: BTreeSet<String> = doc.fields.iter().map(|f| f.name.clone()).collect();
            prop_assert_eq!(record, expected);
        }
    }
}
