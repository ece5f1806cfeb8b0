//! Diagnostic types for error reporting.

mod error;

pub use error::{EvolutionError, HistoryError, ReplayErrorKind, SchemaError};
