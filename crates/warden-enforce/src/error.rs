//! Error types for the enforcement runtime.
//!
//! Everything here is fatal: the run aborts on the first occurrence.
//! Diagnostics produced by checkers are not errors; they flow through the
//! report collector instead.

use thiserror::Error;

use warden_ir::Position;

#[derive(Debug, Error)]
pub enum EnforceError {
    /// An annotation names a contract with no registered provider.
    #[error("{pos}: cannot find contract named {name}")]
    MissingProvider { pos: Position, name: String },

    /// The JSON payload on an annotation failed to decode into the checker.
    #[error("{pos}: {source}")]
    BadConfig {
        pos: Position,
        #[source]
        source: serde_json::Error,
    },

    /// A contract alias chain revisited a name.
    #[error("{pos}: detected recursive contract {name:?}")]
    AliasCycle { pos: Position, name: String },

    /// A checker returned an error; annotated with the target's position.
    #[error("{pos}: {message}")]
    Checker { pos: Position, message: String },

    /// A checker panicked; recovered at the dispatch boundary.
    #[error("contract {contract:?} panicked while enforcing {declaration}: {message}")]
    CheckerPanic {
        contract: String,
        declaration: String,
        message: String,
    },

    /// The run's cancellation token was observed set.
    #[error("run cancelled")]
    Cancelled,

    /// Worker pool construction failed.
    #[error("worker pool: {0}")]
    Pool(String),

    /// Surfaced from the source-loading collaborator.
    #[error(transparent)]
    Load(#[from] warden_ir::IrError),
}
