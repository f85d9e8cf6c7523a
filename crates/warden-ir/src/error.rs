//! Error types for the program model.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IrError {
    /// A dotted or bare type name did not resolve to any declared type.
    #[error("unable to find type {name:?}")]
    UnknownType { name: String },

    /// A name resolved, but not to a named type.
    #[error("{name:?} was not a named type")]
    NotNamed { name: String },

    /// A program snapshot failed to parse.
    #[error("malformed program snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}
