//! Error types for the tightening analyzer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetLintError {
    /// The linter was configured without a target interface name.
    #[error("no target interface name set")]
    NoTarget,

    /// A configured type name failed to resolve.
    #[error(transparent)]
    Resolve(#[from] warden_ir::IrError),

    /// The per-function analyzer panicked; recovered at the function
    /// boundary with the function's qualified name attached.
    #[error("analysis of {function} panicked: {message}")]
    AnalysisPanic { function: String, message: String },
}
