// error.rs — Error types for the policy subsystem.

use thiserror::Error;

/// Errors that can occur during policy operations.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Failed to read a policy or capability file from disk.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailed {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    /// A policy or capability document could not be parsed.
    #[error("malformed policy document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A capability-family pattern is not a valid glob.
    #[error("invalid capability pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A confirmation pattern is not a valid regex.
    #[error("invalid confirmation pattern '{pattern}': {reason}")]
    InvalidConfirmPattern { pattern: String, reason: String },
}
