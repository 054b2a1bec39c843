// runner.rs — The action-execution seam.
//
// Concrete executors (message senders, calendar backends, search clients,
// record stores) live outside the core. The core only sees this trait and
// the raw result shape. The core never retries; idempotency and retry
// policy belong to the integration layer behind the trait.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors an action runner may surface to the core.
///
/// The Executor converts every one of these into a failed outcome; they
/// never propagate past it.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The runner does not know the requested action.
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    /// The external subsystem rejected or failed the call.
    #[error("action '{action}' failed: {message}")]
    ExecutionFailed { action: String, message: String },

    /// The external subsystem could not be reached.
    #[error("action subsystem unavailable: {0}")]
    Unavailable(String),
}

/// The raw result of one external action call.
///
/// `data` is caller-opaque JSON; the core never interprets it beyond the
/// deterministic evidence extraction rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the external subsystem reports success.
    pub success: bool,
    /// Opaque result payload.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Error message when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    /// A successful result carrying a payload.
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    /// A failed result carrying an error message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }
}

/// Pluggable executor for external actions.
///
/// Implementations may block on network I/O; the pipeline bounds each call
/// with a timeout and treats overruns as failures. `Send + Sync` because
/// the Executor dispatches calls from a worker thread.
pub trait ActionRunner: Send + Sync {
    /// Run one action on behalf of an actor and return the raw result.
    ///
    /// A returned `Err` and an `Ok` with `success = false` are equivalent
    /// to the core: both become a failed outcome.
    fn run_action(
        &self,
        actor_id: &str,
        action: &str,
        args: &serde_json::Value,
    ) -> Result<ActionResult, ActionError>;
}
