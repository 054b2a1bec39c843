// error.rs — Error types for the pipeline crate.

use thiserror::Error;

/// Errors a pipeline run can return to the caller.
///
/// Authorization and execution failures are not errors — they flow through
/// the pipeline as blocked verdicts with an explanation. Only requests the
/// pipeline refuses to start end up here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request text was empty; rejected before any plan is constructed.
    #[error("request text is empty")]
    EmptyInput,
}
