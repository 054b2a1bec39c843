// record.rs — The per-request audit record.
//
// One record per pipeline run, assembled by the Pipeline Coordinator and
// appended to the trail as a side effect of finishing the request. The
// record captures what was asked, what policy decided, what actually ran,
// and what the user was told — enough to reconstruct the run without the
// live system. `previous_hash` links each record to the prior one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Condensed view of one executed action, kept small on purpose: the
/// audit trail stores identifiers, never raw payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeSummary {
    /// The action that ran.
    pub action: String,
    /// Whether it succeeded.
    pub succeeded: bool,
    /// Evidence identifiers the action produced.
    #[serde(default)]
    pub evidence: serde_json::Value,
    /// Error message for failed actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the action finished (UTC).
    pub executed_at: DateTime<Utc>,
}

/// The request's final verdict, flattened for the trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSummary {
    Approved,
    /// Blocked, with the machine-readable reason code string.
    Blocked { reason: String },
}

/// A single audit record — one line in the JSONL trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique identifier of the pipeline run.
    pub request_id: Uuid,

    /// When the record was created (UTC).
    pub timestamp: DateTime<Utc>,

    /// Who the pipeline acted for.
    pub actor_id: String,

    /// The plan's primary intent.
    pub intent: String,

    /// The actions the plan required.
    pub required_actions: Vec<String>,

    /// Trust level at the start of the request (always "l0").
    pub trust_before: String,

    /// Trust level after post-execution downgrade.
    pub trust_after: String,

    /// Whether the plan touched sensitive data.
    pub sensitive: bool,

    /// The final verdict.
    pub verdict: VerdictSummary,

    /// Per-action outcome summaries, in execution order.
    #[serde(default)]
    pub outcomes: Vec<OutcomeSummary>,

    /// Wall-clock duration of the whole pipeline run, in milliseconds.
    pub duration_ms: u64,

    /// Hash of the previous record in the trail (None for the first record).
    pub previous_hash: Option<String>,
}

impl AuditRecord {
    /// Create a record with a fresh request id and the current timestamp.
    ///
    /// The coordinator fills in the rest before appending.
    pub fn new(actor_id: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor_id: actor_id.into(),
            intent: intent.into(),
            required_actions: Vec::new(),
            trust_before: "l0".to_string(),
            trust_after: "l0".to_string(),
            sensitive: false,
            verdict: VerdictSummary::Blocked {
                reason: "unrecorded".to_string(),
            },
            outcomes: Vec::new(),
            duration_ms: 0,
            previous_hash: None,
        }
    }

    /// Use an externally supplied request id (builder pattern).
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}
