// report.rs — What actually happened: per-action outcomes with evidence.
//
// The report is the ground truth the Governor validates and the Narrator
// speaks from. Nothing downstream ever consults the plan to decide what
// "happened" — only this.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tg_actions::EvidenceMap;
use tg_policy::ActionStatus;

/// The result of one action attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// The action that ran (or failed to).
    pub action: String,
    /// Whether the runner reported success.
    pub succeeded: bool,
    /// Verifiable artifacts extracted from the output. Empty on failure.
    #[serde(default)]
    pub evidence: EvidenceMap,
    /// The raw runner output, kept for narration and audit.
    #[serde(default)]
    pub raw_output: Value,
    /// The failure message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the attempt finished.
    pub executed_at: DateTime<Utc>,
    /// Wall-clock duration of the attempt.
    pub duration_ms: u64,
}

impl ActionOutcome {
    /// A failed outcome with no evidence.
    pub fn failure(action: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            action: action.into(),
            succeeded: false,
            evidence: EvidenceMap::new(),
            raw_output: Value::Null,
            error: Some(error.into()),
            executed_at: Utc::now(),
            duration_ms,
        }
    }
}

/// All outcomes for one request, with derived summary fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// One outcome per attempted action, in execution order.
    pub outcomes: Vec<ActionOutcome>,
    /// True iff every attempted action succeeded.
    pub all_succeeded: bool,
    /// The actions that failed, in execution order.
    pub failed_actions: Vec<String>,
    /// Total wall-clock time across all attempts.
    pub total_duration_ms: u64,
}

impl ExecutionReport {
    /// Build a report, deriving the summary fields from the outcomes.
    pub fn from_outcomes(outcomes: Vec<ActionOutcome>) -> Self {
        let all_succeeded = outcomes.iter().all(|o| o.succeeded);
        let failed_actions = outcomes
            .iter()
            .filter(|o| !o.succeeded)
            .map(|o| o.action.clone())
            .collect();
        let total_duration_ms = outcomes.iter().map(|o| o.duration_ms).sum();
        Self {
            outcomes,
            all_succeeded,
            failed_actions,
            total_duration_ms,
        }
    }

    /// The outcome for a given action, if it was attempted.
    pub fn outcome_of(&self, action: &str) -> Option<&ActionOutcome> {
        self.outcomes.iter().find(|o| o.action == action)
    }

    /// Per-action statuses in the shape the authority engine's downgrade
    /// rule consumes.
    pub fn statuses(&self) -> Vec<ActionStatus> {
        self.outcomes
            .iter()
            .map(|o| ActionStatus {
                action: o.action.clone(),
                succeeded: o.succeeded,
            })
            .collect()
    }
}
