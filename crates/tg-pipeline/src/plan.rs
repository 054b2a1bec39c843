// plan.rs — The declarative execution plan.
//
// Created once per request by the Planner, immutable afterwards, and
// consumed by the authority engine, the Executor, the Governor and the
// Narrator. The plan says what MUST run and at what trust level; it never
// runs anything itself.

use serde::{Deserialize, Serialize};

use tg_actions::IntentClassification;
use tg_policy::TrustLevel;

/// The closed set of primary intents the pipeline understands.
///
/// The Narrator dispatches on this enum; anything it has no evidence-backed
/// renderer for falls through to the honest default branch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SendMessage,
    ListMessages,
    CreateEvent,
    ListEvents,
    WebSearch,
    RecordLookup,
    /// Answerable from stable knowledge; no action implied.
    KnowledgeQuery,
    /// Nothing recognizable; no action implied.
    GeneralQuery,
}

impl Intent {
    /// The snake_case name, as it appears in audit records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::SendMessage => "send_message",
            Intent::ListMessages => "list_messages",
            Intent::CreateEvent => "create_event",
            Intent::ListEvents => "list_events",
            Intent::WebSearch => "web_search",
            Intent::RecordLookup => "record_lookup",
            Intent::KnowledgeQuery => "knowledge_query",
            Intent::GeneralQuery => "general_query",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one request requires: actions, trust level, confirmation.
///
/// `required_trust_level` and `requires_confirmation` are derived from
/// `required_actions` through the authority engine at planning time — the
/// Planner never hard-codes policy, so policy changes never touch it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// The primary intent.
    pub intent: Intent,
    /// Actions that MUST run, in order.
    pub required_actions: Vec<String>,
    /// Actions that MAY run (best-effort). Currently always empty;
    /// reserved, and part of the contract.
    pub optional_actions: Vec<String>,
    /// Minimum trust level the request must reach before execution.
    pub required_trust_level: TrustLevel,
    /// Whether any required action needs explicit user confirmation.
    pub requires_confirmation: bool,
    /// Human-readable plan steps, for the audit trail only.
    pub plan_steps: Vec<String>,
    /// Why this plan was chosen, for the audit trail only.
    pub reasoning: String,
    /// The advisory classification the plan was built against.
    pub classification: IntentClassification,
}
