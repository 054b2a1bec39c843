// evidence.rs — Deterministic evidence extraction and exemptions.
//
// Evidence is a small set of caller-opaque identifiers proving an action
// had an externally observable effect (a message id, an event id, a result
// count). Extraction never invents values: a field is copied into the
// evidence map only when the raw result actually carries it. An action
// whose raw result lacks the expected fields simply yields empty evidence,
// which the Governor later treats as a verification failure unless the
// action is exempt.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Evidence identifiers for one action, keyed by identifier name.
///
/// `BTreeMap` keeps key order deterministic, which keeps audit records and
/// narrated summaries stable across runs.
pub type EvidenceMap = BTreeMap<String, Value>;

/// Actions that legitimately produce no evidence identifier on success.
///
/// A list action returning zero items and a pure status probe both succeed
/// without minting an identifier. The set is explicit data — extending it
/// never touches Governor logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceExemptions {
    actions: BTreeSet<String>,
}

impl EvidenceExemptions {
    /// Build an exemption set from explicit action names.
    pub fn new(actions: impl IntoIterator<Item = String>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
        }
    }

    /// Whether this action is exempt from producing evidence.
    pub fn is_exempt(&self, action: &str) -> bool {
        self.actions.contains(action)
    }

    /// The exempted action names.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|s| s.as_str())
    }
}

impl Default for EvidenceExemptions {
    fn default() -> Self {
        Self::new(
            [
                "list_messages",
                "list_events",
                "list_records",
                "web_search",
                "status_probe",
            ]
            .map(String::from),
        )
    }
}

/// Extracts evidence identifiers from raw action results, by family rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvidenceExtractor;

impl EvidenceExtractor {
    /// Extract the evidence map for one action's raw result payload.
    ///
    /// The family rule is chosen from the action name; fields are copied
    /// only when present. A payload that is not an object yields empty
    /// evidence.
    pub fn extract(&self, action: &str, data: &Value) -> EvidenceMap {
        let mut evidence = EvidenceMap::new();
        let Some(object) = data.as_object() else {
            return evidence;
        };

        if action.contains("message") {
            copy_field(object, "message_id", &mut evidence);
            copy_field(object, "thread_id", &mut evidence);
            if let Some(items) = object.get("messages").and_then(Value::as_array) {
                evidence.insert("message_ids".into(), ids_of(items));
                evidence.insert("count".into(), Value::from(items.len()));
            }
        }

        if action.contains("event") {
            copy_field(object, "event_id", &mut evidence);
            // Some calendar backends return the identifier as a bare "id".
            if !evidence.contains_key("event_id") {
                if let Some(id) = object.get("id") {
                    evidence.insert("event_id".into(), id.clone());
                }
            }
            copy_field(object, "link", &mut evidence);
            if let Some(items) = object.get("events").and_then(Value::as_array) {
                evidence.insert("event_ids".into(), ids_of(items));
                evidence.insert("count".into(), Value::from(items.len()));
            }
        }

        if action == "web_search" {
            copy_field(object, "query_id", &mut evidence);
            if let Some(items) = object.get("results").and_then(Value::as_array) {
                let sources: Vec<Value> = items
                    .iter()
                    .filter_map(|r| r.get("url").or_else(|| r.get("title")))
                    .cloned()
                    .collect();
                evidence.insert("sources".into(), Value::Array(sources));
                evidence.insert("count".into(), Value::from(items.len()));
            }
        }

        if action.contains("record") {
            copy_field(object, "record_id", &mut evidence);
            if let Some(items) = object.get("records").and_then(Value::as_array) {
                evidence.insert("record_ids".into(), ids_of(items));
                evidence.insert("count".into(), Value::from(items.len()));
            }
        }

        evidence
    }
}

/// Copy `key` from the payload into the evidence map when present and non-null.
fn copy_field(object: &serde_json::Map<String, Value>, key: &str, evidence: &mut EvidenceMap) {
    if let Some(value) = object.get(key) {
        if !value.is_null() {
            evidence.insert(key.to_string(), value.clone());
        }
    }
}

/// The `id` fields of an array of result items, skipping items without one.
fn ids_of(items: &[Value]) -> Value {
    Value::Array(
        items
            .iter()
            .filter_map(|item| item.get("id"))
            .cloned()
            .collect(),
    )
}
