// table.rs — The policy table: action name → policy record.
//
// Pure data, no behavior beyond lookups. The table is immutable after load
// and is the single source of truth for trust-level and confirmation
// requirements. Policy changes happen here, never in the planner or the
// pipeline — those derive everything through queries against this table.
//
// Unknown action names resolve to a fail-closed record (maximum trust
// level, confirmation required, sensitive).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::level::TrustLevel;

/// The policy record for one action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyRecord {
    /// Minimum trust level a request must hold to attempt this action.
    pub min_trust_level: TrustLevel,
    /// Whether the user must explicitly confirm before this action runs.
    pub requires_confirmation: bool,
    /// Whether this action touches sensitive data (surfaced in audit records).
    pub is_sensitive: bool,
}

/// The record applied to action names the table has never heard of.
///
/// Fail closed: maximum level, confirmation required, treated as sensitive.
const UNKNOWN_ACTION_RECORD: PolicyRecord = PolicyRecord {
    min_trust_level: TrustLevel::MAX,
    requires_confirmation: true,
    is_sensitive: true,
};

/// Immutable mapping from action name to [`PolicyRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyTable {
    records: HashMap<String, PolicyRecord>,
}

impl PolicyTable {
    /// Build a table from explicit records.
    pub fn new(records: HashMap<String, PolicyRecord>) -> Self {
        Self { records }
    }

    /// Load a table from a JSON file: `{ "send_message": { ... }, ... }`.
    pub fn from_file(path: &Path) -> Result<Self, PolicyError> {
        let content = std::fs::read_to_string(path).map_err(|source| PolicyError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse a table from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, PolicyError> {
        let records: HashMap<String, PolicyRecord> = serde_json::from_str(content)?;
        Ok(Self { records })
    }

    /// Load from file if it exists, otherwise use the built-in defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::from_file(path).unwrap_or_else(|_| Self::default())
        } else {
            Self::default()
        }
    }

    /// Look up the record for one action. Unknown actions fail closed.
    pub fn record(&self, action: &str) -> PolicyRecord {
        self.records
            .get(action)
            .copied()
            .unwrap_or(UNKNOWN_ACTION_RECORD)
    }

    /// Whether the table has an explicit record for this action.
    pub fn knows(&self, action: &str) -> bool {
        self.records.contains_key(action)
    }

    /// The maximum `min_trust_level` among the given actions.
    ///
    /// L0 for an empty list — a plan with no actions needs no authority.
    /// Pure function of the table: same input, same output.
    pub fn required_level(&self, actions: &[String]) -> TrustLevel {
        actions
            .iter()
            .map(|a| self.record(a).min_trust_level)
            .max()
            .unwrap_or(TrustLevel::L0)
    }

    /// Whether any of the given actions requires explicit user confirmation.
    pub fn requires_confirmation(&self, actions: &[String]) -> bool {
        actions.iter().any(|a| self.record(a).requires_confirmation)
    }

    /// The subset of actions that require confirmation, in input order.
    pub fn confirming_actions(&self, actions: &[String]) -> Vec<String> {
        actions
            .iter()
            .filter(|a| self.record(a).requires_confirmation)
            .cloned()
            .collect()
    }

    /// Whether any of the given actions touches sensitive data.
    pub fn is_sensitive(&self, actions: &[String]) -> bool {
        actions.iter().any(|a| self.record(a).is_sensitive)
    }
}

impl Default for PolicyTable {
    /// The built-in policy table for the known action set.
    fn default() -> Self {
        fn rec(min: TrustLevel, confirm: bool, sensitive: bool) -> PolicyRecord {
            PolicyRecord {
                min_trust_level: min,
                requires_confirmation: confirm,
                is_sensitive: sensitive,
            }
        }

        let mut records = HashMap::new();

        // Messaging — reads are sensitive (private correspondence), sends are
        // irreversible and always confirmed.
        records.insert("list_messages".into(), rec(TrustLevel::L2, false, true));
        records.insert("read_message".into(), rec(TrustLevel::L2, false, true));
        records.insert("send_message".into(), rec(TrustLevel::L2, true, true));

        // Calendar — reads are harmless, writes can affect commitments.
        records.insert("list_events".into(), rec(TrustLevel::L1, false, false));
        records.insert("get_event".into(), rec(TrustLevel::L1, false, false));
        records.insert("create_event".into(), rec(TrustLevel::L2, true, true));
        records.insert("update_event".into(), rec(TrustLevel::L2, true, true));
        records.insert("delete_event".into(), rec(TrustLevel::L2, true, true));

        // Web search — no user data involved.
        records.insert("web_search".into(), rec(TrustLevel::L1, false, false));

        // Record store — reads open, writes sensitive but reversible.
        records.insert("list_records".into(), rec(TrustLevel::L1, false, false));
        records.insert("get_record".into(), rec(TrustLevel::L1, false, false));
        records.insert("create_record".into(), rec(TrustLevel::L2, false, true));
        records.insert("update_record".into(), rec(TrustLevel::L2, false, true));

        // Pure status probe.
        records.insert("status_probe".into(), rec(TrustLevel::L1, false, false));

        Self { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unknown_action_fails_closed() {
        let table = PolicyTable::default();
        let record = table.record("launch_rocket");
        assert_eq!(record.min_trust_level, TrustLevel::MAX);
        assert!(record.requires_confirmation);
        assert!(record.is_sensitive);
    }

    #[test]
    fn required_level_is_the_maximum() {
        let table = PolicyTable::default();
        let level = table.required_level(&strs(&["list_events", "send_message"]));
        assert_eq!(level, TrustLevel::L2);
    }

    #[test]
    fn required_level_of_empty_list_is_l0() {
        let table = PolicyTable::default();
        assert_eq!(table.required_level(&[]), TrustLevel::L0);
    }

    #[test]
    fn unknown_action_raises_required_level_to_max() {
        let table = PolicyTable::default();
        let level = table.required_level(&strs(&["list_events", "no_such_action"]));
        assert_eq!(level, TrustLevel::MAX);
    }

    #[test]
    fn confirmation_propagates_from_any_action() {
        let table = PolicyTable::default();
        assert!(table.requires_confirmation(&strs(&["list_events", "send_message"])));
        assert!(!table.requires_confirmation(&strs(&["list_events", "web_search"])));
    }

    #[test]
    fn confirming_actions_lists_only_the_confirming_subset() {
        let table = PolicyTable::default();
        let subset = table.confirming_actions(&strs(&["list_events", "send_message", "create_event"]));
        assert_eq!(subset, strs(&["send_message", "create_event"]));
    }

    #[test]
    fn lookups_are_idempotent() {
        let table = PolicyTable::default();
        let actions = strs(&["send_message", "list_events"]);
        assert_eq!(table.required_level(&actions), table.required_level(&actions));
        assert_eq!(
            table.requires_confirmation(&actions),
            table.requires_confirmation(&actions)
        );
    }

    #[test]
    fn sensitivity_propagates() {
        let table = PolicyTable::default();
        assert!(table.is_sensitive(&strs(&["list_messages"])));
        assert!(!table.is_sensitive(&strs(&["web_search", "list_events"])));
    }

    #[test]
    fn loads_from_json() {
        let json = r#"{
            "custom_action": {
                "min_trust_level": "l3",
                "requires_confirmation": true,
                "is_sensitive": false
            }
        }"#;
        let table = PolicyTable::from_json(json).unwrap();
        assert!(table.knows("custom_action"));
        assert_eq!(table.record("custom_action").min_trust_level, TrustLevel::L3);
    }

    #[test]
    fn load_or_default_returns_defaults_for_missing_file() {
        let table = PolicyTable::load_or_default(Path::new("/nonexistent/policy.json"));
        assert!(table.knows("send_message"));
    }

    #[test]
    fn loads_from_tempfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(
            &path,
            r#"{"ping": {"min_trust_level": "l0", "requires_confirmation": false, "is_sensitive": false}}"#,
        )
        .unwrap();

        let table = PolicyTable::from_file(&path).unwrap();
        assert!(table.knows("ping"));
        assert!(!table.knows("send_message"));
    }
}
