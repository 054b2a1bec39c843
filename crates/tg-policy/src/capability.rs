// capability.rs — Capability families and the per-request snapshot.
//
// A capability is a system-wide on/off switch for a family of actions
// ("messaging.send", "calendar.write", ...), independent of any single
// request's trust level. The snapshot is supplied fresh per request by an
// external configuration source and is never cached across requests.
//
// A family that is absent from the snapshot counts as disabled, and so
// does an action that maps to no family at all: fail closed.

use std::collections::HashMap;
use std::path::Path;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Mapping from capability-family name to enabled/disabled.
///
/// Read fresh per request. `#[serde(transparent)]` makes this serialize as
/// the bare map, matching the external `{"messaging.send": true, ...}` form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySnapshot {
    families: HashMap<String, bool>,
}

impl CapabilitySnapshot {
    /// Build a snapshot from explicit family flags.
    pub fn new(families: HashMap<String, bool>) -> Self {
        Self { families }
    }

    /// A snapshot with every given family enabled (test and demo convenience).
    pub fn all_enabled(families: &[&str]) -> Self {
        Self {
            families: families.iter().map(|f| (f.to_string(), true)).collect(),
        }
    }

    /// Load a snapshot from a JSON file.
    ///
    /// A missing or unreadable file yields the empty snapshot — which
    /// disables everything, the safe default.
    pub fn load_or_disabled(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Parse a snapshot from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Whether a family is enabled. Absent families are disabled.
    pub fn is_enabled(&self, family: &str) -> bool {
        self.families.get(family).copied().unwrap_or(false)
    }

    /// Flag a family on or off (used when assembling snapshots in tests).
    pub fn set(&mut self, family: impl Into<String>, enabled: bool) {
        self.families.insert(family.into(), enabled);
    }

    /// The raw family map, for audit metadata.
    pub fn families(&self) -> &HashMap<String, bool> {
        &self.families
    }
}

/// Supplies a fresh [`CapabilitySnapshot`] at the start of every request.
///
/// Capability state outranks trust and confirmation, so it must be read
/// fresh each time — implementations must not cache across requests.
pub trait CapabilitySource: Send + Sync {
    fn snapshot(&self) -> CapabilitySnapshot;
}

/// A fixed snapshot used as its own source (tests, demos, static configs).
impl CapabilitySource for CapabilitySnapshot {
    fn snapshot(&self) -> CapabilitySnapshot {
        self.clone()
    }
}

/// Re-reads a JSON capability file on every request, so operators can flip
/// a family off without a restart. Unreadable file means all disabled.
#[derive(Debug, Clone)]
pub struct FileCapabilitySource {
    path: std::path::PathBuf,
}

impl FileCapabilitySource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CapabilitySource for FileCapabilitySource {
    fn snapshot(&self) -> CapabilitySnapshot {
        CapabilitySnapshot::load_or_disabled(&self.path)
    }
}

/// One action-name pattern → capability-family entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyRule {
    /// Glob pattern over action names (e.g., "send_message", "*_event").
    pub pattern: String,
    /// The capability family the matched actions belong to.
    pub family: String,
}

/// Maps action names to capability families via an ordered glob-pattern list.
///
/// First match wins, so exact names should precede wildcard patterns.
/// The mapping is data: adding an action family never requires touching
/// the engine.
#[derive(Debug, Clone)]
pub struct CapabilityMap {
    rules: Vec<(Pattern, String)>,
}

impl CapabilityMap {
    /// Build a map from pattern rules. Invalid globs are rejected.
    pub fn new(rules: Vec<FamilyRule>) -> Result<Self, PolicyError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let pattern =
                Pattern::new(&rule.pattern).map_err(|e| PolicyError::InvalidPattern {
                    pattern: rule.pattern.clone(),
                    reason: e.to_string(),
                })?;
            compiled.push((pattern, rule.family));
        }
        Ok(Self { rules: compiled })
    }

    /// The capability family for an action, if any rule matches.
    pub fn family_of(&self, action: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(action))
            .map(|(_, family)| family.as_str())
    }
}

impl Default for CapabilityMap {
    /// The built-in action → family mapping for the known action set.
    fn default() -> Self {
        let rules = vec![
            rule("send_message", "messaging.send"),
            rule("list_messages", "messaging.read"),
            rule("read_message", "messaging.read"),
            rule("create_event", "calendar.write"),
            rule("update_event", "calendar.write"),
            rule("delete_event", "calendar.write"),
            rule("list_events", "calendar.read"),
            rule("get_event", "calendar.read"),
            rule("web_search", "web.search"),
            rule("create_record", "records.write"),
            rule("update_record", "records.write"),
            rule("*_record", "records.read"),
            rule("*_records", "records.read"),
            rule("status_probe", "system.status"),
        ];
        // The built-in patterns are all valid globs.
        Self::new(rules).unwrap_or(Self { rules: Vec::new() })
    }
}

fn rule(pattern: &str, family: &str) -> FamilyRule {
    FamilyRule {
        pattern: pattern.to_string(),
        family: family.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_names_map_to_families() {
        let map = CapabilityMap::default();
        assert_eq!(map.family_of("send_message"), Some("messaging.send"));
        assert_eq!(map.family_of("list_events"), Some("calendar.read"));
        assert_eq!(map.family_of("web_search"), Some("web.search"));
    }

    #[test]
    fn wildcard_patterns_catch_record_reads() {
        let map = CapabilityMap::default();
        assert_eq!(map.family_of("get_record"), Some("records.read"));
        assert_eq!(map.family_of("list_records"), Some("records.read"));
    }

    #[test]
    fn record_writes_take_precedence_over_wildcards() {
        // "create_record" matches both the exact rule and "*_record";
        // first match wins, so the write family applies.
        let map = CapabilityMap::default();
        assert_eq!(map.family_of("create_record"), Some("records.write"));
    }

    #[test]
    fn unmapped_action_has_no_family() {
        let map = CapabilityMap::default();
        assert_eq!(map.family_of("launch_rocket"), None);
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let result = CapabilityMap::new(vec![rule("[invalid", "x")]);
        assert!(matches!(result, Err(PolicyError::InvalidPattern { .. })));
    }

    #[test]
    fn absent_family_is_disabled() {
        let snapshot = CapabilitySnapshot::default();
        assert!(!snapshot.is_enabled("messaging.send"));
    }

    #[test]
    fn snapshot_round_trips_as_bare_map() {
        let mut snapshot = CapabilitySnapshot::default();
        snapshot.set("messaging.send", true);
        snapshot.set("calendar.write", false);

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored = CapabilitySnapshot::from_json(&json).unwrap();
        assert!(restored.is_enabled("messaging.send"));
        assert!(!restored.is_enabled("calendar.write"));
    }

    #[test]
    fn missing_file_disables_everything() {
        let snapshot = CapabilitySnapshot::load_or_disabled(Path::new("/nonexistent/caps.json"));
        assert!(!snapshot.is_enabled("messaging.send"));
        assert!(!snapshot.is_enabled("web.search"));
    }

    #[test]
    fn loads_snapshot_from_tempfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caps.json");
        std::fs::write(&path, r#"{"web.search": true, "messaging.send": false}"#).unwrap();

        let snapshot = CapabilitySnapshot::load_or_disabled(&path);
        assert!(snapshot.is_enabled("web.search"));
        assert!(!snapshot.is_enabled("messaging.send"));
    }

    #[test]
    fn file_source_picks_up_edits_between_requests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caps.json");
        std::fs::write(&path, r#"{"messaging.send": true}"#).unwrap();

        let source = FileCapabilitySource::new(&path);
        assert!(source.snapshot().is_enabled("messaging.send"));

        std::fs::write(&path, r#"{"messaging.send": false}"#).unwrap();
        assert!(!source.snapshot().is_enabled("messaging.send"));
    }
}
