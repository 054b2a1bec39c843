// engine.rs — Authority enforcement engine.
//
// The AuthorityEngine is the pre-execution chokepoint: before any action
// runs, the requested set passes through `enforce()` which checks, in order:
//
// 1. Are all capability families enabled? → No → Blocked (capability is the
//    supreme law; it wins over trust level and confirmation).
// 2. Does any action require confirmation the user has not given? → Blocked.
//    Missing confirmation outranks insufficient trust: it is the block the
//    user can actually act on.
// 3. Is the current trust level at least the required level? → No → Blocked.
// 4. Otherwise → Allowed.
//
// After execution the engine also decides the post-execution trust level:
// any failure resets to L0 unconditionally; an all-success batch settles
// at L1. Trust gained inside a request is forfeit on the first failure.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::{CapabilityMap, CapabilitySnapshot};
use crate::level::TrustLevel;
use crate::table::PolicyTable;

/// Minimal view of one executed action, used for the downgrade decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionStatus {
    /// The action that ran.
    pub action: String,
    /// Whether it succeeded.
    pub succeeded: bool,
}

/// Why enforcement blocked a request.
///
/// Each variant carries the detail the Narrator needs to explain the block
/// without re-deriving any policy logic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EnforcementBlock {
    /// One or more required actions belong to a disabled capability family.
    CapabilityDisabled {
        blocked_actions: Vec<String>,
        disabled_families: Vec<String>,
    },
    /// The request's current trust level is below the required level.
    AuthorityInsufficient {
        current_level: TrustLevel,
        required_level: TrustLevel,
    },
    /// At least one action needs explicit user confirmation that is absent.
    ConfirmationRequired {
        actions_needing_confirmation: Vec<String>,
        confirmation_prompt: String,
    },
}

/// The outcome of an enforcement check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum EnforcementResult {
    /// The actions may be attempted.
    Allowed,
    /// The actions must not run; the variant says why.
    Blocked(EnforcementBlock),
}

impl EnforcementResult {
    /// Whether execution may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, EnforcementResult::Allowed)
    }
}

/// Evaluates requested action sets against the policy table and a
/// per-request capability snapshot.
///
/// The engine owns the immutable policy data (table + family map) but never
/// holds a capability snapshot: snapshots arrive as arguments, fresh per
/// request, so stale capability state cannot leak between requests.
#[derive(Debug, Clone)]
pub struct AuthorityEngine {
    table: PolicyTable,
    families: CapabilityMap,
}

impl AuthorityEngine {
    pub fn new(table: PolicyTable, families: CapabilityMap) -> Self {
        Self { table, families }
    }

    /// The policy table this engine enforces.
    ///
    /// The Planner derives required trust level and confirmation from the
    /// table through the engine, so policy changes never touch the Planner.
    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// The subset of `actions` whose capability family is disabled in the
    /// snapshot (empty = all enabled).
    ///
    /// An action that maps to no family at all also counts as blocked:
    /// an unmapped action cannot prove it is enabled.
    pub fn check_capabilities(
        &self,
        actions: &[String],
        snapshot: &CapabilitySnapshot,
    ) -> Vec<String> {
        actions
            .iter()
            .filter(|action| match self.families.family_of(action) {
                Some(family) => !snapshot.is_enabled(family),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Validate whether a set of actions may be attempted.
    ///
    /// Check order is significant: capability first (always wins), then
    /// confirmation, then trust level. Callers that honor confirmation as
    /// an escalation grant should pass the escalated level (see
    /// [`AuthorityEngine::escalate`]).
    pub fn enforce(
        &self,
        current_level: TrustLevel,
        actions: &[String],
        user_confirmed: bool,
        snapshot: &CapabilitySnapshot,
    ) -> EnforcementResult {
        // 1. Capability check — the supreme law.
        let blocked = self.check_capabilities(actions, snapshot);
        if !blocked.is_empty() {
            let disabled_families = blocked
                .iter()
                .map(|a| {
                    self.families
                        .family_of(a)
                        .unwrap_or("unmapped")
                        .to_string()
                })
                .collect();
            debug!(blocked_actions = ?blocked, "enforcement blocked: capability disabled");
            return EnforcementResult::Blocked(EnforcementBlock::CapabilityDisabled {
                blocked_actions: blocked,
                disabled_families,
            });
        }

        // 2. Confirmation check. Blocks regardless of trust level.
        if self.table.requires_confirmation(actions) && !user_confirmed {
            let needing = self.table.confirming_actions(actions);
            debug!(actions = ?needing, "enforcement blocked: confirmation required");
            let confirmation_prompt = confirmation_prompt(&needing);
            return EnforcementResult::Blocked(EnforcementBlock::ConfirmationRequired {
                actions_needing_confirmation: needing,
                confirmation_prompt,
            });
        }

        // 3. Trust level check.
        let required_level = self.table.required_level(actions);
        if !current_level.satisfies(required_level) {
            debug!(%current_level, %required_level, "enforcement blocked: authority insufficient");
            return EnforcementResult::Blocked(EnforcementBlock::AuthorityInsufficient {
                current_level,
                required_level,
            });
        }

        debug!(?actions, "enforcement passed");
        EnforcementResult::Allowed
    }

    /// Raise the trust level to what the actions require, if permitted.
    ///
    /// Never escalates past what is needed, and never escalates at all when
    /// a required confirmation is missing.
    pub fn escalate(
        &self,
        current_level: TrustLevel,
        actions: &[String],
        has_confirmation: bool,
    ) -> TrustLevel {
        if self.table.requires_confirmation(actions) && !has_confirmation {
            return current_level;
        }
        current_level.max(self.table.required_level(actions))
    }

    /// The post-execution trust level.
    ///
    /// One failure anywhere in the batch resets to L0 — a hard reset, not a
    /// decay. An all-success batch settles at L1; this never returns a
    /// level above L1.
    pub fn downgrade_on_failure(&self, statuses: &[ActionStatus]) -> TrustLevel {
        let failed: Vec<&str> = statuses
            .iter()
            .filter(|s| !s.succeeded)
            .map(|s| s.action.as_str())
            .collect();
        if !failed.is_empty() {
            debug!(failed_actions = ?failed, "trust downgraded to L0");
            return TrustLevel::L0;
        }
        TrustLevel::L1
    }
}

/// The confirmation question to put to the user for a set of actions
/// awaiting confirmation. Keyed on the first recognized action.
pub fn confirmation_prompt(actions: &[String]) -> String {
    for action in actions {
        let prompt = match action.as_str() {
            "send_message" => "Do you confirm you want to send this message?",
            "create_event" => "Do you confirm you want to create this calendar event?",
            "update_event" => "Do you confirm you want to modify this event?",
            "delete_event" => "Do you confirm you want to delete this event?",
            _ => continue,
        };
        return prompt.to_string();
    }
    "Do you confirm this action?".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> AuthorityEngine {
        AuthorityEngine::new(PolicyTable::default(), CapabilityMap::default())
    }

    fn snapshot_all_on() -> CapabilitySnapshot {
        CapabilitySnapshot::all_enabled(&[
            "messaging.send",
            "messaging.read",
            "calendar.write",
            "calendar.read",
            "web.search",
            "records.read",
            "records.write",
            "system.status",
        ])
    }

    fn strs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn allows_read_at_sufficient_level() {
        let result = engine().enforce(
            TrustLevel::L1,
            &strs(&["list_events"]),
            false,
            &snapshot_all_on(),
        );
        assert_eq!(result, EnforcementResult::Allowed);
    }

    #[test]
    fn blocks_on_insufficient_authority() {
        let result = engine().enforce(
            TrustLevel::L0,
            &strs(&["list_messages"]),
            false,
            &snapshot_all_on(),
        );
        match result {
            EnforcementResult::Blocked(EnforcementBlock::AuthorityInsufficient {
                current_level,
                required_level,
            }) => {
                assert_eq!(current_level, TrustLevel::L0);
                assert_eq!(required_level, TrustLevel::L2);
            }
            other => panic!("expected AuthorityInsufficient, got {:?}", other),
        }
    }

    #[test]
    fn blocks_unconfirmed_send_regardless_of_level() {
        let result = engine().enforce(
            TrustLevel::L3,
            &strs(&["send_message"]),
            false,
            &snapshot_all_on(),
        );
        match result {
            EnforcementResult::Blocked(EnforcementBlock::ConfirmationRequired {
                actions_needing_confirmation,
                confirmation_prompt,
            }) => {
                assert_eq!(actions_needing_confirmation, strs(&["send_message"]));
                assert!(confirmation_prompt.contains("send this message"));
            }
            other => panic!("expected ConfirmationRequired, got {:?}", other),
        }
    }

    #[test]
    fn missing_confirmation_outranks_insufficient_trust() {
        // send_message needs L2 and confirmation; at L0 with no
        // confirmation, the block the user can act on wins.
        let result = engine().enforce(
            TrustLevel::L0,
            &strs(&["send_message"]),
            false,
            &snapshot_all_on(),
        );
        assert!(matches!(
            result,
            EnforcementResult::Blocked(EnforcementBlock::ConfirmationRequired { .. })
        ));
    }

    #[test]
    fn capability_wins_over_trust_and_confirmation() {
        // Highest level, confirmed — still blocked when the family is off.
        let mut snapshot = snapshot_all_on();
        snapshot.set("messaging.send", false);

        let result = engine().enforce(
            TrustLevel::L3,
            &strs(&["send_message"]),
            true,
            &snapshot,
        );
        match result {
            EnforcementResult::Blocked(EnforcementBlock::CapabilityDisabled {
                blocked_actions,
                disabled_families,
            }) => {
                assert_eq!(blocked_actions, strs(&["send_message"]));
                assert_eq!(disabled_families, strs(&["messaging.send"]));
            }
            other => panic!("expected CapabilityDisabled, got {:?}", other),
        }
    }

    #[test]
    fn unmapped_action_is_capability_blocked() {
        let result = engine().enforce(
            TrustLevel::L3,
            &strs(&["launch_rocket"]),
            true,
            &snapshot_all_on(),
        );
        assert!(matches!(
            result,
            EnforcementResult::Blocked(EnforcementBlock::CapabilityDisabled { .. })
        ));
    }

    #[test]
    fn confirmed_send_at_sufficient_level_is_allowed() {
        let result = engine().enforce(
            TrustLevel::L2,
            &strs(&["send_message"]),
            true,
            &snapshot_all_on(),
        );
        assert_eq!(result, EnforcementResult::Allowed);
    }

    #[test]
    fn empty_action_set_is_allowed_at_l0() {
        let result = engine().enforce(TrustLevel::L0, &[], false, &CapabilitySnapshot::default());
        assert_eq!(result, EnforcementResult::Allowed);
    }

    #[test]
    fn escalates_to_required_level() {
        let level = engine().escalate(TrustLevel::L0, &strs(&["send_message"]), true);
        assert_eq!(level, TrustLevel::L2);
    }

    #[test]
    fn does_not_escalate_without_required_confirmation() {
        let level = engine().escalate(TrustLevel::L0, &strs(&["send_message"]), false);
        assert_eq!(level, TrustLevel::L0);
    }

    #[test]
    fn does_not_downgrade_when_already_sufficient() {
        let level = engine().escalate(TrustLevel::L3, &strs(&["list_events"]), false);
        assert_eq!(level, TrustLevel::L3);
    }

    #[test]
    fn one_failure_resets_to_l0() {
        let statuses = vec![
            ActionStatus {
                action: "list_events".into(),
                succeeded: true,
            },
            ActionStatus {
                action: "send_message".into(),
                succeeded: false,
            },
        ];
        assert_eq!(engine().downgrade_on_failure(&statuses), TrustLevel::L0);
    }

    #[test]
    fn all_success_settles_at_l1_never_higher() {
        let statuses = vec![ActionStatus {
            action: "send_message".into(),
            succeeded: true,
        }];
        assert_eq!(engine().downgrade_on_failure(&statuses), TrustLevel::L1);
    }

    #[test]
    fn generic_prompt_for_unrecognized_actions() {
        let prompt = confirmation_prompt(&strs(&["frobnicate"]));
        assert_eq!(prompt, "Do you confirm this action?");
    }
}
