// verdict.rs — The Governor's final word on a request.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use tg_policy::EnforcementBlock;

/// Why a request was blocked. Closed set; every spelling is load-bearing
/// in audit records and downstream alerting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// A required action's capability family is switched off.
    CapabilityDisabled,
    /// The request's trust level never reached the required level.
    AuthorityInsufficient,
    /// A required action needs explicit user confirmation.
    ConfirmationRequired,
    /// Required actions were never attempted.
    MissingTools,
    /// A required action was attempted and failed.
    ToolFailed,
    /// A successful non-exempt action produced no evidence.
    MissingEvidence,
    /// send_message succeeded but returned no message id.
    MessageIdMissing,
    /// A calendar write succeeded but returned no event id.
    EventIdMissing,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::CapabilityDisabled => "capability_disabled",
            ReasonCode::AuthorityInsufficient => "authority_insufficient",
            ReasonCode::ConfirmationRequired => "confirmation_required",
            ReasonCode::MissingTools => "missing_tools",
            ReasonCode::ToolFailed => "tool_failed",
            ReasonCode::MissingEvidence => "missing_evidence",
            ReasonCode::MessageIdMissing => "message_id_missing",
            ReasonCode::EventIdMissing => "event_id_missing",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approved, or blocked with a reason and structured detail.
///
/// Only the Governor constructs the approved variant; enforcement blocks
/// convert in via [`Verdict::from_enforcement`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Approved,
    Blocked {
        reason: ReasonCode,
        /// Reason-specific fields the Narrator renders from.
        detail: Value,
    },
}

impl Verdict {
    pub fn is_approved(&self) -> bool {
        matches!(self, Verdict::Approved)
    }

    pub fn blocked(reason: ReasonCode, detail: Value) -> Self {
        Verdict::Blocked { reason, detail }
    }

    /// The reason code, if blocked.
    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            Verdict::Approved => None,
            Verdict::Blocked { reason, .. } => Some(*reason),
        }
    }

    /// Lift a pre-execution enforcement block into a verdict.
    pub fn from_enforcement(block: EnforcementBlock) -> Self {
        match block {
            EnforcementBlock::CapabilityDisabled {
                blocked_actions,
                disabled_families,
            } => Verdict::blocked(
                ReasonCode::CapabilityDisabled,
                json!({
                    "blocked_actions": blocked_actions,
                    "disabled_families": disabled_families,
                }),
            ),
            EnforcementBlock::AuthorityInsufficient {
                current_level,
                required_level,
            } => Verdict::blocked(
                ReasonCode::AuthorityInsufficient,
                json!({
                    "current_level": current_level.to_string(),
                    "required_level": required_level.to_string(),
                }),
            ),
            EnforcementBlock::ConfirmationRequired {
                actions_needing_confirmation,
                confirmation_prompt,
            } => Verdict::blocked(
                ReasonCode::ConfirmationRequired,
                json!({
                    "actions_needing_confirmation": actions_needing_confirmation,
                    "confirmation_prompt": confirmation_prompt,
                }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_policy::TrustLevel;

    #[test]
    fn reason_codes_spell_snake_case() {
        assert_eq!(ReasonCode::MessageIdMissing.as_str(), "message_id_missing");
        let json = serde_json::to_string(&ReasonCode::ToolFailed).unwrap();
        assert_eq!(json, "\"tool_failed\"");
    }

    #[test]
    fn enforcement_block_lifts_with_detail() {
        let verdict = Verdict::from_enforcement(EnforcementBlock::AuthorityInsufficient {
            current_level: TrustLevel::L0,
            required_level: TrustLevel::L2,
        });
        match verdict {
            Verdict::Blocked { reason, detail } => {
                assert_eq!(reason, ReasonCode::AuthorityInsufficient);
                assert_eq!(detail["current_level"], "l0");
                assert_eq!(detail["required_level"], "l2");
            }
            Verdict::Approved => panic!("expected a blocked verdict"),
        }
    }

    #[test]
    fn confirmation_block_carries_the_prompt() {
        let verdict = Verdict::from_enforcement(EnforcementBlock::ConfirmationRequired {
            actions_needing_confirmation: vec!["send_message".to_string()],
            confirmation_prompt: "Do you want me to send this message?".to_string(),
        });
        let detail = match &verdict {
            Verdict::Blocked { detail, .. } => detail,
            Verdict::Approved => panic!("expected a blocked verdict"),
        };
        assert!(detail["confirmation_prompt"]
            .as_str()
            .unwrap()
            .contains("send"));
    }

    #[test]
    fn verdict_serializes_with_tag() {
        let json = serde_json::to_value(Verdict::Approved).unwrap();
        assert_eq!(json["verdict"], "approved");
    }
}
