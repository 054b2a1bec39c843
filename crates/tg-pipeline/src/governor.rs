// governor.rs — The only component that can say "approved".
//
// By the time a report reaches the Governor, capability and authority
// failures have already been caught upstream; the Governor's entire job
// is verifying that the execution attempt was truthful. Decision order is
// significant and first-match-wins:
//
//   1. missing_tools   — a required action was never attempted
//   2. tool_failed     — an attempted action failed
//   3. missing_evidence — a successful non-exempt action has no evidence
//   4. per-action rules — stricter keyed checks (send needs message_id, …)
//   5. approved

use serde_json::json;
use tracing::{debug, warn};

use tg_actions::EvidenceExemptions;

use crate::executor::actions_missing_evidence;
use crate::plan::ExecutionPlan;
use crate::report::ExecutionReport;
use crate::verdict::{ReasonCode, Verdict};

/// One action-specific evidence requirement: the named key must be present
/// in the action's evidence map, or the request blocks with `reason`.
#[derive(Debug, Clone)]
pub struct EvidenceRule {
    pub action: &'static str,
    pub required_key: &'static str,
    pub reason: ReasonCode,
}

/// The per-action evidence rule table. Data, not code branches: adding an
/// action's evidence contract means adding a row here.
#[derive(Debug, Clone)]
pub struct EvidenceRules {
    rules: Vec<EvidenceRule>,
}

impl EvidenceRules {
    pub fn new(rules: Vec<EvidenceRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[EvidenceRule] {
        &self.rules
    }
}

impl Default for EvidenceRules {
    fn default() -> Self {
        Self::new(vec![
            EvidenceRule {
                action: "send_message",
                required_key: "message_id",
                reason: ReasonCode::MessageIdMissing,
            },
            EvidenceRule {
                action: "create_event",
                required_key: "event_id",
                reason: ReasonCode::EventIdMissing,
            },
            EvidenceRule {
                action: "update_event",
                required_key: "event_id",
                reason: ReasonCode::EventIdMissing,
            },
        ])
    }
}

/// Validates execution reports against their plans.
#[derive(Debug, Clone, Default)]
pub struct Governor {
    exemptions: EvidenceExemptions,
    rules: EvidenceRules,
}

impl Governor {
    pub fn new(exemptions: EvidenceExemptions, rules: EvidenceRules) -> Self {
        Self { exemptions, rules }
    }

    /// The final verdict for one request.
    pub fn validate(&self, plan: &ExecutionPlan, report: &ExecutionReport) -> Verdict {
        let unattempted: Vec<&String> = plan
            .required_actions
            .iter()
            .filter(|a| report.outcome_of(a).is_none())
            .collect();
        if !unattempted.is_empty() {
            warn!(?unattempted, "required actions never attempted");
            return Verdict::blocked(
                ReasonCode::MissingTools,
                json!({ "missing_actions": unattempted }),
            );
        }

        if !report.all_succeeded {
            let failures: Vec<_> = report
                .outcomes
                .iter()
                .filter(|o| !o.succeeded)
                .map(|o| {
                    json!({
                        "action": o.action,
                        "error": o.error.clone().unwrap_or_default(),
                    })
                })
                .collect();
            warn!(failed = ?report.failed_actions, "execution reported failures");
            return Verdict::blocked(
                ReasonCode::ToolFailed,
                json!({ "failed_actions": failures }),
            );
        }

        let missing = actions_missing_evidence(&report.outcomes, &self.exemptions);
        if !missing.is_empty() {
            warn!(?missing, "successful actions produced no evidence");
            return Verdict::blocked(
                ReasonCode::MissingEvidence,
                json!({ "actions_missing_evidence": missing }),
            );
        }

        for rule in self.rules.rules() {
            if let Some(outcome) = report.outcome_of(rule.action) {
                if outcome.succeeded && !outcome.evidence.contains_key(rule.required_key) {
                    warn!(
                        action = rule.action,
                        required_key = rule.required_key,
                        "action-specific evidence rule violated"
                    );
                    return Verdict::blocked(
                        rule.reason,
                        json!({
                            "action": rule.action,
                            "required_key": rule.required_key,
                        }),
                    );
                }
            }
        }

        debug!("execution verified, verdict approved");
        Verdict::Approved
    }
}
