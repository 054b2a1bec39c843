// coordinator.rs — One request through the whole pipeline.
//
// Sequencing per request:
//
//   reject empty input
//   → fresh capability snapshot
//   → classify + plan
//   → escalate from L0 (every request starts there), then enforce
//   → execute, post-execution downgrade
//   → governor verdict
//   → narration
//   → audit record
//
// Trust is a local variable inside `run`, never a field: concurrent
// requests cannot observe each other's levels.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use tg_actions::{ActionRunner, IntentClassifier};
use tg_audit::{AuditRecord, AuditTrail, OutcomeSummary, VerdictSummary};
use tg_policy::{
    AuthorityEngine, CapabilitySource, ConfirmationDetector, EnforcementResult, TrustLevel,
};

use crate::error::PipelineError;
use crate::executor::Executor;
use crate::governor::Governor;
use crate::narrator::Narrator;
use crate::plan::ExecutionPlan;
use crate::planner::Planner;
use crate::report::ExecutionReport;
use crate::verdict::{ReasonCode, Verdict};

/// One user request as the pipeline receives it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// Who the request is for.
    pub actor_id: String,
    /// The raw user text.
    pub text: String,
    /// Whether the caller's UI already collected an explicit confirmation
    /// (e.g., a button). Confirmation phrases in `text` also count.
    #[serde(default)]
    pub user_confirmed: bool,
    /// Per-action arguments, keyed by action name.
    #[serde(default)]
    pub action_args: HashMap<String, Value>,
}

impl PipelineRequest {
    pub fn new(actor_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            text: text.into(),
            user_confirmed: false,
            action_args: HashMap::new(),
        }
    }

    pub fn confirmed(mut self) -> Self {
        self.user_confirmed = true;
        self
    }
}

/// What the pipeline hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub request_id: Uuid,
    /// The narrated user-facing text.
    pub text: String,
    pub was_blocked: bool,
    /// The block reason, if blocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<ReasonCode>,
    /// Evidence the approved text was derived from; null when blocked.
    pub evidence_summary: Value,
    /// The trust level the request ended at.
    pub trust_level: TrustLevel,
    /// The plan's primary intent, for callers that route on it.
    pub intent: String,
    pub duration_ms: u64,
}

/// Wires one request through planner, authority engine, executor, governor
/// and narrator, and appends an audit record.
pub struct PipelineCoordinator {
    engine: AuthorityEngine,
    planner: Planner,
    executor: Executor,
    governor: Governor,
    narrator: Narrator,
    detector: ConfirmationDetector,
    classifier: Arc<dyn IntentClassifier>,
    capabilities: Arc<dyn CapabilitySource>,
    audit: Option<Mutex<AuditTrail>>,
}

impl PipelineCoordinator {
    pub fn new(
        engine: AuthorityEngine,
        runner: Arc<dyn ActionRunner>,
        classifier: Arc<dyn IntentClassifier>,
        capabilities: Arc<dyn CapabilitySource>,
    ) -> Self {
        Self {
            engine,
            planner: Planner::new(),
            executor: Executor::new(runner),
            governor: Governor::default(),
            narrator: Narrator::new(),
            detector: ConfirmationDetector::default(),
            classifier,
            capabilities,
            audit: None,
        }
    }

    /// Append an audit record per request to this trail.
    pub fn with_audit_trail(mut self, trail: AuditTrail) -> Self {
        self.audit = Some(Mutex::new(trail));
        self
    }

    /// Replace the default executor (custom timeout or exemptions).
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Replace the default confirmation phrase set.
    pub fn with_detector(mut self, detector: ConfirmationDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Run one request end to end.
    ///
    /// Authorization and execution failures come back as blocked responses
    /// with narration; only an empty request is an error.
    pub fn run(&self, request: PipelineRequest) -> Result<PipelineResponse, PipelineError> {
        if request.text.trim().is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let started = Instant::now();
        let request_id = Uuid::new_v4();

        // Capability state is read fresh per request; a family flipped off
        // between requests takes effect immediately.
        let snapshot = self.capabilities.snapshot();

        let classification = self.classifier.classify(&request.text);
        let plan = self
            .planner
            .plan(&request.text, &classification, &self.engine);

        let user_confirmed =
            request.user_confirmed || self.detector.is_confirmation(&request.text);

        // Every request starts at L0. No exceptions, no carryover.
        let trust_before = TrustLevel::START;

        info!(
            %request_id,
            actor_id = %request.actor_id,
            intent = %plan.intent,
            required_actions = ?plan.required_actions,
            "pipeline run started"
        );

        // Confirmation is the escalation grant: a confirmed request may rise
        // to the plan's required level before enforcement. An unconfirmed
        // request that needed confirmation stays at the floor and blocks.
        let escalated =
            self.engine
                .escalate(trust_before, &plan.required_actions, user_confirmed);

        let enforcement = self.engine.enforce(
            escalated,
            &plan.required_actions,
            user_confirmed,
            &snapshot,
        );

        let (verdict, report, trust_after) = match enforcement {
            EnforcementResult::Blocked(block) => {
                // Nothing ran; trust never left the floor.
                (Verdict::from_enforcement(block), ExecutionReport::default(), trust_before)
            }
            EnforcementResult::Allowed => {
                let report = self.executor.execute(
                    &request.actor_id,
                    &plan.required_actions,
                    &request.action_args,
                );
                // The downgrade law applies whenever anything ran: any
                // failure resets to L0, an all-success batch settles at L1.
                let trust_after = if report.outcomes.is_empty() {
                    escalated
                } else {
                    self.engine.downgrade_on_failure(&report.statuses())
                };
                let verdict = self.governor.validate(&plan, &report);
                (verdict, report, trust_after)
            }
        };

        let narrative = self.narrator.narrate(&plan, &report, &verdict);
        let duration_ms = started.elapsed().as_millis() as u64;

        self.append_audit(
            request_id,
            &request.actor_id,
            &plan,
            trust_before,
            trust_after,
            &verdict,
            &report,
            duration_ms,
        );

        info!(
            %request_id,
            approved = verdict.is_approved(),
            trust_after = %trust_after,
            duration_ms,
            "pipeline run finished"
        );

        Ok(PipelineResponse {
            request_id,
            text: narrative.text,
            was_blocked: narrative.was_blocked,
            block_reason: verdict.reason(),
            evidence_summary: narrative.evidence_summary,
            trust_level: trust_after,
            intent: plan.intent.as_str().to_string(),
            duration_ms,
        })
    }

    /// Best effort: an audit write failure is logged, never surfaced — the
    /// user already got a truthful answer.
    #[allow(clippy::too_many_arguments)]
    fn append_audit(
        &self,
        request_id: Uuid,
        actor_id: &str,
        plan: &ExecutionPlan,
        trust_before: TrustLevel,
        trust_after: TrustLevel,
        verdict: &Verdict,
        report: &ExecutionReport,
        duration_ms: u64,
    ) {
        let Some(trail) = &self.audit else {
            return;
        };

        let mut record =
            AuditRecord::new(actor_id, plan.intent.as_str()).with_request_id(request_id);
        record.required_actions = plan.required_actions.clone();
        record.trust_before = trust_before.as_str().to_string();
        record.trust_after = trust_after.as_str().to_string();
        record.sensitive = self.engine.table().is_sensitive(&plan.required_actions);
        record.verdict = match verdict {
            Verdict::Approved => VerdictSummary::Approved,
            Verdict::Blocked { reason, .. } => VerdictSummary::Blocked {
                reason: reason.as_str().to_string(),
            },
        };
        record.outcomes = report
            .outcomes
            .iter()
            .map(|o| OutcomeSummary {
                action: o.action.clone(),
                succeeded: o.succeeded,
                evidence: serde_json::to_value(&o.evidence).unwrap_or(Value::Null),
                error: o.error.clone(),
                executed_at: o.executed_at,
            })
            .collect();
        record.duration_ms = duration_ms;

        match trail.lock() {
            Ok(mut trail) => {
                if let Err(err) = trail.append(&mut record) {
                    warn!(%request_id, error = %err, "audit append failed");
                }
            }
            Err(_) => warn!(%request_id, "audit trail lock poisoned, record dropped"),
        }
    }
}
