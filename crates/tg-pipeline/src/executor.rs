// executor.rs — Runs required actions and collects evidence.
//
// The Executor does, it never judges and never speaks. Actions run
// sequentially in plan order; a failure is recorded and execution moves
// on, so the Governor always sees one outcome per required action. Each
// attempt runs under a bounded timeout; a timed-out action is a failed
// outcome, never a hung pipeline.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use tg_actions::{ActionRunner, EvidenceExemptions, EvidenceExtractor, EvidenceMap};

use crate::report::{ActionOutcome, ExecutionReport};

/// Default bound on a single action attempt.
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Sequential action executor with per-action timeout and evidence capture.
pub struct Executor {
    runner: Arc<dyn ActionRunner>,
    extractor: EvidenceExtractor,
    exemptions: EvidenceExemptions,
    timeout: Duration,
}

impl Executor {
    pub fn new(runner: Arc<dyn ActionRunner>) -> Self {
        Self {
            runner,
            extractor: EvidenceExtractor::default(),
            exemptions: EvidenceExemptions::default(),
            timeout: DEFAULT_ACTION_TIMEOUT,
        }
    }

    /// Replace the per-action timeout bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the evidence exemption set.
    pub fn with_exemptions(mut self, exemptions: EvidenceExemptions) -> Self {
        self.exemptions = exemptions;
        self
    }

    pub fn exemptions(&self) -> &EvidenceExemptions {
        &self.exemptions
    }

    /// Run every required action in order and report what happened.
    ///
    /// Runner errors never escape: each becomes a failed [`ActionOutcome`].
    /// Evidence is extracted only from successful outputs.
    pub fn execute(
        &self,
        actor_id: &str,
        required_actions: &[String],
        args: &HashMap<String, Value>,
    ) -> ExecutionReport {
        let mut outcomes = Vec::with_capacity(required_actions.len());
        for action in required_actions {
            let action_args = args.get(action.as_str()).cloned().unwrap_or(Value::Null);
            outcomes.push(self.attempt(actor_id, action, action_args));
        }
        ExecutionReport::from_outcomes(outcomes)
    }

    fn attempt(&self, actor_id: &str, action: &str, args: Value) -> ActionOutcome {
        let started = Instant::now();
        let (tx, rx) = mpsc::channel();
        let runner = Arc::clone(&self.runner);
        let actor = actor_id.to_string();
        let name = action.to_string();

        // The runner call happens on its own thread so a stuck backend
        // costs one timeout, not the whole request. If the attempt does
        // outlive the timeout, the thread finishes in the background and
        // its result is dropped with the sender.
        thread::spawn(move || {
            let result = runner.run_action(&actor, &name, &args);
            let _ = tx.send(result);
        });

        let elapsed_ms = |started: Instant| started.elapsed().as_millis() as u64;

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(result)) if result.success => {
                let evidence = self.extractor.extract(action, &result.data);
                debug!(action, evidence_keys = evidence.len(), "action succeeded");
                ActionOutcome {
                    action: action.to_string(),
                    succeeded: true,
                    evidence,
                    raw_output: result.data,
                    error: None,
                    executed_at: Utc::now(),
                    duration_ms: elapsed_ms(started),
                }
            }
            Ok(Ok(result)) => {
                let message = result
                    .error
                    .unwrap_or_else(|| "action reported failure".to_string());
                warn!(action, error = %message, "action failed");
                ActionOutcome::failure(action, message, elapsed_ms(started))
            }
            Ok(Err(err)) => {
                warn!(action, error = %err, "action errored");
                ActionOutcome::failure(action, err.to_string(), elapsed_ms(started))
            }
            Err(_) => {
                warn!(action, timeout_ms = self.timeout.as_millis() as u64, "action timed out");
                ActionOutcome::failure(
                    action,
                    format!("timed out after {}ms", self.timeout.as_millis()),
                    elapsed_ms(started),
                )
            }
        }
    }
}

/// True iff every successful, non-exempt outcome carries evidence.
pub fn validate_evidence(outcomes: &[ActionOutcome], exemptions: &EvidenceExemptions) -> bool {
    actions_missing_evidence(outcomes, exemptions).is_empty()
}

/// The successful, non-exempt actions whose evidence map came back empty.
pub fn actions_missing_evidence(
    outcomes: &[ActionOutcome],
    exemptions: &EvidenceExemptions,
) -> Vec<String> {
    outcomes
        .iter()
        .filter(|o| o.succeeded && !exemptions.is_exempt(&o.action) && o.evidence.is_empty())
        .map(|o| o.action.clone())
        .collect()
}

/// Evidence keys across all successful outcomes, for narration summaries.
pub fn merged_evidence(outcomes: &[ActionOutcome]) -> EvidenceMap {
    let mut merged = EvidenceMap::new();
    for outcome in outcomes.iter().filter(|o| o.succeeded) {
        for (key, value) in &outcome.evidence {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tg_actions::{ActionError, ActionResult};

    struct ScriptedRunner;

    impl ActionRunner for ScriptedRunner {
        fn run_action(
            &self,
            _actor_id: &str,
            action: &str,
            _args: &Value,
        ) -> Result<ActionResult, ActionError> {
            match action {
                "send_message" => Ok(ActionResult::ok(json!({ "message_id": "m-1" }))),
                "list_events" => Ok(ActionResult::ok(json!({ "events": [] }))),
                "create_event" => Ok(ActionResult::failed("calendar backend unavailable")),
                "slow_probe" => {
                    thread::sleep(Duration::from_millis(200));
                    Ok(ActionResult::ok(json!({})))
                }
                other => Err(ActionError::UnknownAction(other.to_string())),
            }
        }
    }

    fn executor() -> Executor {
        Executor::new(Arc::new(ScriptedRunner))
    }

    #[test]
    fn success_captures_evidence_and_raw_output() {
        let report = executor().execute("u-1", &["send_message".to_string()], &HashMap::new());
        let outcome = &report.outcomes[0];
        assert!(outcome.succeeded);
        assert_eq!(outcome.evidence["message_id"], json!("m-1"));
        assert_eq!(outcome.raw_output["message_id"], json!("m-1"));
        assert!(report.all_succeeded);
    }

    #[test]
    fn failure_is_recorded_and_execution_continues() {
        let actions = vec!["create_event".to_string(), "list_events".to_string()];
        let report = executor().execute("u-1", &actions, &HashMap::new());
        assert_eq!(report.outcomes.len(), 2);
        assert!(!report.outcomes[0].succeeded);
        assert!(report.outcomes[1].succeeded);
        assert_eq!(report.failed_actions, vec!["create_event"]);
    }

    #[test]
    fn runner_error_becomes_failed_outcome() {
        let report = executor().execute("u-1", &["nonexistent".to_string()], &HashMap::new());
        let outcome = &report.outcomes[0];
        assert!(!outcome.succeeded);
        assert!(outcome.error.as_deref().unwrap_or("").contains("nonexistent"));
    }

    #[test]
    fn slow_action_times_out_as_failure() {
        let executor = executor().with_timeout(Duration::from_millis(20));
        let report = executor.execute("u-1", &["slow_probe".to_string()], &HashMap::new());
        let outcome = &report.outcomes[0];
        assert!(!outcome.succeeded);
        assert!(outcome.error.as_deref().unwrap_or("").contains("timed out"));
    }

    #[test]
    fn empty_list_evidence_is_fine_for_exempt_actions() {
        let report = executor().execute("u-1", &["list_events".to_string()], &HashMap::new());
        let exemptions = EvidenceExemptions::default();
        assert!(validate_evidence(&report.outcomes, &exemptions));
    }

    #[test]
    fn missing_evidence_flags_only_non_exempt_successes() {
        let outcomes = vec![
            ActionOutcome {
                action: "send_message".to_string(),
                succeeded: true,
                evidence: EvidenceMap::new(),
                raw_output: json!({}),
                error: None,
                executed_at: Utc::now(),
                duration_ms: 1,
            },
            ActionOutcome::failure("create_event", "down", 1),
        ];
        let missing = actions_missing_evidence(&outcomes, &EvidenceExemptions::default());
        // Failed actions are the tool_failed path, not the evidence path.
        assert_eq!(missing, vec!["send_message"]);
    }

    #[test]
    fn merged_evidence_skips_failed_outcomes() {
        let report = executor().execute(
            "u-1",
            &["send_message".to_string(), "create_event".to_string()],
            &HashMap::new(),
        );
        let merged = merged_evidence(&report.outcomes);
        assert_eq!(merged.get("message_id"), Some(&json!("m-1")));
        assert!(!merged.contains_key("event_id"));
    }
}
