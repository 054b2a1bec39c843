// narrator.rs — The only component that speaks to the user.
//
// Narration is a pure function of (plan, report, verdict). Blocked verdicts
// render a fixed, reason-keyed explanation. Approved verdicts render from
// the plan's intent and the checked evidence — never from unchecked model
// output. Dispatch over intents is a closed match with an explicit honest
// default: an intent with no evidence-backed renderer says "could not
// complete", it never guesses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::executor::merged_evidence;
use crate::plan::{ExecutionPlan, Intent};
use crate::report::ExecutionReport;
use crate::verdict::{ReasonCode, Verdict};

/// What the user sees, plus the evidence it was rendered from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeResponse {
    /// The user-facing text.
    pub text: String,
    /// Whether this narrates a blocked verdict.
    pub was_blocked: bool,
    /// The evidence the approved text was derived from; null when blocked.
    pub evidence_summary: Value,
}

/// Renders verdicts into user-facing text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Narrator;

impl Narrator {
    pub fn new() -> Self {
        Narrator
    }

    pub fn narrate(
        &self,
        plan: &ExecutionPlan,
        report: &ExecutionReport,
        verdict: &Verdict,
    ) -> NarrativeResponse {
        match verdict {
            Verdict::Blocked { reason, detail } => NarrativeResponse {
                text: blocked_text(*reason, detail),
                was_blocked: true,
                evidence_summary: Value::Null,
            },
            Verdict::Approved => {
                let evidence = merged_evidence(&report.outcomes);
                let summary =
                    serde_json::to_value(&evidence).unwrap_or(Value::Null);
                NarrativeResponse {
                    text: approved_text(plan.intent, report),
                    was_blocked: false,
                    evidence_summary: summary,
                }
            }
        }
    }
}

/// Fixed, reason-keyed explanations. No speculation about what "might have"
/// happened — only what was checked.
fn blocked_text(reason: ReasonCode, detail: &Value) -> String {
    match reason {
        ReasonCode::CapabilityDisabled => {
            let families = join_strings(&detail["disabled_families"]);
            if families.is_empty() {
                "I can't do that right now: the required capability is disabled.".to_string()
            } else {
                format!(
                    "I can't do that right now: the following capabilities are disabled: {families}."
                )
            }
        }
        ReasonCode::AuthorityInsufficient => format!(
            "I don't have sufficient authority for that (have {}, need {}).",
            detail["current_level"].as_str().unwrap_or("l0"),
            detail["required_level"].as_str().unwrap_or("l3"),
        ),
        ReasonCode::ConfirmationRequired => {
            let prompt = detail["confirmation_prompt"]
                .as_str()
                .unwrap_or("Do you confirm this action?");
            format!("Before I proceed, I need your confirmation. {prompt}")
        }
        ReasonCode::MissingTools => {
            let actions = join_strings(&detail["missing_actions"]);
            format!("I couldn't complete this: required steps were never run ({actions}).")
        }
        ReasonCode::ToolFailed => {
            let failed: Vec<String> = detail["failed_actions"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|f| f["action"].as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            format!(
                "I tried, but it didn't go through: {} failed. Nothing was reported as done.",
                failed.join(", ")
            )
        }
        ReasonCode::MissingEvidence => {
            let actions = join_strings(&detail["actions_missing_evidence"]);
            format!(
                "I can't confirm this actually happened ({actions} returned no verifiable result), so I won't claim it did."
            )
        }
        ReasonCode::MessageIdMissing => {
            "The send may not have completed: no message ID came back, so I won't claim it was sent."
                .to_string()
        }
        ReasonCode::EventIdMissing => {
            "The calendar change may not have completed: no event ID came back, so I won't claim it was saved."
                .to_string()
        }
    }
}

/// Evidence-backed success renderers, one per intent. Anything without a
/// renderer falls through to the honest default.
fn approved_text(intent: Intent, report: &ExecutionReport) -> String {
    let evidence = merged_evidence(&report.outcomes);
    match intent {
        Intent::SendMessage => evidence
            .get("message_id")
            .and_then(Value::as_str)
            .map(|id| format!("Message sent. Message ID: {id}."))
            .unwrap_or_else(could_not_complete),
        Intent::ListMessages => {
            let items = list_items(report, "list_messages", "messages", &["subject", "from"]);
            match items {
                Some((0, _)) => "I checked your messages: nothing new.".to_string(),
                Some((count, lines)) if !lines.is_empty() => format!(
                    "You have {count} message(s):\n{}",
                    lines.join("\n")
                ),
                Some((count, _)) => format!("You have {count} message(s)."),
                None => could_not_complete(),
            }
        }
        Intent::CreateEvent => evidence
            .get("event_id")
            .and_then(Value::as_str)
            .map(|id| {
                let link = evidence.get("link").and_then(Value::as_str);
                match link {
                    Some(link) => format!("Event created (ID {id}). Link: {link}"),
                    None => format!("Event created (ID {id})."),
                }
            })
            .unwrap_or_else(could_not_complete),
        Intent::ListEvents => {
            let items = list_items(report, "list_events", "events", &["title", "start"]);
            match items {
                Some((0, _)) => "I checked your calendar: nothing scheduled.".to_string(),
                Some((count, lines)) if !lines.is_empty() => format!(
                    "You have {count} event(s):\n{}",
                    lines.join("\n")
                ),
                Some((count, _)) => format!("You have {count} event(s)."),
                None => could_not_complete(),
            }
        }
        Intent::WebSearch => {
            let results: Vec<String> = report
                .outcome_of("web_search")
                .map(|o| &o.raw_output["results"])
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .take(3)
                        .filter_map(|r| {
                            r["title"].as_str().or_else(|| r["url"].as_str()).map(|s| {
                                format!("- {s}")
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            if results.is_empty() {
                "I searched but found no usable results.".to_string()
            } else {
                format!("Here's what I found:\n{}", results.join("\n"))
            }
        }
        Intent::RecordLookup => {
            let count = evidence
                .get("count")
                .and_then(Value::as_u64)
                .or_else(|| {
                    evidence
                        .get("record_ids")
                        .and_then(Value::as_array)
                        .map(|a| a.len() as u64)
                });
            match count {
                Some(0) => "I checked the records: no matches.".to_string(),
                Some(n) => format!("I found {n} matching record(s)."),
                None => {
                    if evidence.contains_key("record_id") {
                        "I found the record you asked about.".to_string()
                    } else {
                        could_not_complete()
                    }
                }
            }
        }
        Intent::KnowledgeQuery | Intent::GeneralQuery => could_not_complete(),
    }
}

fn could_not_complete() -> String {
    "I could not complete an action for this request.".to_string()
}

/// Up to five display lines for a list action, plus the item count.
fn list_items(
    report: &ExecutionReport,
    action: &str,
    array_key: &str,
    label_keys: &[&str],
) -> Option<(usize, Vec<String>)> {
    let outcome = report.outcome_of(action)?;
    let items = outcome.raw_output[array_key].as_array()?;
    let lines = items
        .iter()
        .take(5)
        .filter_map(|item| {
            label_keys
                .iter()
                .find_map(|k| item[*k].as_str())
                .map(|label| format!("- {label}"))
        })
        .collect();
    Some((items.len(), lines))
}

fn join_strings(value: &Value) -> String {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}
