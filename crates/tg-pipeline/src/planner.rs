// planner.rs — Free text + advisory classification → execution plan.
//
// The Planner thinks, it never speaks and never executes. Required actions
// come from a declarative cue table (verb cue + object cue → action), with
// the external classifier's suggestions filling in only when the lexical
// rules produce nothing. The mapping is total: every input yields a plan,
// possibly one with zero actions.
//
// Trust level and confirmation are looked up through the authority
// engine's policy table at planning time — never hard-coded here.

use tracing::debug;

use tg_actions::{IntentClassification, IntentType};
use tg_policy::AuthorityEngine;

use crate::plan::{ExecutionPlan, Intent};

/// One lexical rule: a verb cue plus an object cue imply an action.
///
/// Rules are grouped: within a group, only the first matching rule fires,
/// so "send + message" shadows "read + message" for the same sentence.
/// `vetoes` let a rule stand down when the text is clearly about an
/// internal domain (a "search my email" request is not a web search).
#[derive(Debug, Clone)]
pub struct CueRule {
    /// Group name; at most one rule per group matches.
    pub group: &'static str,
    /// Verb cues — at least one must appear in the text.
    pub cues: &'static [&'static str],
    /// Object cues — at least one must appear; empty means none required.
    pub objects: &'static [&'static str],
    /// Stop words — if any appears, this rule does not match.
    pub vetoes: &'static [&'static str],
    /// The action this rule requires.
    pub action: &'static str,
}

impl CueRule {
    fn matches(&self, text: &str) -> bool {
        if self.vetoes.iter().any(|v| text.contains(v)) {
            return false;
        }
        let cue_hit = self.cues.iter().any(|c| text.contains(c));
        let object_hit = self.objects.is_empty() || self.objects.iter().any(|o| text.contains(o));
        cue_hit && object_hit
    }
}

/// Object cues for the internal domains, used to veto web search.
const INTERNAL_OBJECTS: &[&str] = &[
    "message", "email", "mail", "inbox", "event", "meeting", "appointment", "calendar", "record",
    "contact",
];

/// The default cue table. Order matters within each group.
const DEFAULT_RULES: &[CueRule] = &[
    // Messaging — sends shadow reads.
    CueRule {
        group: "messaging",
        cues: &["send", "write", "compose", "reply"],
        objects: &["message", "email", "mail"],
        vetoes: &[],
        action: "send_message",
    },
    CueRule {
        group: "messaging",
        cues: &["check", "show", "list", "read", "search", "find", "any new", "look at", "latest"],
        objects: &["message", "email", "mail", "inbox"],
        vetoes: &[],
        action: "list_messages",
    },
    // Calendar — creates shadow reads.
    CueRule {
        group: "calendar",
        cues: &["create", "schedule", "add", "book", "set up", "put"],
        objects: &["event", "meeting", "appointment", "calendar"],
        vetoes: &[],
        action: "create_event",
    },
    CueRule {
        group: "calendar",
        cues: &["what", "show", "list", "do i have", "upcoming", "check"],
        objects: &["event", "meeting", "appointment", "calendar", "schedule"],
        vetoes: &[],
        action: "list_events",
    },
    // Record store.
    CueRule {
        group: "records",
        cues: &["show", "list", "find", "look up", "get"],
        objects: &["record", "contact"],
        vetoes: &[],
        action: "list_records",
    },
    // Web search — stands down for anything clearly internal.
    CueRule {
        group: "search",
        cues: &["search", "look up", "find out", "what is", "how does", "research", "latest news"],
        objects: &[],
        vetoes: INTERNAL_OBJECTS,
        action: "web_search",
    },
];

/// Builds one [`ExecutionPlan`] per request.
#[derive(Debug, Clone)]
pub struct Planner {
    rules: Vec<CueRule>,
}

impl Planner {
    /// A planner with the default cue table.
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
        }
    }

    /// A planner with a replacement cue table.
    pub fn with_rules(rules: Vec<CueRule>) -> Self {
        Self { rules }
    }

    /// Analyze one message and produce its plan.
    ///
    /// Total: never fails, never returns an error — a message that implies
    /// nothing yields a plan with zero required actions.
    pub fn plan(
        &self,
        user_text: &str,
        classification: &IntentClassification,
        engine: &AuthorityEngine,
    ) -> ExecutionPlan {
        let text = user_text.to_lowercase();

        let required_actions = self.required_actions(&text, classification, engine);
        let intent = derive_intent(&required_actions, classification);

        // Policy is derived, never restated: the engine's table is the only
        // source of trust levels and confirmation requirements.
        let required_trust_level = engine.table().required_level(&required_actions);
        let requires_confirmation = engine.table().requires_confirmation(&required_actions);

        debug!(
            %intent,
            ?required_actions,
            %required_trust_level,
            requires_confirmation,
            "plan generated"
        );

        let plan_steps = plan_steps(intent, &required_actions);
        let reasoning = reasoning(intent, &required_actions, required_trust_level, requires_confirmation);

        ExecutionPlan {
            intent,
            required_actions,
            // Reserved for best-effort augmentation; part of the contract.
            optional_actions: Vec::new(),
            required_trust_level,
            requires_confirmation,
            plan_steps,
            reasoning,
            classification: classification.clone(),
        }
    }

    /// Lexical cues first; classifier suggestions only when the cues are silent.
    fn required_actions(
        &self,
        text: &str,
        classification: &IntentClassification,
        engine: &AuthorityEngine,
    ) -> Vec<String> {
        let mut actions: Vec<String> = Vec::new();
        let mut matched_groups: Vec<&str> = Vec::new();

        for rule in &self.rules {
            if matched_groups.contains(&rule.group) {
                continue;
            }
            if rule.matches(text) {
                actions.push(rule.action.to_string());
                matched_groups.push(rule.group);
            }
        }

        if actions.is_empty() {
            // Lexical cues were insufficient — fall back to the classifier's
            // suggestions, but only for actions the policy table knows.
            let live_lookup = classification.intent_type == IntentType::TimeSensitive
                || classification.intent_type == IntentType::Verification;
            if live_lookup {
                for suggested in &classification.suggested_actions {
                    if engine.table().knows(suggested) && !actions.contains(suggested) {
                        actions.push(suggested.clone());
                    }
                }
            }
        }

        actions
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

/// The primary intent implied by the required actions (first action wins),
/// falling back to the classification for action-free messages.
fn derive_intent(actions: &[String], classification: &IntentClassification) -> Intent {
    if let Some(first) = actions.first() {
        return match first.as_str() {
            "send_message" => Intent::SendMessage,
            "list_messages" | "read_message" => Intent::ListMessages,
            "create_event" | "update_event" | "delete_event" => Intent::CreateEvent,
            "list_events" | "get_event" => Intent::ListEvents,
            "web_search" => Intent::WebSearch,
            a if a.contains("record") => Intent::RecordLookup,
            _ => Intent::GeneralQuery,
        };
    }
    match classification.intent_type {
        IntentType::Stable => Intent::KnowledgeQuery,
        _ => Intent::GeneralQuery,
    }
}

fn plan_steps(intent: Intent, actions: &[String]) -> Vec<String> {
    let mut steps = vec![format!("identified intent: {intent}")];
    if !actions.is_empty() {
        steps.push(format!("run required actions: {}", actions.join(", ")));
    }
    steps.push("validate execution evidence".to_string());
    steps.push("narrate from verified results only".to_string());
    steps
}

fn reasoning(
    intent: Intent,
    actions: &[String],
    level: tg_policy::TrustLevel,
    needs_confirm: bool,
) -> String {
    let mut reasoning = format!("intent \"{intent}\" requires trust level {level}.");
    if !actions.is_empty() {
        reasoning.push_str(&format!(" required actions: {}.", actions.join(", ")));
    }
    if needs_confirm {
        reasoning.push_str(" user confirmation required before execution.");
    }
    reasoning
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_policy::{CapabilityMap, PolicyTable, TrustLevel};

    fn engine() -> AuthorityEngine {
        AuthorityEngine::new(PolicyTable::default(), CapabilityMap::default())
    }

    fn classification(intent_type: IntentType, suggested: &[&str]) -> IntentClassification {
        IntentClassification {
            intent_type,
            confidence: 0.9,
            suggested_actions: suggested.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn send_plus_message_plans_a_send() {
        let plan = Planner::new().plan(
            "Please send a message to Maria about the launch",
            &classification(IntentType::Transactional, &[]),
            &engine(),
        );
        assert_eq!(plan.intent, Intent::SendMessage);
        assert_eq!(plan.required_actions, vec!["send_message"]);
        assert_eq!(plan.required_trust_level, TrustLevel::L2);
        assert!(plan.requires_confirmation);
    }

    #[test]
    fn send_shadows_read_within_messaging() {
        let plan = Planner::new().plan(
            "write an email and send it",
            &classification(IntentType::Transactional, &[]),
            &engine(),
        );
        assert_eq!(plan.required_actions, vec!["send_message"]);
    }

    #[test]
    fn check_inbox_plans_a_list() {
        let plan = Planner::new().plan(
            "check my inbox for anything new",
            &classification(IntentType::Transactional, &[]),
            &engine(),
        );
        assert_eq!(plan.intent, Intent::ListMessages);
        assert_eq!(plan.required_actions, vec!["list_messages"]);
    }

    #[test]
    fn schedule_meeting_plans_create_event() {
        let plan = Planner::new().plan(
            "schedule a meeting with the design team tomorrow",
            &classification(IntentType::Transactional, &[]),
            &engine(),
        );
        assert_eq!(plan.intent, Intent::CreateEvent);
        assert_eq!(plan.required_actions, vec!["create_event"]);
        assert!(plan.requires_confirmation);
    }

    #[test]
    fn calendar_question_plans_list_events() {
        let plan = Planner::new().plan(
            "what meetings do I have this week?",
            &classification(IntentType::Transactional, &[]),
            &engine(),
        );
        assert_eq!(plan.intent, Intent::ListEvents);
        assert_eq!(plan.required_actions, vec!["list_events"]);
        assert!(!plan.requires_confirmation);
    }

    #[test]
    fn web_search_stands_down_for_internal_domains() {
        let plan = Planner::new().plan(
            "search my email for the contract",
            &classification(IntentType::Verification, &[]),
            &engine(),
        );
        assert!(!plan.required_actions.contains(&"web_search".to_string()));
        assert_eq!(plan.required_actions, vec!["list_messages"]);
    }

    #[test]
    fn plain_search_plans_web_search() {
        let plan = Planner::new().plan(
            "what is the current situation with the port strike",
            &classification(IntentType::TimeSensitive, &[]),
            &engine(),
        );
        assert_eq!(plan.intent, Intent::WebSearch);
        assert_eq!(plan.required_actions, vec!["web_search"]);
    }

    #[test]
    fn classifier_suggestions_fill_in_when_cues_are_silent() {
        let plan = Planner::new().plan(
            "anything happening in the markets",
            &classification(IntentType::TimeSensitive, &["web_search"]),
            &engine(),
        );
        assert_eq!(plan.required_actions, vec!["web_search"]);
    }

    #[test]
    fn unknown_suggestions_are_ignored() {
        let plan = Planner::new().plan(
            "hmm",
            &classification(IntentType::TimeSensitive, &["launch_rocket"]),
            &engine(),
        );
        assert!(plan.required_actions.is_empty());
    }

    #[test]
    fn lexical_cues_win_over_classifier_suggestions() {
        // Clearly transactional language: the classifier's search suggestion
        // is advisory and loses.
        let plan = Planner::new().plan(
            "send a message to the vendor",
            &classification(IntentType::TimeSensitive, &["web_search"]),
            &engine(),
        );
        assert_eq!(plan.required_actions, vec!["send_message"]);
    }

    #[test]
    fn action_free_stable_message_is_a_knowledge_query() {
        let plan = Planner::new().plan(
            "explain how trust levels work",
            &classification(IntentType::Stable, &[]),
            &engine(),
        );
        assert_eq!(plan.intent, Intent::KnowledgeQuery);
        assert!(plan.required_actions.is_empty());
        assert_eq!(plan.required_trust_level, TrustLevel::L0);
    }

    #[test]
    fn planning_is_total_and_never_panics() {
        let planner = Planner::new();
        for text in ["", "???", "síó weird ünïcode", "yes"] {
            let plan = planner.plan(text, &classification(IntentType::Stable, &[]), &engine());
            assert!(plan.optional_actions.is_empty());
        }
    }

    #[test]
    fn optional_actions_are_always_empty() {
        let plan = Planner::new().plan(
            "send a message to Maria",
            &classification(IntentType::Transactional, &[]),
            &engine(),
        );
        assert!(plan.optional_actions.is_empty());
    }
}
