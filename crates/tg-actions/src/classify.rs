// classify.rs — Intent classification seam.
//
// Natural-language classification happens outside the core. The core
// receives an intent label, a confidence and a list of suggested action
// names, and treats all of it as advisory: the Planner's lexical rules win
// whenever they disagree for clearly transactional language.

use serde::{Deserialize, Serialize};

/// The broad category of knowledge or action a message calls for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    /// Answerable from stable knowledge; no live data needed.
    Stable,
    /// Needs fresh external data (news, prices, weather, availability).
    TimeSensitive,
    /// Asks the system to act on the user's behalf.
    Transactional,
    /// Asks the system to verify or look something up.
    Verification,
}

/// The classifier's advisory view of one user message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentClassification {
    /// Broad category of the message.
    pub intent_type: IntentType,
    /// Classifier confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    /// Action names the classifier believes the message needs.
    #[serde(default)]
    pub suggested_actions: Vec<String>,
}

impl IntentClassification {
    /// A low-confidence stable classification — the safe fallback when no
    /// classifier is wired in.
    pub fn stable_default() -> Self {
        Self {
            intent_type: IntentType::Stable,
            confidence: 0.0,
            suggested_actions: Vec::new(),
        }
    }
}

/// Pluggable external intent classifier.
pub trait IntentClassifier: Send + Sync {
    /// Classify one user message.
    fn classify(&self, text: &str) -> IntentClassification;
}
