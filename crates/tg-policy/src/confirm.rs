// confirm.rs — Conservative detection of explicit user confirmation.
//
// A small, closed table of affirmative phrases. Ambiguous text must never
// count as confirmation — a false positive here authorizes an irreversible
// action, a false negative only costs the user one extra turn.
//
// The pattern list is configuration, not contract: `with_patterns` accepts
// a replacement set so the phrases can evolve (or be localized) without
// touching enforcement logic.

use regex::Regex;

use crate::error::PolicyError;

/// Default affirmative patterns, matched against lowercased, trimmed input.
///
/// Exact short tokens are anchored on both ends; the two templated forms
/// only accept an affirmative verb right after the opener.
const DEFAULT_PATTERNS: &[&str] = &[
    r"^yes$",
    r"^y$",
    r"^yes[.!]?$",
    r"^confirm$",
    r"^confirmed$",
    r"^ok$",
    r"^okay$",
    r"^go ahead$",
    r"^do it$",
    r"^send it$",
    r"^create it$",
    r"^proceed$",
    r"^yes,?\s+(send|create|do|go ahead|delete|update)\b",
    r"^confirm\s+(send|sending|create|creating|delete|deleting|update|updating)\b",
];

/// Detects explicit confirmation in free user text.
#[derive(Debug, Clone)]
pub struct ConfirmationDetector {
    patterns: Vec<Regex>,
}

impl ConfirmationDetector {
    /// Build a detector with a custom pattern set.
    pub fn with_patterns(patterns: &[&str]) -> Result<Self, PolicyError> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let regex = Regex::new(pattern).map_err(|e| PolicyError::InvalidConfirmPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            compiled.push(regex);
        }
        Ok(Self { patterns: compiled })
    }

    /// Whether the text is an explicit confirmation.
    pub fn is_confirmation(&self, text: &str) -> bool {
        let normalized = text.trim().to_lowercase();
        self.patterns.iter().any(|p| p.is_match(&normalized))
    }
}

impl Default for ConfirmationDetector {
    fn default() -> Self {
        // The built-in patterns are valid regexes.
        Self::with_patterns(DEFAULT_PATTERNS).unwrap_or(Self {
            patterns: Vec::new(),
        })
    }
}
