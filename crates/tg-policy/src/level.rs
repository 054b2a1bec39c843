// level.rs — Ordered trust levels.
//
// A trust level says how much autonomous action the system may take within
// the current request. Levels are request-scoped values: every request
// starts at L0 and nothing above L0 is ever persisted across requests.
// That is deliberate — privilege must be re-justified on every turn.

use serde::{Deserialize, Serialize};

/// How much autonomous action is currently permitted in a request.
///
/// Deriving `PartialOrd`/`Ord` gives us `<` comparisons in declaration
/// order, so `L0 < L1 < L2 < L3` holds without any hand-written logic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    /// Observer — may only answer and explain. The starting level of every request.
    L0,
    /// Informational — non-sensitive reads.
    L1,
    /// Supervised operator — sensitive reads and confirmed writes.
    L2,
    /// Limited autonomous operator — low-risk actions without confirmation.
    L3,
}

impl TrustLevel {
    /// The highest defined level. Unknown actions resolve to this (fail closed).
    pub const MAX: TrustLevel = TrustLevel::L3;

    /// The starting level of every request.
    pub const START: TrustLevel = TrustLevel::L0;

    /// Whether this level satisfies a required level.
    pub fn satisfies(self, required: TrustLevel) -> bool {
        self >= required
    }
}

impl TrustLevel {
    /// The wire spelling, identical to the serde form.
    pub fn as_str(self) -> &'static str {
        match self {
            TrustLevel::L0 => "l0",
            TrustLevel::L1 => "l1",
            TrustLevel::L2 => "l2",
            TrustLevel::L3 => "l3",
        }
    }
}

impl std::fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(TrustLevel::L0 < TrustLevel::L1);
        assert!(TrustLevel::L1 < TrustLevel::L2);
        assert!(TrustLevel::L2 < TrustLevel::L3);
    }

    #[test]
    fn satisfies_is_reflexive_and_monotone() {
        assert!(TrustLevel::L2.satisfies(TrustLevel::L2));
        assert!(TrustLevel::L3.satisfies(TrustLevel::L1));
        assert!(!TrustLevel::L0.satisfies(TrustLevel::L1));
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&TrustLevel::L2).unwrap();
        assert_eq!(json, "\"l2\"");
    }

    #[test]
    fn display_matches_wire_spelling() {
        assert_eq!(TrustLevel::L0.to_string(), "l0");
        assert_eq!(TrustLevel::L3.as_str(), "l3");
    }

    #[test]
    fn max_is_highest() {
        for level in [TrustLevel::L0, TrustLevel::L1, TrustLevel::L2, TrustLevel::L3] {
            assert!(TrustLevel::MAX >= level);
        }
    }
}
