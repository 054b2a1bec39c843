//! # tg-actions
//!
//! The seam between the Truthgate core and its external collaborators:
//! the action-execution subsystem and the intent classifier. Both are
//! black boxes to the core — this crate defines the traits they implement
//! and the raw result shapes they return.
//!
//! It also owns the evidence side of the contract: which identifier
//! fields each action family yields ([`EvidenceExtractor`]) and which
//! actions are exempt from producing evidence ([`EvidenceExemptions`]).
//! The exemption set is data — adding an action never means new code.

pub mod classify;
pub mod evidence;
pub mod runner;

pub use classify::{IntentClassification, IntentClassifier, IntentType};
pub use evidence::{EvidenceExemptions, EvidenceExtractor, EvidenceMap};
pub use runner::{ActionError, ActionResult, ActionRunner};
