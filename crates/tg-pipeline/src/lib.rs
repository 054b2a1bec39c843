//! # tg-pipeline
//!
//! The Truthgate request pipeline: plan → enforce → execute → validate
//! evidence → narrate.
//!
//! The pipeline's one promise: **never report an unauthorized or
//! unverified action as done.** The [`Planner`] decides what must run, the
//! authority engine decides whether it may run, the [`Executor`] runs it
//! and collects evidence, the [`Governor`] is the only component that can
//! say "approved", and the [`Narrator`] is the only component that can
//! speak to the user — strictly from checked evidence. The
//! [`PipelineCoordinator`] wires one request through all of them and
//! leaves an audit record behind.

pub mod coordinator;
pub mod error;
pub mod executor;
pub mod governor;
pub mod narrator;
pub mod plan;
pub mod planner;
pub mod report;
pub mod verdict;

pub use coordinator::{PipelineCoordinator, PipelineRequest, PipelineResponse};
pub use error::PipelineError;
pub use executor::{
    actions_missing_evidence, merged_evidence, validate_evidence, Executor, DEFAULT_ACTION_TIMEOUT,
};
pub use governor::{EvidenceRule, EvidenceRules, Governor};
pub use narrator::{NarrativeResponse, Narrator};
pub use plan::{ExecutionPlan, Intent};
pub use planner::{CueRule, Planner};
pub use report::{ActionOutcome, ExecutionReport};
pub use verdict::{ReasonCode, Verdict};
