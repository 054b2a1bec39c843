//! # tg-policy
//!
//! Trust levels, policy table and authority enforcement for Truthgate.
//!
//! Implements the request-scoped authority model: every request starts at
//! [`TrustLevel::L0`], the [`PolicyTable`] declares the minimum level and
//! confirmation requirement per action, and the [`AuthorityEngine`] decides
//! whether a set of actions may be attempted at all.
//!
//! ## Key invariants
//!
//! - **Fail closed**: an action name with no policy record resolves to the
//!   maximum trust level and requires confirmation.
//! - **Capability is the supreme law**: a capability-disabled action blocks
//!   regardless of trust level or confirmation.
//! - **Hard downgrade**: one failed action in a batch resets trust to L0;
//!   an all-success batch never retains more than L1.
//! - **No persistence**: trust levels live inside one request and are never
//!   carried across requests.

pub mod capability;
pub mod confirm;
pub mod engine;
pub mod error;
pub mod level;
pub mod table;

pub use capability::{CapabilityMap, CapabilitySnapshot, CapabilitySource, FileCapabilitySource};
pub use confirm::ConfirmationDetector;
pub use engine::{ActionStatus, AuthorityEngine, EnforcementBlock, EnforcementResult};
pub use error::PolicyError;
pub use level::TrustLevel;
pub use table::{PolicyRecord, PolicyTable};
