//! # tg-audit
//!
//! Append-only audit trail for Truthgate pipeline runs.
//!
//! Every request — approved or blocked — leaves exactly one
//! [`AuditRecord`] in a JSONL (JSON Lines) log: intent, required actions,
//! trust level before and after, verdict, per-action outcome summaries
//! and timings. Records are hash-chained with SHA-256 so insertion,
//! deletion or modification of any line is detectable, and they are never
//! mutated after write.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use tg_audit::{AuditRecord, AuditTrail};
//!
//! let mut trail = AuditTrail::open("/tmp/truthgate-audit.jsonl").unwrap();
//! let mut record = AuditRecord::new("actor-1", "send_message");
//! trail.append(&mut record).unwrap();
//! ```

pub mod error;
pub mod record;
pub mod trail;

pub use error::AuditError;
pub use record::{AuditRecord, OutcomeSummary, VerdictSummary};
pub use trail::AuditTrail;
