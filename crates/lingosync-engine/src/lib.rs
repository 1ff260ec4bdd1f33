//! Per-locale metadata reconciliation engine for lingosync.
//!
//! The engine walks the target-locale catalog and, for each locale, runs two
//! independent tracks: app info (name, subtitle) and version content
//! (description, keywords, URLs). Each track reads the current remote state,
//! decides between create, update, and skip, and recovers from concurrent-edit
//! conflicts with a bounded sequence of fallbacks. A failure in one track
//! never blocks the other, and a failed locale never aborts the run.

pub mod engine;
pub mod error;
pub mod plan;

pub use engine::{CancelFlag, Reconciler, RunOptions, RunSummary, Tracks};
pub use error::{EngineError, Result};
pub use plan::{Category, PlanAction, ReconciliationPlan};
