//! Recreating live links from records.
//!
//! Each record runs through a fixed sequence of stages:
//!
//! ```text
//! Pending -> Resolving -> Creating -> TimestampApplying -> AttributeApplying -> Verified
//!                \            \
//!                 +-> Failed(kind) / Skipped(reason)
//! ```
//!
//! A destination that already holds a link to the same target ends
//! `Verified` straight from `Resolving` without touching the filesystem.
//! Timestamp and attribute failures are soft: they become warnings on an
//! otherwise successful outcome.

#[allow(clippy::module_inception)]
mod engine;
pub mod fs;
pub mod locks;
pub mod state;

pub use engine::{Placement, RecreationEngine, Request};
pub use locks::{CancelToken, PathLocks, Slot};
pub use state::{Outcome, RecreationState, SkipReason, TerminalState};
