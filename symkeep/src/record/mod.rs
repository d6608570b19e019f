//! Link records: the portable, self-describing form of one symbolic link.
//!
//! A [`LinkRecord`] is created from a live link ([`capture_link`]) or from a
//! target/name pair ([`record_for_target`]), persisted as JSON by
//! [`format`], and later consumed by the recreation engine. Records are
//! only rewritten through [`LinkRecord::rebase_target`] and
//! [`LinkRecord::set_embedded_config`], both of which append to the
//! record's history.

pub mod capture;
pub mod format;
pub mod invoke;
pub mod model;

pub use capture::{capture_link, record_for_target};
pub use invoke::{invoke, Invocation, Opener, RecordSummary, SystemOpener};
pub use model::{
    Attributes, EmbeddedConfig, ExecutionMode, HistoryEntry, HistoryReason, LinkRecord, PathRepr,
    TargetInfo, TargetKind, FORMAT_VERSION, RECORD_EXTENSION,
};
