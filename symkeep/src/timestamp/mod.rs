//! Timestamp capture, strategy resolution and application.
//!
//! A record stores the link's and the target's timestamps separately.
//! At recreation time a [`TimestampStrategy`] picks which of them the new
//! link receives:
//!
//! | strategy       | source                                             |
//! |----------------|----------------------------------------------------|
//! | `current`      | the moment of recreation                           |
//! | `symlink`      | the captured link object                           |
//! | `target`       | the (live or captured) target, else the link       |
//! | `preserve-all` | per field, the target first and then the link      |
//!
//! Failing to apply timestamps never fails a recreation; callers turn
//! errors from [`apply()`] into warnings.

pub mod apply;
pub mod capture;
pub mod policy;

pub use apply::apply;
pub use capture::capture;
pub use policy::{
    resolve, ApplyPlan, CapturedTimestamps, PlannedTime, TimestampField, TimestampSet,
    TimestampSource, TimestampStrategy,
};
