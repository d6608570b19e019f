//! Batch recreation over many records.

pub mod coordinator;
pub mod report;

pub use coordinator::{BatchCoordinator, RecordInput};
pub use report::{BatchReport, Counts};
