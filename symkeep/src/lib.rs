#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # symkeep
//!
//! A library for preserving symbolic links as portable, self-describing
//! records that can be recreated on another machine, operating system or
//! filesystem layout.
//!
//! ## Core Types
//!
//! - [`PathResolver`] and [`HostContext`]: Cross-grammar path resolution
//! - [`LinkRecord`]: One serialized link
//! - [`TimestampStrategy`]: Which timestamps a recreated link receives
//! - [`RecreationEngine`] and [`BatchCoordinator`]: Recreating links
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use symkeep::{HostContext, PathResolver};
//! use symkeep::path::PathFlavor;
//!
//! let host = HostContext::windows().with_drive('Z', r"\\fileserver\projects").unwrap();
//! let resolver = PathResolver::new(Arc::new(host));
//!
//! assert_eq!(resolver.classify(r"\\fileserver\projects\a.txt"), PathFlavor::WindowsUnc);
//! assert_eq!(resolver.classify(r"Z:\a.txt"), PathFlavor::WindowsMappedDrive);
//! ```

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod operations;
pub mod path;
pub mod record;
pub mod timestamp;

// Re-export key types at crate root for convenience
pub use batch::{BatchCoordinator, BatchReport, RecordInput};
pub use config::{Config, ConfigBuilder, ResolvedConfig};
pub use engine::{Outcome, Placement, RecreationEngine, TerminalState};
pub use error::{Error, FailureKind, Result};
pub use logging::{init_logger, LogLevel, Logger};
pub use operations::{ExecutionResult, OperationPlan, PlanAction, PlanExecutor};
pub use path::{HostContext, PathResolver};
pub use record::{ExecutionMode, LinkRecord};
pub use timestamp::TimestampStrategy;
