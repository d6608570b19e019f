//! Link and record operations.
//!
//! Operations that change many links or records follow a plan-execute
//! pattern, separating planning from execution to enable dry-run mode,
//! better testing, and clear reporting.
//!
//! # Architecture
//!
//! Operations are split into two phases:
//! 1. **Planning**: Scans links or records and builds an [`OperationPlan`]
//! 2. **Execution**: [`PlanExecutor`] performs the filesystem changes
//!
//! `import` is the exception: recreation goes through the
//! [`BatchCoordinator`](crate::batch::BatchCoordinator), which has its own
//! dry-run mode.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use symkeep::operations::convert::{plan_convert, ConvertOptions};
//! use symkeep::operations::PlanExecutor;
//! use symkeep::path::{HostContext, PathResolver};
//!
//! let resolver = PathResolver::new(Arc::new(HostContext::detect()));
//!
//! // Generate plan
//! let plan = plan_convert(Path::new("/srv/links"), &resolver, &ConvertOptions::default())?;
//!
//! // Execute plan
//! let result = PlanExecutor::new().execute(&plan);
//! assert!(result.success);
//! # Ok::<(), symkeep::Error>(())
//! ```

pub mod check;
pub mod convert;
pub mod executor;
pub mod export;
pub mod import;
pub mod plan;
pub mod rebase;
pub mod scan;

#[cfg(all(test, unix, feature = "property-tests"))]
mod proptests;

pub use check::{check_links, CheckEntry, CheckOptions, CheckReport, LinkStatus};
pub use convert::{plan_convert, plan_mirror, ConvertOptions};
pub use executor::{backup_path, ExecutionResult, PlanExecutor};
pub use export::{create_record, export_link, ExportOptions};
pub use import::{find_records, import_records, FoundRecord, ImportOptions, ImportResult};
pub use plan::{OperationPlan, PlanAction};
pub use rebase::{plan_rebase_links, plan_rebase_records, RebaseOptions};
pub use scan::{inspect, scan_links, LinkInfo};
