//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `export`: Capture one link into a record file
//! - `create`: Write a record for a target without a link
//! - `import`: Recreate links from record files
//! - `scan`: List links under a directory
//! - `convert`: Capture every link under a directory into sibling records
//! - `mirror`: Capture every link under a directory into another tree
//! - `execute`: Perform a record's execution mode
//! - `check`: Report and repair broken links
//! - `rebase`: Rewrite link or record targets
//! - `config`: View and edit configuration files
//! - `completions`: Generate shell completion scripts

pub mod check;
pub mod completions;
pub mod config;
pub mod convert;
pub mod create;
pub mod execute;
pub mod export;
pub mod import;
pub mod mirror;
pub mod rebase;
pub mod scan;

pub use check::CheckCommand;
pub use completions::CompletionsCommand;
pub use config::ConfigCommand;
pub use convert::ConvertCommand;
pub use create::CreateCommand;
pub use execute::ExecuteCommand;
pub use export::ExportCommand;
pub use import::ImportCommand;
pub use mirror::MirrorCommand;
pub use rebase::RebaseCommand;
pub use scan::ScanCommand;
