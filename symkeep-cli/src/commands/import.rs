//! Import command implementation.
//!
//! This module implements the `import` command, which loads record files
//! and recreates their links through the batch coordinator.

use crate::error::CliError;
use crate::utils::{
    fail_on_failures, host_resolver, load_resolved, print_json, print_report, resolve_path,
    shorten_path, GlobalOptions,
};
use clap::Args;
use std::path::PathBuf;
use symkeep::operations::{find_records, import_records, ImportOptions};
use symkeep::path::PrefixRewrite;
use symkeep::{BatchCoordinator, Config, RecreationEngine, TimestampStrategy};

/// Recreation settings that override configuration files for one run.
#[derive(Args, Debug, Clone, Default)]
pub struct RecreateArgs {
    /// Timestamp strategy (current, symlink, target, preserve-all)
    #[arg(long, value_name = "STRATEGY")]
    pub timestamp_strategy: Option<TimestampStrategy>,

    /// Prefer the live target's timestamps over recorded ones
    #[arg(long)]
    pub use_live_target: bool,

    /// Search for moved targets of broken relative links
    #[arg(long)]
    pub fix_relative: bool,

    /// Replace links that point elsewhere (never regular files)
    #[arg(long)]
    pub force: bool,

    /// Create links whose target does not resolve on this host
    #[arg(long)]
    pub allow_broken: bool,

    /// Skip reading links back after creating them
    #[arg(long)]
    pub no_verify: bool,

    /// Rewrite target prefixes, as OLD:NEW
    #[arg(long, value_name = "OLD:NEW")]
    pub target_base: Option<PrefixRewrite>,

    /// Records processed at once
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Give up on a record after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

impl RecreateArgs {
    /// The flags that were given, as configuration overrides.
    pub fn overrides(&self) -> Config {
        Config {
            timestamp_strategy: self.timestamp_strategy,
            use_live_target: self.use_live_target.then_some(true),
            fix_relative: self.fix_relative.then_some(true),
            force: self.force.then_some(true),
            allow_broken: self.allow_broken.then_some(true),
            verify: self.no_verify.then_some(false),
            target_base_rewrite: self.target_base.clone(),
            concurrency_limit: self.concurrency,
            record_timeout_ms: self.timeout_ms,
            ..Default::default()
        }
    }
}

/// Recreate links from record files.
#[derive(Args)]
pub struct ImportCommand {
    /// Record files or directories to search (default: current directory)
    #[arg(value_name = "SOURCE")]
    pub sources: Vec<PathBuf>,

    /// Only search the top level of directories
    #[arg(long)]
    pub no_recursive: bool,

    /// Only import record files whose name matches this glob
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Recreate links under this directory instead of their recorded paths
    #[arg(long, value_name = "DIR")]
    pub target_location: Option<PathBuf>,

    /// Put every link directly in the target location
    #[arg(long, requires = "target_location")]
    pub flatten: bool,

    /// Resolve and plan only
    #[arg(long)]
    pub dry_run: bool,

    /// Delete record files whose link was recreated
    #[arg(long)]
    pub remove_records: bool,

    /// Note the recreation in each record's history
    #[arg(long, conflicts_with = "remove_records")]
    pub update_records: bool,

    #[command(flatten)]
    pub recreate: RecreateArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ImportCommand {
    /// Execute the import command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        // 1. Load configuration with flag overrides
        let config = load_resolved(global, self.recreate.overrides())?;
        let resolver = host_resolver(&config);

        // 2. Find record files
        let sources = if self.sources.is_empty() {
            vec![resolve_path(None)?]
        } else {
            self.sources
                .into_iter()
                .map(|p| resolve_path(Some(p)))
                .collect::<Result<Vec<_>, _>>()?
        };
        let recursive = config.recursive && !self.no_recursive;
        let found = find_records(&sources, recursive, self.pattern.as_deref())?;
        if found.is_empty() && !global.quiet {
            eprintln!("No record files found");
        }

        // 3. Recreate
        let options = ImportOptions {
            target_location: self.target_location.map(|p| resolve_path(Some(p))).transpose()?,
            flatten: self.flatten,
            remove_records: self.remove_records,
            update_records: self.update_records,
        };
        let coordinator = BatchCoordinator::new(RecreationEngine::new(resolver.clone()), config);
        let result = import_records(&found, resolver.host(), &coordinator, self.dry_run, &options)?;

        // 4. Report
        if self.json {
            print_json(&result)?;
        } else {
            print_report(&result.report, global);
            if !global.quiet {
                for path in &result.removed {
                    eprintln!("Removed {}", shorten_path(path));
                }
                for path in &result.updated {
                    eprintln!("Updated {}", shorten_path(path));
                }
                for warning in &result.warnings {
                    eprintln!("warning: {warning}");
                }
            }
        }

        fail_on_failures(&result.report)
    }
}
