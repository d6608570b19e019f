//! Rebase command implementation.
//!
//! Rewrites the targets of live links, or of record files with
//! `--records`, under a directory. Live links keep a `<link>.backup` link
//! at their old target.

use crate::error::CliError;
use crate::utils::{
    fail_on_plan_failures, host_resolver, load_resolved, print_execution, print_json,
    resolve_path, GlobalOptions,
};
use clap::{ArgGroup, Args};
use std::path::PathBuf;
use symkeep::operations::{plan_rebase_links, plan_rebase_records, RebaseOptions};
use symkeep::path::{PrefixRewrite, RebaseDirection};
use symkeep::{Config, PlanExecutor};

/// Rewrite link targets or record targets.
#[derive(Args)]
#[command(group(
    ArgGroup::new("change")
        .required(true)
        .multiple(true)
        .args(["relative", "absolute", "target_base"])
))]
pub struct RebaseCommand {
    /// Directory to rebase (default: current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Rewrite record files instead of live links
    #[arg(long)]
    pub records: bool,

    /// Convert absolute targets to relative ones
    #[arg(long, conflicts_with = "absolute")]
    pub relative: bool,

    /// Convert relative targets to absolute ones
    #[arg(long)]
    pub absolute: bool,

    /// Replace the prefix of absolute targets, as OLD:NEW
    #[arg(long, value_name = "OLD:NEW")]
    pub target_base: Option<PrefixRewrite>,

    /// Only rewrite targets that do not exist
    #[arg(long)]
    pub only_broken: bool,

    /// Only rebase the top level
    #[arg(long)]
    pub no_recursive: bool,

    /// Show what would be done without doing it
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RebaseCommand {
    fn direction(&self) -> Option<RebaseDirection> {
        if self.relative {
            Some(RebaseDirection::ToRelative)
        } else if self.absolute {
            Some(RebaseDirection::ToAbsolute)
        } else {
            None
        }
    }

    /// Execute the rebase command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_resolved(global, Config::default())?;
        let resolver = host_resolver(&config);

        let options = RebaseOptions {
            recursive: config.recursive && !self.no_recursive,
            direction: self.direction(),
            target_base: self.target_base.clone(),
            only_broken: self.only_broken,
        };
        let dir = resolve_path(self.dir)?;
        let plan = if self.records {
            plan_rebase_records(&dir, &resolver, &options)?
        } else {
            plan_rebase_links(&dir, &resolver, &options)?
        };

        let executor = if self.dry_run {
            PlanExecutor::new().dry_run()
        } else {
            PlanExecutor::new()
        };
        let result = executor.execute(&plan);

        if self.json {
            print_json(&result)?;
        } else {
            print_execution(&plan, &result, global);
        }
        fail_on_plan_failures(&result)
    }
}
