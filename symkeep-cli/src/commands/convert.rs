//! Convert command implementation.
//!
//! Captures every link under a directory into a record file next to it,
//! optionally removing the links afterwards.

use crate::commands::export::RecordFormArgs;
use crate::error::CliError;
use crate::utils::{
    fail_on_plan_failures, host_resolver, load_resolved, print_execution, print_json,
    resolve_path, GlobalOptions,
};
use clap::Args;
use std::path::PathBuf;
use symkeep::operations::{plan_convert, ConvertOptions};
use symkeep::{Config, PlanExecutor};

/// Capture every link under a directory into sibling records.
#[derive(Args)]
pub struct ConvertCommand {
    /// Directory to convert (default: current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Only convert the top level
    #[arg(long)]
    pub no_recursive: bool,

    /// Delete each link once its record is written
    #[arg(long)]
    pub remove_originals: bool,

    #[command(flatten)]
    pub form: RecordFormArgs,

    /// Show what would be done without doing it
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ConvertCommand {
    /// Execute the convert command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let overrides = Config {
            keep_originals: self.remove_originals.then_some(false),
            ..Default::default()
        };
        let config = load_resolved(global, overrides)?;
        let resolver = host_resolver(&config);
        let dir = resolve_path(self.dir)?;

        let options = ConvertOptions {
            recursive: config.recursive && !self.no_recursive,
            keep_originals: config.keep_originals,
            mode: self.form.mode(&config),
            wrapped: self.form.wrapped(&config),
        };
        let plan = plan_convert(&dir, &resolver, &options)?;

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
