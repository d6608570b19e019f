//! Mirror command implementation.

use crate::commands::export::RecordFormArgs;
use crate::error::CliError;
use crate::utils::{
    fail_on_plan_failures, host_resolver, load_resolved, print_execution, print_json,
    resolve_path, GlobalOptions,
};
use clap::Args;
use std::path::PathBuf;
use symkeep::operations::{plan_mirror, ConvertOptions};
use symkeep::{Config, PlanExecutor};

/// Capture every link under SRC into records at the same relative paths under DEST.
#[derive(Args)]
pub struct MirrorCommand {
    /// Directory holding the links
    #[arg(value_name = "SRC")]
    pub src: PathBuf,

    /// Directory to write records into
    #[arg(value_name = "DEST")]
    pub dest: PathBuf,

    /// Only mirror the top level
    #[arg(long)]
    pub no_recursive: bool,

    #[command(flatten)]
    pub form: RecordFormArgs,

    /// Show what would be done without doing it
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl MirrorCommand {
    /// Execute the mirror command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_resolved(global, Config::default())?;
        let resolver = host_resolver(&config);
        let src = resolve_path(Some(self.src))?;
        let dest = resolve_path(Some(self.dest))?;

        let options = ConvertOptions {
            recursive: config.recursive && !self.no_recursive,
            mode: self.form.mode(&config),
            wrapped: self.form.wrapped(&config),
            ..Default::default()
        };
        let plan = plan_mirror(&src, &dest, &resolver, &options)?;

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
