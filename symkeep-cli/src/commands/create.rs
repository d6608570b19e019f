//! Create command implementation.
//!
//! Writes a record for a target and link name without needing an existing
//! link on disk.

use crate::commands::export::{print_written, RecordFormArgs, WrittenRecord};
use crate::error::CliError;
use crate::utils::{host_resolver, load_resolved, resolve_path, GlobalOptions};
use clap::Args;
use std::path::PathBuf;
use symkeep::operations::{create_record, ExportOptions};
use symkeep::Config;

/// Write a record for a target without an existing link.
#[derive(Args)]
pub struct CreateCommand {
    /// Link target, kept as given (relative targets are relative to LINK's directory)
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Where the link would live
    #[arg(value_name = "LINK")]
    pub link: PathBuf,

    /// Record file, or directory to write it into (default: LINK.symkeep)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub form: RecordFormArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CreateCommand {
    /// Execute the create command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        if self.target.trim().is_empty() {
            return Err(CliError::InvalidArguments("TARGET must not be empty".to_string()));
        }

        let config = load_resolved(global, Config::default())?;
        let resolver = host_resolver(&config);

        let link = resolve_path(Some(self.link))?;
        let options = ExportOptions {
            output: self.output.map(|p| resolve_path(Some(p))).transpose()?,
            mode: self.form.mode(&config),
            wrapped: self.form.wrapped(&config),
        };

        let record = create_record(&self.target, &link, &resolver, &options)?;
        print_written(&WrittenRecord { link, record }, self.json, global)
    }
}
