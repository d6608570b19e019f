//! Export command implementation.
//!
//! This module implements the `export` command, which captures one live
//! symbolic link into a record file.

use crate::error::CliError;
use crate::utils::{host_resolver, load_resolved, print_json, resolve_path, shorten_path, GlobalOptions};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use symkeep::config::ResolvedConfig;
use symkeep::operations::{export_link, ExportOptions};
use symkeep::{Config, ExecutionMode};

/// How written records behave when invoked.
#[derive(Args, Debug, Clone, Default)]
pub struct RecordFormArgs {
    /// Execution mode stored in the record (info, open, auto)
    #[arg(long, value_name = "MODE")]
    pub mode: Option<ExecutionMode>,

    /// Write the wrapped form that can be run directly
    #[arg(long)]
    pub executable: bool,
}

impl RecordFormArgs {
    /// The stored execution mode, falling back to the configured default.
    pub fn mode(&self, config: &ResolvedConfig) -> ExecutionMode {
        self.mode.unwrap_or(config.default_mode)
    }

    /// Whether to write the wrapped form.
    pub fn wrapped(&self, config: &ResolvedConfig) -> bool {
        self.executable || config.make_executable
    }
}

/// A record written for one link.
#[derive(Serialize)]
pub struct WrittenRecord {
    /// The link the record describes.
    pub link: PathBuf,
    /// The record file.
    pub record: PathBuf,
}

/// Capture a symbolic link into a record file.
#[derive(Args)]
pub struct ExportCommand {
    /// The symbolic link to capture
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

impl ExportCommand {
    /// Execute the export command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_resolved(global, Config::default())?;
        let resolver = host_resolver(&config);

        let link = resolve_path(Some(self.link))?;
        let options = ExportOptions {
            output: self.output.map(|p| resolve_path(Some(p))).transpose()?,
            mode: self.form.mode(&config),
            wrapped: self.form.wrapped(&config),
        };

        let record = export_link(&link, &resolver, &options)?;
        print_written(&WrittenRecord { link, record }, self.json, global)
    }
}

/// Print a written record path.
pub fn print_written(written: &WrittenRecord, json: bool, global: &GlobalOptions) -> Result<(), CliError> {
    if json {
        return print_json(written);
    }
    println!("{}", written.record.display());
    if !global.quiet {
        eprintln!("Captured {}", shorten_path(&written.link));
    }
    Ok(())
}
