//! Execute command implementation.
//!
//! Performs a record's execution mode: print its metadata, or hand the
//! resolved target to the system's default opener.

use crate::error::CliError;
use crate::utils::{host_resolver, load_resolved, print_json, resolve_path, GlobalOptions};
use clap::Args;
use std::path::PathBuf;
use symkeep::record::{format, invoke, Invocation, RecordSummary, SystemOpener};
use symkeep::{Config, ExecutionMode};

/// Perform a record's execution mode.
#[derive(Args)]
pub struct ExecuteCommand {
    /// Record file
    #[arg(value_name = "RECORD")]
    pub record: PathBuf,

    /// Use this mode instead of the record's (info, open, auto)
    #[arg(long, value_name = "MODE")]
    pub mode: Option<ExecutionMode>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ExecuteCommand {
    /// Execute the execute command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_resolved(global, Config::default())?;
        let resolver = host_resolver(&config);
        let path = resolve_path(Some(self.record))?;

        let record = format::read(&path, resolver.host())?;
        match invoke(&record, self.mode, &resolver, &SystemOpener)? {
            Invocation::Info(summary) if self.json => print_json(&summary)?,
            Invocation::Info(summary) => print_summary(&summary),
            Invocation::Opened(target) => {
                if !global.quiet {
                    eprintln!("Opened {}", target.display());
                }
            }
        }
        Ok(())
    }
}

fn print_summary(summary: &RecordSummary) {
    println!("Link:           {}", summary.link);
    println!("Target:         {} ({})", summary.target, summary.target_flavor);
    println!("Target kind:    {}", summary.target_kind);
    match &summary.resolved_target {
        Some(resolved) => {
            let exists = if summary.target_exists { "exists" } else { "missing" };
            println!("Resolved:       {resolved} ({exists})");
        }
        None => println!("Resolved:       unresolvable on this host"),
    }
    println!("Mode:           {}", summary.execution_mode);
    println!("Format version: {}", summary.format_version);
    println!("Created by:     {}", summary.created_by);
    if let Some(at) = summary.captured_at {
        println!("Captured:       {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}
