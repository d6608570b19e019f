//! Check command implementation.
//!
//! Reports which links under a directory are broken. With
//! `--fix-relative`, broken relative links are pointed at a same-named
//! entry found in the link's directory or one of its ancestors.

use crate::error::CliError;
use crate::utils::{load_resolved, print_json, resolve_path, GlobalOptions};
use clap::Args;
use std::path::PathBuf;
use symkeep::operations::{check_links, CheckOptions, CheckReport, LinkStatus};
use symkeep::Config;

/// Report broken links and optionally repair them.
#[derive(Args)]
pub struct CheckCommand {
    /// Directory to check (default: current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Only check the top level
    #[arg(long)]
    pub no_recursive: bool,

    /// Repair broken relative links by searching for their target's name
    #[arg(long)]
    pub fix_relative: bool,

    /// How many ancestor directories the repair search climbs
    #[arg(long, value_name = "N")]
    pub search_depth: Option<usize>,

    /// Show repairs without making them
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckCommand {
    /// Execute the check command.
    ///
    /// Exits with a semantic failure while any link stays broken.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let overrides = Config {
            fix_relative: self.fix_relative.then_some(true),
            fix_search_depth: self.search_depth,
            ..Default::default()
        };
        let config = load_resolved(global, overrides)?;
        let dir = resolve_path(self.dir)?;

        let options = CheckOptions {
            recursive: config.recursive && !self.no_recursive,
            fix_relative: config.fix_relative,
            search_depth: config.fix_search_depth,
            dry_run: self.dry_run,
        };
        let report = check_links(&dir, &options)?;

        if self.json {
            print_json(&report)?;
        } else {
            print_check(&report, global);
        }

        match report.broken() {
            0 => Ok(()),
            n => Err(CliError::SemanticFailure(format!("{n} broken link(s)"))),
        }
    }
}

fn print_check(report: &CheckReport, global: &GlobalOptions) {
    for entry in &report.entries {
        let target = entry
            .target
            .as_ref()
            .map_or_else(String::new, |t| t.display().to_string());
        match &entry.status {
            LinkStatus::Ok => {
                if global.verbose {
                    println!("ok      {} -> {target}", entry.link.display());
                }
            }
            LinkStatus::Broken { error: Some(error) } => {
                println!("broken  {}: {error}", entry.link.display());
            }
            LinkStatus::Broken { error: None } => {
                println!("broken  {} -> {target}", entry.link.display());
            }
            LinkStatus::Fixed { new_target } => {
                let verb = if report.dry_run { "would fix" } else { "fixed" };
                println!(
                    "{verb:<7} {} -> {} (was {target})",
                    entry.link.display(),
                    new_target.display()
                );
            }
        }
    }
    if !global.quiet {
        eprintln!(
            "{} link(s): {} ok, {} broken, {} fixed",
            report.entries.len(),
            report.ok(),
            report.broken(),
            report.fixed()
        );
    }
}
