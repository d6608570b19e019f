//! Command to list symbolic links under a directory.

use crate::error::CliError;
use crate::utils::{load_resolved, print_json, resolve_path, GlobalOptions};
use clap::Args;
use std::path::PathBuf;
use symkeep::operations::{inspect, scan_links, LinkInfo};
use symkeep::Config;

/// List symbolic links under a directory.
#[derive(Args)]
pub struct ScanCommand {
    /// Directory to scan (default: current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Only scan the top level
    #[arg(long)]
    pub no_recursive: bool,

    /// Only list broken links
    #[arg(long)]
    pub broken: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ScanCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_resolved(global, Config::default())?;
        let dir = resolve_path(self.dir)?;

        let mut links: Vec<LinkInfo> = Vec::new();
        for link in scan_links(&dir, config.recursive && !self.no_recursive)? {
            match inspect(&link) {
                Ok(info) if self.broken && !info.broken => {}
                Ok(info) => links.push(info),
                Err(e) => log::warn!("{}: {e}", link.display()),
            }
        }

        if self.json {
            return print_json(&links);
        }

        for info in &links {
            let status = if info.broken { "broken" } else { "ok" };
            let relative = if info.relative { "relative" } else { "absolute" };
            println!(
                "{:<7} {:<10} {:<9} {} -> {}",
                status,
                info.kind.to_string(),
                relative,
                info.link.display(),
                info.target.display()
            );
        }
        if !global.quiet {
            let broken = links.iter().filter(|l| l.broken).count();
            eprintln!("{} link(s), {broken} broken", links.len());
        }
        Ok(())
    }
}
