//! Main entry point for the symkeep CLI.
//!
//! This is the command-line interface for preserving symbolic links.
//! It provides commands for capturing and recreating links:
//! - `export` / `create`: Write a record for one link
//! - `import`: Recreate links from records
//! - `convert` / `mirror`: Capture every link under a directory
//! - `check` / `rebase`: Inspect and repair live links

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let _logger = symkeep::init_logger(cli.verbose, cli.quiet);

    // Convert CLI args to GlobalOptions
    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        data_dir: cli.data_dir,
    };

    // Execute the command
    let result = match cli.command {
        cli::Command::Export(cmd) => cmd.execute(&global),
        cli::Command::Create(cmd) => cmd.execute(&global),
        cli::Command::Import(cmd) => cmd.execute(&global),
        cli::Command::Scan(cmd) => cmd.execute(&global),
        cli::Command::Convert(cmd) => cmd.execute(&global),
        cli::Command::Mirror(cmd) => cmd.execute(&global),
        cli::Command::Execute(cmd) => cmd.execute(&global),
        cli::Command::Check(cmd) => cmd.execute(&global),
        cli::Command::Rebase(cmd) => cmd.execute(&global),
        cli::Command::Config(cmd) => cmd.execute(&global),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
