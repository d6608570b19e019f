//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    CheckCommand, CompletionsCommand, ConfigCommand, ConvertCommand, CreateCommand,
    ExecuteCommand, ExportCommand, ImportCommand, MirrorCommand, RebaseCommand, ScanCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Preserve symbolic links as portable records and recreate them anywhere.
#[derive(Parser)]
#[command(name = "symkeep")]
#[command(version, about = "Preserve and recreate symbolic links", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Override the data directory location (holds the global config.yaml)
    #[arg(long, value_name = "PATH", global = true, env = "SYMKEEP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Capture a symbolic link into a record file
    Export(ExportCommand),

    /// Write a record for a target without an existing link
    Create(CreateCommand),

    /// Recreate links from record files
    Import(ImportCommand),

    /// List symbolic links under a directory
    Scan(ScanCommand),

    /// Capture every link under a directory into sibling records
    Convert(ConvertCommand),

    /// Capture every link under a directory into records under another
    Mirror(MirrorCommand),

    /// Perform a record's execution mode
    Execute(ExecuteCommand),

    /// Report broken links and optionally repair them
    Check(CheckCommand),

    /// Rewrite link targets or record targets
    Rebase(RebaseCommand),

    /// View or change configuration files
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
