//! Build script for symkeep-cli.
//!
//! This script generates man pages at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Note: We build a minimal command structure here rather than importing from
//! the main crate, since build scripts cannot depend on the crate being built.

use clap::{Arg, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// IMPORTANT: Keep this structure synchronized with src/cli.rs
/// When adding/removing/modifying commands, update both files.
fn build_cli() -> Command {
    Command::new("symkeep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Preserve and recreate symbolic links")
        .long_about(
            "Command-line tool for capturing symbolic links as portable records and recreating them on other hosts",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Override the data directory location (holds the global config.yaml)")
                .value_name("PATH")
                .global(true)
                .env("SYMKEEP_DATA_DIR"),
        )
        .subcommands(vec![
            Command::new("export")
                .about("Capture a symbolic link into a record file")
                .long_about("Write a record describing one live link, its target and timestamps"),
            Command::new("create")
                .about("Write a record for a target without an existing link")
                .long_about("Write a record for a target and link path; no link needs to exist"),
            Command::new("import")
                .about("Recreate links from record files")
                .long_about(
                    "Load record files and recreate their links, at the recorded paths or under a target location",
                ),
            Command::new("scan")
                .about("List symbolic links under a directory")
                .long_about("List links with their targets, target kind and broken status"),
            Command::new("convert")
                .about("Capture every link under a directory into sibling records")
                .long_about("Write a record next to every link under a directory, optionally removing the links"),
            Command::new("mirror")
                .about("Capture every link under a directory into records under another")
                .long_about("Write records for every link under SRC at the same relative paths under DEST"),
            Command::new("execute")
                .about("Perform a record's execution mode")
                .long_about("Print a record's metadata or open its target with the system opener"),
            Command::new("check")
                .about("Report broken links and optionally repair them")
                .long_about("Report broken links; --fix-relative searches for moved targets by name"),
            Command::new("rebase")
                .about("Rewrite link targets or record targets")
                .long_about(
                    "Convert targets between relative and absolute form or replace their prefix",
                ),
            Command::new("config")
                .about("View or change configuration files")
                .long_about("Show the merged configuration, set a key, or reset a configuration file"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() {
    // Generate man pages at build time
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    // Generate main symkeep.1 man page
    let app = build_cli();
    let man = Man::new(app);
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();

    fs::write(man_dir.join("symkeep.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
