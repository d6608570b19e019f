//! Utility functions for CLI operations.
//!
//! This module provides common utility functions used across CLI commands,
//! including path resolution, configuration loading, host detection,
//! and output formatting.

use crate::error::CliError;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use symkeep::batch::BatchReport;
use symkeep::operations::{ExecutionResult, OperationPlan};
use symkeep::path::local::absolutize;
use symkeep::path::{HostContext, PathResolver};
use symkeep::{Config, ConfigBuilder, ResolvedConfig};

/// Global CLI options shared across all commands.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Override the data directory location.
    pub data_dir: Option<PathBuf>,
}

/// Resolve a path, using CWD if not specified.
///
/// The result is absolute with `~` expanded, but symlinks are not
/// followed: a link given on the command line must stay a link.
pub fn resolve_path(path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    let path_to_resolve = match path {
        Some(p) => p,
        None => env::current_dir()?,
    };
    Ok(absolutize(&path_to_resolve)?)
}

/// Load hierarchical configuration.
///
/// Configuration is merged from multiple sources with precedence:
/// 1. Command-line flags (`overrides`, highest priority)
/// 2. Environment variables
/// 3. Directory `.symkeep.yaml`
/// 4. Global `config.yaml` in the data directory
pub fn load_configuration(global: &GlobalOptions, overrides: Config) -> Result<Config, CliError> {
    ConfigBuilder::new()
        .with_data_dir(global.data_dir.as_deref())
        .with_config(overrides)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

/// Load configuration and fill in built-in defaults.
pub fn load_resolved(global: &GlobalOptions, overrides: Config) -> Result<ResolvedConfig, CliError> {
    let resolved = ResolvedConfig::from_config(&load_configuration(global, overrides)?);
    resolved
        .check()
        .map_err(|e| CliError::Config(e.to_string()))?;
    Ok(resolved)
}

/// A resolver for the running host, honoring the configured path
/// preference and target-base rewrite.
pub fn host_resolver(config: &ResolvedConfig) -> PathResolver {
    let host = HostContext::detect().with_preference(config.path_preference);
    PathResolver::new(Arc::new(host)).with_rewrite(config.target_base_rewrite.clone())
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Shorten a path for display.
///
/// If the path is within the home directory, show it as ~/...
/// Otherwise, show the full path.
pub fn shorten_path(path: &Path) -> String {
    if let Some(home) = home::home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            return format!("~/{}", relative.display());
        }
    }
    path.display().to_string()
}

/// Print every batch entry on stdout and a summary on stderr.
pub fn print_report(report: &BatchReport, global: &GlobalOptions) {
    for entry in &report.entries {
        let state = entry.state.to_string();
        match &entry.destination {
            Some(dest) => println!("{state:<28} {} -> {}", entry.id, shorten_path(dest)),
            None => println!("{state:<28} {}", entry.id),
        }
        if !entry.detail.is_empty() && (global.verbose || entry.state.is_failed()) {
            println!("{:<28} {}", "", entry.detail);
        }
        for warning in &entry.warnings {
            println!("{:<28} warning: {warning}", "");
        }
    }

    if !global.quiet {
        let counts = &report.counts;
        eprintln!(
            "{} record(s): {} verified, {} unconfirmed, {} skipped, {} failed, {} incomplete",
            counts.total(),
            counts.verified,
            counts.unconfirmed,
            counts.skipped,
            counts.failed,
            counts.incomplete
        );
    }
}

/// Exit with a semantic failure when any record failed.
///
/// Skipped and incomplete records do not count.
pub fn fail_on_failures(report: &BatchReport) -> Result<(), CliError> {
    if report.counts.failed > 0 {
        return Err(CliError::SemanticFailure(format!(
            "{} of {} record(s) failed",
            report.counts.failed,
            report.counts.total()
        )));
    }
    Ok(())
}

/// Print the outcome of executing `plan`.
pub fn print_execution(
    plan: &OperationPlan,
    result: &ExecutionResult,
    global: &GlobalOptions,
) {
    if !global.quiet {
        eprintln!("{}", plan.description);
    }
    for action in &result.actions_taken {
        if result.dry_run {
            println!("[dry run] {action}");
        } else {
            println!("{action}");
        }
    }
    for (action, error) in &result.failures {
        println!("FAILED {action}: {error}");
    }
    if !global.quiet {
        for warning in &result.warnings {
            eprintln!("warning: {warning}");
        }
        if plan.is_empty() {
            eprintln!("Nothing to do");
        }
    }
}

/// Exit with a semantic failure when any plan action failed.
pub fn fail_on_plan_failures(result: &ExecutionResult) -> Result<(), CliError> {
    if result.success {
        Ok(())
    } else {
        Err(CliError::SemanticFailure(format!(
            "{} action(s) failed",
            result.failures.len()
        )))
    }
}
