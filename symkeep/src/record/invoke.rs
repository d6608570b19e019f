//! What happens when a record file is executed.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::path::{PathFlavor, PathResolver};

use super::model::{ExecutionMode, LinkRecord, TargetKind};

/// Hands a path to the host's default application.
#[cfg_attr(test, mockall::automock)]
pub trait Opener {
    /// Open `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the opener could not be launched or failed.
    fn open(&self, path: &Path) -> io::Result<()>;
}

/// The platform's default opener: `xdg-open`, `open` or `cmd /C start`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl Opener for SystemOpener {
    fn open(&self, path: &Path) -> io::Result<()> {
        let status = if cfg!(windows) {
            Command::new("cmd").args(["/C", "start", ""]).arg(path).status()?
        } else if cfg!(target_os = "macos") {
            Command::new("open").arg(path).status()?
        } else {
            Command::new("xdg-open").arg(path).status()?
        };
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("opener exited with {status}")))
        }
    }
}

/// Metadata shown for `info` invocations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummary {
    /// The recorded link path.
    pub link: String,
    /// The recorded target text.
    pub target: String,
    /// Grammar of the target.
    pub target_flavor: PathFlavor,
    /// Target kind at capture time.
    pub target_kind: TargetKind,
    /// The target resolved on this host, if it resolves.
    pub resolved_target: Option<String>,
    /// Whether the resolved target exists now.
    pub target_exists: bool,
    /// The record's effective execution mode.
    pub execution_mode: ExecutionMode,
    /// Record format version.
    pub format_version: u32,
    /// Writer signature.
    pub created_by: String,
    /// Capture time.
    pub captured_at: Option<DateTime<Utc>>,
}

/// The result of invoking a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// Metadata for the caller to print.
    Info(RecordSummary),
    /// The target was handed to the opener.
    Opened(PathBuf),
}

/// Where the record's target lives on this host.
///
/// Relative targets are joined to the resolved link directory.
///
/// # Errors
///
/// Returns [`Error::PathUnresolvable`] when the target (or, for relative
/// targets, the link) cannot be mapped onto this host.
pub fn resolve_target(record: &LinkRecord, resolver: &PathResolver) -> Result<PathBuf> {
    let target = PathBuf::from(record.target.path.resolve(resolver)?);
    if !record.target.relative {
        return Ok(target);
    }
    let link = PathBuf::from(record.link.resolve(resolver)?);
    Ok(crate::path::local::resolve_link_target(&link, &target))
}

/// Perform a record's execution mode.
///
/// `mode_override` replaces the record's own mode. `auto` opens the target
/// when it resolves and exists and falls back to `info` otherwise.
///
/// # Errors
///
/// With `open`, returns [`Error::PathUnresolvable`] or [`Error::NotFound`]
/// when the target is unavailable, or the opener's I/O error.
pub fn invoke(
    record: &LinkRecord,
    mode_override: Option<ExecutionMode>,
    resolver: &PathResolver,
    opener: &dyn Opener,
) -> Result<Invocation> {
    let mode = mode_override.unwrap_or_else(|| record.effective_mode());
    let resolved = resolve_target(record, resolver);
    let existing = resolved.as_ref().ok().filter(|p| p.exists()).cloned();

    match mode {
        ExecutionMode::Info => Ok(Invocation::Info(summarize(record, mode, resolved.ok()))),
        ExecutionMode::Open => {
            let path = resolved?;
            if !path.exists() {
                return Err(Error::NotFound {
                    resource: path.display().to_string(),
                });
            }
            open_with(opener, path)
        }
        ExecutionMode::Auto => match existing {
            Some(path) => open_with(opener, path),
            None => {
                log::info!("target of {} unavailable, showing info", record.link);
                Ok(Invocation::Info(summarize(record, mode, resolved.ok())))
            }
        },
    }
}

fn open_with(opener: &dyn Opener, path: PathBuf) -> Result<Invocation> {
    opener.open(&path).map_err(|e| Error::from_io_at(&path, e))?;
    Ok(Invocation::Opened(path))
}

fn summarize(record: &LinkRecord, mode: ExecutionMode, resolved: Option<PathBuf>) -> RecordSummary {
    RecordSummary {
        link: record.link.raw.clone(),
        target: record.target.path.raw.clone(),
        target_flavor: record.target.path.flavor,
        target_kind: record.target.kind,
        target_exists: resolved.as_ref().is_some_and(|p| p.exists()),
        resolved_target: resolved.map(|p| p.display().to_string()),
        execution_mode: mode,
        format_version: record.format_version,
        created_by: record.created_by.clone(),
        captured_at: record.captured_at,
    }
}
