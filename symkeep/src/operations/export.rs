//! Capturing single links into record files.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::path::PathResolver;
use crate::record::{capture_link, format, record_for_target, ExecutionMode, LinkRecord};

/// Where and how a record file is written.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Output file, or a directory to place the record in. Defaults to the
    /// link path plus the record extension.
    pub output: Option<PathBuf>,
    /// Execution mode stored in the record.
    pub mode: ExecutionMode,
    /// Write the wrapped, directly executable form.
    pub wrapped: bool,
}

impl ExportOptions {
    /// The record path for a link at `link`.
    #[must_use]
    pub fn record_path(&self, link: &Path) -> PathBuf {
        match &self.output {
            Some(dir) if dir.is_dir() => {
                let name = link.file_name().map_or_else(|| link.as_os_str().to_owned(), ToOwned::to_owned);
                format::default_record_path(&dir.join(name))
            }
            Some(file) => file.clone(),
            None => format::default_record_path(link),
        }
    }
}

/// Capture the live link at `link` and write its record.
///
/// Returns the record file path.
///
/// # Errors
///
/// Returns an error if `link` is not a symbolic link or the record cannot
/// be written.
pub fn export_link(link: &Path, resolver: &PathResolver, options: &ExportOptions) -> Result<PathBuf> {
    let record = capture_link(link, resolver, options.mode)?;
    write(link, &record, options)
}

/// Write a record for a link that does not exist yet.
///
/// `target` is kept as given; a relative target is relative to the link's
/// directory.
///
/// # Errors
///
/// Returns an error if the paths cannot be parsed or the record cannot be
/// written.
pub fn create_record(
    target: &str,
    link: &Path,
    resolver: &PathResolver,
    options: &ExportOptions,
) -> Result<PathBuf> {
    let record = record_for_target(target, link, resolver, options.mode)?;
    write(link, &record, options)
}

fn write(link: &Path, record: &LinkRecord, options: &ExportOptions) -> Result<PathBuf> {
    let path = options.record_path(link);
    format::write(&path, record, options.wrapped)?;
    log::info!("wrote {} for {}", path.display(), record.link);
    Ok(path)
}
