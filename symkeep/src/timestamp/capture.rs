//! Reading timestamps from the filesystem.

use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};

use super::policy::{CapturedTimestamps, TimestampSet};

/// Timestamps from already-fetched metadata. Fields the platform does not
/// report stay `None`.
#[must_use]
pub fn from_metadata(meta: &Metadata) -> TimestampSet {
    TimestampSet {
        created: meta.created().ok().map(DateTime::<Utc>::from),
        modified: meta.modified().ok().map(DateTime::<Utc>::from),
        accessed: meta.accessed().ok().map(DateTime::<Utc>::from),
    }
}

/// Read the timestamps of `path`.
///
/// With `follow` unset the link object itself is read.
///
/// # Errors
///
/// Returns the underlying I/O error if the entry cannot be stat'ed.
pub fn read(path: &Path, follow: bool) -> io::Result<TimestampSet> {
    let meta = if follow {
        fs::metadata(path)?
    } else {
        fs::symlink_metadata(path)?
    };
    Ok(from_metadata(&meta))
}

/// Capture both the link's and its target's timestamps.
///
/// A dangling link captures no target timestamps.
///
/// # Errors
///
/// Returns the I/O error from reading the link object.
pub fn capture(link: &Path) -> io::Result<CapturedTimestamps> {
    let link_times = read(link, false)?;
    let target = match read(link, true) {
        Ok(times) => Some(times),
        Err(e) => {
            log::debug!("no target timestamps for {}: {e}", link.display());
            None
        }
    };
    Ok(CapturedTimestamps {
        link: link_times,
        target,
    })
}
