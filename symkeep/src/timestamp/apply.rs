//! Writing planned timestamps onto a link object without following it.

use std::path::Path;
use std::time::SystemTime;

use crate::error::{Error, Result};

use super::policy::{ApplyPlan, TimestampSource};

/// Apply `plan` to the link object at `link`.
///
/// Only the link is touched, never its target. Returns warnings for
/// planned fields the platform cannot set (birth time on Unix).
///
/// # Errors
///
/// Returns [`Error::UnsupportedPlatform`] where link timestamps cannot be
/// set at all, or the classified I/O error from the system call.
pub fn apply(link: &Path, plan: &ApplyPlan) -> Result<Vec<String>> {
    // Birth time cannot be set outside Windows; "now" needs no warning there.
    let created = plan
        .created
        .filter(|p| cfg!(windows) || p.source != TimestampSource::Now);
    let times = PlannedTimes {
        created: created.map(|p| SystemTime::from(p.at)),
        modified: plan.modified.map(|p| SystemTime::from(p.at)),
        accessed: plan.accessed.map(|p| SystemTime::from(p.at)),
    };
    if times.created.is_none() && times.modified.is_none() && times.accessed.is_none() {
        return Ok(Vec::new());
    }
    log::debug!("applying timestamps to {}", link.display());
    set_link_times(link, &times)
}

struct PlannedTimes {
    created: Option<SystemTime>,
    modified: Option<SystemTime>,
    accessed: Option<SystemTime>,
}

#[cfg(any(
    target_os = "linux",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd"
))]
fn set_link_times(link: &Path, times: &PlannedTimes) -> Result<Vec<String>> {
    use chrono::{DateTime, Utc};
    use nix::sys::stat::lutimes;
    use nix::sys::time::{TimeVal, TimeValLike};

    let mut warnings = Vec::new();
    if times.created.is_some() {
        warnings.push("creation time cannot be set on this platform".to_string());
    }
    if times.modified.is_none() && times.accessed.is_none() {
        return Ok(warnings);
    }

    // lutimes sets both; keep the link's current value for an unplanned one.
    let current = std::fs::symlink_metadata(link).map_err(|e| Error::from_io_at(link, e))?;
    let accessed = match times.accessed {
        Some(t) => t,
        None => current.accessed().map_err(|e| Error::from_io_at(link, e))?,
    };
    let modified = match times.modified {
        Some(t) => t,
        None => current.modified().map_err(|e| Error::from_io_at(link, e))?,
    };

    let to_timeval = |t: SystemTime| TimeVal::microseconds(DateTime::<Utc>::from(t).timestamp_micros());
    lutimes(link, &to_timeval(accessed), &to_timeval(modified))
        .map_err(|errno| Error::from_io_at(link, std::io::Error::from(errno)))?;
    Ok(warnings)
}

#[cfg(windows)]
fn set_link_times(link: &Path, times: &PlannedTimes) -> Result<Vec<String>> {
    use std::fs::{FileTimes, OpenOptions};
    use std::os::windows::fs::{FileTimesExt, OpenOptionsExt};

    const FILE_WRITE_ATTRIBUTES: u32 = 0x0000_0100;
    const FILE_FLAG_OPEN_REPARSE_POINT: u32 = 0x0020_0000;
    const FILE_FLAG_BACKUP_SEMANTICS: u32 = 0x0200_0000;

    let file = OpenOptions::new()
        .access_mode(FILE_WRITE_ATTRIBUTES)
        .custom_flags(FILE_FLAG_OPEN_REPARSE_POINT | FILE_FLAG_BACKUP_SEMANTICS)
        .open(link)
        .map_err(|e| Error::from_io_at(link, e))?;

    let mut file_times = FileTimes::new();
    if let Some(t) = times.modified {
        file_times = file_times.set_modified(t);
    }
    if let Some(t) = times.accessed {
        file_times = file_times.set_accessed(t);
    }
    if let Some(t) = times.created {
        file_times = file_times.set_created(t);
    }
    file.set_times(file_times)
        .map_err(|e| Error::from_io_at(link, e))?;
    Ok(Vec::new())
}

#[cfg(not(any(
    windows,
    target_os = "linux",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd"
)))]
fn set_link_times(_link: &Path, _times: &PlannedTimes) -> Result<Vec<String>> {
    Err(Error::UnsupportedPlatform {
        operation: "setting symbolic link timestamps".to_string(),
    })
}
