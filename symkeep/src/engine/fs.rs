//! Filesystem primitives used by the recreation engine.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::record::{Attributes, TargetKind};

/// What occupies a destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupant {
    /// Nothing.
    Vacant,
    /// A symbolic link with this target text.
    Link(PathBuf),
    /// A file or directory that is not a link.
    Other,
}

/// Inspect `path` without following links.
///
/// # Errors
///
/// Returns the classified I/O error for anything but "not found".
pub fn occupant(path: &Path) -> Result<Occupant> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::read_link(path)
            .map(Occupant::Link)
            .map_err(|e| Error::from_io_at(path, e)),
        Ok(_) => Ok(Occupant::Other),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Occupant::Vacant),
        Err(e) => Err(Error::from_io_at(path, e)),
    }
}

/// Create a symbolic link at `link` whose text is `target`.
///
/// On Windows `kind` picks a file or directory link; the target is not
/// probed since it may not exist yet.
///
/// # Errors
///
/// [`Error::PermissionDenied`] when the OS refuses for lack of privilege,
/// [`Error::UnsupportedPlatform`] where links cannot be created at all.
#[allow(unused_variables)]
pub fn create_link(target: &Path, link: &Path, kind: TargetKind) -> Result<()> {
    #[cfg(unix)]
    let created = std::os::unix::fs::symlink(target, link);

    #[cfg(windows)]
    let created = match kind {
        TargetKind::Directory => std::os::windows::fs::symlink_dir(target, link),
        TargetKind::File | TargetKind::Missing => std::os::windows::fs::symlink_file(target, link),
    };

    #[cfg(not(any(unix, windows)))]
    let created: io::Result<()> = Err(io::Error::from(io::ErrorKind::Unsupported));

    created.map_err(|e| Error::from_io_at(link, e))
}

/// Remove the link object at `link`, never its target.
///
/// # Errors
///
/// Returns the classified I/O error.
pub fn remove_link(link: &Path) -> Result<()> {
    #[cfg(windows)]
    {
        use std::os::windows::fs::FileTypeExt;
        let meta = fs::symlink_metadata(link).map_err(|e| Error::from_io_at(link, e))?;
        if meta.file_type().is_symlink_dir() {
            return fs::remove_dir(link).map_err(|e| Error::from_io_at(link, e));
        }
    }
    fs::remove_file(link).map_err(|e| Error::from_io_at(link, e))
}

/// The sibling name a replacement link is staged under.
#[must_use]
pub fn staging_path(link: &Path) -> PathBuf {
    let name = link
        .file_name()
        .map_or_else(|| "link".into(), |n| n.to_string_lossy().into_owned());
    link.with_file_name(format!(".{name}.symkeep.tmp"))
}

/// Replace the link at `link` with one whose text is `target`.
///
/// The new link is created beside the old one and renamed over it, so
/// `link` holds either the old link or the new one at every point. The
/// staged link is removed when the swap fails.
///
/// # Errors
///
/// Returns the error from creating or renaming the staged link.
pub fn replace_link(target: &Path, link: &Path, kind: TargetKind) -> Result<()> {
    let staged = staging_path(link);
    match fs::symlink_metadata(&staged) {
        Ok(_) => remove_link(&staged)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::from_io_at(&staged, e)),
    }
    create_link(target, &staged, kind)?;

    if let Err(e) = swap(&staged, link, kind) {
        if let Err(cleanup) = remove_link(&staged) {
            log::warn!("could not remove {}: {cleanup}", staged.display());
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(not(windows))]
fn swap(staged: &Path, link: &Path, _kind: TargetKind) -> Result<()> {
    fs::rename(staged, link).map_err(|e| Error::from_io_at(link, e))
}

// Directory links cannot be renamed over on Windows.
#[cfg(windows)]
fn swap(staged: &Path, link: &Path, kind: TargetKind) -> Result<()> {
    if kind == TargetKind::Directory {
        remove_link(link)?;
    }
    fs::rename(staged, link).map_err(|e| Error::from_io_at(link, e))
}

/// Whether a link's `actual` text is the `expected` text.
///
/// Windows accepts either separator and ignores case.
#[must_use]
pub fn targets_match(actual: &Path, expected: &Path) -> bool {
    let tidy = |p: &Path| {
        let text = p.to_string_lossy().into_owned();
        let text = if cfg!(windows) {
            text.replace('/', "\\").to_lowercase()
        } else {
            text
        };
        let trimmed = text.trim_end_matches(['/', '\\']);
        if trimmed.is_empty() {
            text
        } else {
            trimmed.to_string()
        }
    };
    tidy(actual) == tidy(expected)
}

/// Find an entry named `name` near `start`.
///
/// Looks in `start` and up to `depth` of its ancestors, descending at
/// most `depth` levels below each. Links are not followed and are never
/// returned. Entries are visited in file-name order.
#[must_use]
pub fn search_same_name(start: &Path, name: &OsStr, depth: usize) -> Option<PathBuf> {
    for base in start.ancestors().take(depth.saturating_add(1)) {
        if base.as_os_str().is_empty() {
            break;
        }
        let found = WalkDir::new(base)
            .max_depth(depth)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .find(|entry| entry.depth() > 0 && !entry.path_is_symlink() && entry.file_name() == name);
        if let Some(entry) = found {
            log::debug!("same-name search found {}", entry.path().display());
            return Some(entry.into_path());
        }
    }
    None
}

/// Apply the attribute bits this OS understands to the link object.
///
/// Returns a warning for every bit that could not be applied.
#[must_use]
pub fn apply_attributes(link: &Path, attributes: &Attributes) -> Vec<String> {
    let mut warnings = Vec::new();
    for key in attributes.extra.keys() {
        log::debug!("attribute '{key}' of {} is not understood; kept", link.display());
    }
    apply_native(link, attributes, &mut warnings);
    warnings
}

#[cfg(windows)]
fn apply_native(link: &Path, attributes: &Attributes, warnings: &mut Vec<String>) {
    use std::process::Command;

    let mut flags = Vec::new();
    if attributes.hidden {
        flags.push("+H");
    }
    if attributes.system {
        flags.push("+S");
    }
    if attributes.readonly {
        flags.push("+R");
    }
    if flags.is_empty() {
        return;
    }
    match Command::new("attrib").args(&flags).arg("/L").arg(link).status() {
        Ok(status) if status.success() => {}
        Ok(status) => warnings.push(format!("attrib exited with {status}")),
        Err(e) => warnings.push(format!("could not run attrib: {e}")),
    }
}

#[cfg(not(windows))]
fn apply_native(link: &Path, attributes: &Attributes, warnings: &mut Vec<String>) {
    // Unix links carry no mode of their own; hidden is the file name.
    if attributes.system {
        warnings.push("system attribute not supported on this platform".to_string());
    }
    if attributes.readonly {
        warnings.push(format!(
            "readonly attribute not applied to link {}",
            link.display()
        ));
    }
}
