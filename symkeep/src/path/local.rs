//! Helpers for paths on the local filesystem.
//!
//! These work on [`Path`] values for the running host:
//! - Expanding tilde (~) to the home directory
//! - Converting relative paths to absolute paths without following links
//! - Computing link text relative to a link's own directory

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Expand tilde (~) to the home directory.
///
/// This function handles `~` and `~/path` but does not support `~user` syntax.
///
/// # Errors
///
/// Returns an error if:
/// - The path contains invalid UTF-8
/// - The home directory cannot be determined
/// - The path uses `~user` syntax (not supported)
///
/// # Examples
///
/// ```
/// use symkeep::path::local::expand_tilde;
/// use std::path::Path;
///
/// let expanded = expand_tilde(Path::new("~/links")).unwrap();
/// assert!(expanded.is_absolute());
/// assert!(expanded.ends_with("links"));
///
/// let expanded = expand_tilde(Path::new("/absolute")).unwrap();
/// assert_eq!(expanded, Path::new("/absolute"));
/// ```
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let path_str = path.to_str().ok_or_else(|| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: "Path contains invalid UTF-8".to_string(),
    })?;

    if !path_str.starts_with('~') {
        return Ok(path.to_path_buf());
    }

    let home = home::home_dir().ok_or_else(|| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: "Cannot determine home directory".to_string(),
    })?;

    if path_str == "~" {
        Ok(home)
    } else if path_str.starts_with("~/") || path_str.starts_with("~\\") {
        Ok(home.join(&path_str[2..]))
    } else {
        Err(Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "~user syntax is not supported; use ~ or ~/path".to_string(),
        })
    }
}

/// Resolve `.` and `..` lexically. `..` at the root stays at the root.
#[must_use]
pub fn resolve_components(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                result.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let at_anchor = matches!(
                    result.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_) | Component::ParentDir)
                );
                if at_anchor && !result.has_root() {
                    result.push("..");
                } else if !at_anchor {
                    result.pop();
                }
            }
        }
    }
    result
}

/// Make `path` absolute without following symlinks.
///
/// Tilde is expanded, relative paths are joined to the current directory
/// and `.`/`..` are resolved lexically.
///
/// # Errors
///
/// Returns an error if tilde expansion fails or the current directory
/// cannot be determined.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path)?;

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let cwd = env::current_dir().map_err(|e| Error::InvalidPath {
            path: path.to_path_buf(),
            reason: format!("Cannot get current directory: {e}"),
        })?;
        cwd.join(expanded)
    };

    Ok(resolve_components(&absolute))
}

/// Where a link's target text points, interpreted from the link's
/// directory.
#[must_use]
pub fn resolve_link_target(link: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        return resolve_components(target);
    }
    let parent = link.parent().unwrap_or_else(|| Path::new(""));
    resolve_components(&parent.join(target))
}

/// The minimal relative text that makes a link at `link` point at
/// `target`. Both paths must be absolute on the same root.
///
/// Returns `None` when no relative form exists (different drives).
///
/// # Examples
///
/// ```
/// use symkeep::path::local::relative_link_text;
/// use std::path::{Path, PathBuf};
///
/// let text = relative_link_text(Path::new("/a/links/l"), Path::new("/a/data/f.txt"));
/// assert_eq!(text, Some(PathBuf::from("../data/f.txt")));
/// ```
#[must_use]
pub fn relative_link_text(link: &Path, target: &Path) -> Option<PathBuf> {
    let base = resolve_components(link.parent()?);
    let target = resolve_components(target);

    let base_parts: Vec<Component<'_>> = base.components().collect();
    let target_parts: Vec<Component<'_>> = target.components().collect();

    let anchor = |parts: &[Component<'_>]| {
        parts
            .iter()
            .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
            .count()
    };
    let (base_anchor, target_anchor) = (anchor(&base_parts), anchor(&target_parts));
    if base_anchor == 0 || base_parts[..base_anchor] != target_parts[..target_anchor] {
        return None;
    }

    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part);
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Some(relative)
}
