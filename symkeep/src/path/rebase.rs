//! Absolute/relative conversion and target-base prefix rewriting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::flavor::PathFlavor;
use super::parts::{drive_letter, PathParts};

/// Which way [`rebase`] converts a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebaseDirection {
    /// Absolute to relative-to-base.
    ToRelative,
    /// Relative-to-base to absolute.
    ToAbsolute,
}

/// Convert `path` between absolute and base-relative form.
///
/// The base must be given and must be absolute. Converting a path that is
/// already in the requested form only normalizes it.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] when the base is missing or relative, or
/// when an absolute path and the base do not share an anchor (different
/// drives or shares).
///
/// # Examples
///
/// ```
/// use symkeep::path::{rebase, PathFlavor, RebaseDirection};
///
/// let rel = rebase("/a/b/c", PathFlavor::Posix, Some("/a"), RebaseDirection::ToRelative).unwrap();
/// assert_eq!(rel, "b/c");
/// let abs = rebase(&rel, PathFlavor::Posix, Some("/a"), RebaseDirection::ToAbsolute).unwrap();
/// assert_eq!(abs, "/a/b/c");
/// ```
pub fn rebase(
    path: &str,
    flavor: PathFlavor,
    base: Option<&str>,
    direction: RebaseDirection,
) -> Result<String> {
    let Some(base) = base else {
        return Err(Error::InvalidPath {
            path: path.into(),
            reason: "rebasing requires an explicit base directory".to_string(),
        });
    };
    let parts = PathParts::parse(path, flavor)?;
    let base_parts = PathParts::parse(base, flavor)?;
    if !base_parts.is_absolute() {
        return Err(Error::InvalidPath {
            path: base.into(),
            reason: "rebase base must be absolute".to_string(),
        });
    }

    match direction {
        RebaseDirection::ToRelative => {
            if !parts.is_absolute() {
                return Ok(parts.render_for(flavor));
            }
            Ok(relative_between(&parts, &base_parts, flavor)?.render_for(flavor))
        }
        RebaseDirection::ToAbsolute => {
            if parts.is_absolute() {
                return Ok(parts.render_for(flavor));
            }
            Ok(parts.rebased_onto(0, &base_parts).render_for(flavor))
        }
    }
}

/// The minimal relative path leading from directory `base` to `path`.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] when the two do not share an anchor.
pub fn relative_between(path: &PathParts, base: &PathParts, flavor: PathFlavor) -> Result<PathParts> {
    let case_insensitive = flavor.is_windows();
    let anchors_match = PathParts {
        anchor: path.anchor.clone(),
        segments: Vec::new(),
    }
    .starts_with(
        &PathParts {
            anchor: base.anchor.clone(),
            segments: Vec::new(),
        },
        case_insensitive,
    );
    if !anchors_match {
        return Err(Error::InvalidPath {
            path: path.render_for(flavor).into(),
            reason: format!("not on the same root as {}", base.render_for(flavor)),
        });
    }

    let common = path
        .segments
        .iter()
        .zip(&base.segments)
        .take_while(|(a, b)| {
            if case_insensitive {
                a.eq_ignore_ascii_case(b)
            } else {
                a == b
            }
        })
        .count();

    let mut segments: Vec<String> = std::iter::repeat("..".to_string())
        .take(base.segments.len() - common)
        .collect();
    segments.extend(path.segments[common..].iter().cloned());
    Ok(PathParts {
        anchor: super::parts::Anchor::Relative,
        segments,
    })
}

/// A target-base rewrite, written `old_prefix:new_prefix`.
///
/// # Examples
///
/// ```
/// use symkeep::path::PrefixRewrite;
///
/// let rewrite: PrefixRewrite = r"C:\data:/mnt/data".parse().unwrap();
/// assert_eq!(rewrite.old_prefix(), r"C:\data");
/// assert_eq!(rewrite.new_prefix(), "/mnt/data");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrefixRewrite {
    old: String,
    new: String,
}

impl PrefixRewrite {
    /// Build a rewrite from its two halves.
    ///
    /// # Errors
    ///
    /// Returns a validation error if either prefix is empty.
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Result<Self> {
        let (old, new) = (old.into(), new.into());
        if old.trim().is_empty() || new.trim().is_empty() {
            return Err(Error::Validation {
                field: "target_base_rewrite".into(),
                message: "both the old and the new prefix must be non-empty".into(),
            });
        }
        Ok(Self { old, new })
    }

    /// Parse `old:new`, splitting on the first colon that is not part of a
    /// drive letter.
    ///
    /// # Errors
    ///
    /// Returns a validation error if there is no separating colon or
    /// either half is empty.
    pub fn parse(text: &str) -> Result<Self> {
        let split = split_point(text).ok_or_else(|| Error::Validation {
            field: "target_base_rewrite".into(),
            message: format!("'{text}' is not of the form old_prefix:new_prefix"),
        })?;
        Self::new(&text[..split], &text[split + 1..])
    }

    /// The prefix being replaced.
    #[must_use]
    pub fn old_prefix(&self) -> &str {
        &self.old
    }

    /// The replacement prefix.
    #[must_use]
    pub fn new_prefix(&self) -> &str {
        &self.new
    }

    /// Rewrite `path` when it lies under the old prefix.
    ///
    /// Matching is segment-wise and case-insensitive for Windows flavors.
    #[must_use]
    pub fn apply(&self, path: &PathParts, flavor: PathFlavor) -> Option<PathParts> {
        let old_flavor = super::flavor::classify(&self.old, &super::host::HostContext::posix());
        let old = PathParts::parse(&self.old, old_flavor).ok()?;
        let case_insensitive = flavor.is_windows() || old_flavor.is_windows();
        if !path.starts_with(&old, case_insensitive) {
            return None;
        }
        let new_flavor = super::flavor::classify(&self.new, &super::host::HostContext::posix());
        let new = PathParts::parse(&self.new, new_flavor).ok()?;
        Some(path.rebased_onto(old.segments.len(), &new))
    }

    /// Rewrite a path string, returning it in the grammar of the new prefix.
    #[must_use]
    pub fn apply_str(&self, path: &str, flavor: PathFlavor) -> Option<String> {
        let parts = PathParts::parse(path, flavor).ok()?;
        let new_flavor = super::flavor::classify(&self.new, &super::host::HostContext::posix());
        self.apply(&parts, flavor).map(|p| p.render_for(new_flavor))
    }
}

/// Index of the separating colon in `old:new`.
///
/// Only a colon right after a leading letter (`C:`) can belong to the old
/// prefix; the first other colon separates the halves.
fn split_point(text: &str) -> Option<usize> {
    let leading_drive = drive_letter(text).is_some();
    text.bytes()
        .enumerate()
        .filter(|(_, b)| *b == b':')
        .map(|(i, _)| i)
        .find(|&i| !(leading_drive && i == 1))
}

impl FromStr for PrefixRewrite {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PrefixRewrite {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PrefixRewrite> for String {
    fn from(value: PrefixRewrite) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PrefixRewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.old, self.new)
    }
}
