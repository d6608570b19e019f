//! Lexical path grammar shared by every path flavor.
//!
//! A path string parses into an [`Anchor`] plus a list of segments. All
//! normalization here is purely lexical and never touches the filesystem,
//! so it works for paths that only exist on some other machine.

use std::fmt;

use crate::error::{Error, Result};

use super::flavor::PathFlavor;

/// Where a path is anchored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// No anchor: `a/b`, `..\x`.
    Relative,
    /// A POSIX or current-drive root: `/a`, `\a`.
    Root,
    /// Drive-relative: `C:a`.
    Drive(char),
    /// Drive root: `C:\a`.
    DriveRoot(char),
    /// Network share root: `\\server\share`.
    Unc {
        /// Host name.
        server: String,
        /// Share name.
        share: String,
    },
}

impl Anchor {
    /// Whether the anchor pins the path to a fixed location.
    #[must_use]
    pub const fn is_absolute(&self) -> bool {
        matches!(self, Self::Root | Self::DriveRoot(_) | Self::Unc { .. })
    }

    fn eq_with_case(&self, other: &Self, case_insensitive: bool) -> bool {
        match (self, other) {
            (Self::Unc { server: s1, share: h1 }, Self::Unc { server: s2, share: h2 }) => {
                if case_insensitive {
                    s1.eq_ignore_ascii_case(s2) && h1.eq_ignore_ascii_case(h2)
                } else {
                    s1 == s2 && h1 == h2
                }
            }
            (Self::Drive(a), Self::Drive(b)) | (Self::DriveRoot(a), Self::DriveRoot(b)) => {
                a.eq_ignore_ascii_case(b)
            }
            _ => self == other,
        }
    }
}

/// A parsed, lexically normalized path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathParts {
    /// The path's anchor.
    pub anchor: Anchor,
    /// Normal segments; `..` only appears at the front of unanchored paths.
    pub segments: Vec<String>,
}

/// Remove a `\\?\` or `//?/` verbatim prefix.
///
/// `\\?\UNC\server\share` becomes `\\server\share`.
#[must_use]
pub fn strip_verbatim(path: &str) -> std::borrow::Cow<'_, str> {
    for prefix in [r"\\?\", "//?/"] {
        if let Some(rest) = path.strip_prefix(prefix) {
            if rest.len() >= 4 && rest[..4].eq_ignore_ascii_case(r"UNC\") {
                return format!(r"\\{}", &rest[4..]).into();
            }
            if rest.len() >= 4 && rest[..4].eq_ignore_ascii_case("UNC/") {
                return format!("//{}", &rest[4..]).into();
            }
            return rest.into();
        }
    }
    path.into()
}

/// Returns the drive letter if `path` starts with `X:`.
#[must_use]
pub fn drive_letter(path: &str) -> Option<char> {
    let mut chars = path.chars();
    let letter = chars.next()?;
    if letter.is_ascii_alphabetic() && chars.next() == Some(':') {
        Some(letter.to_ascii_uppercase())
    } else {
        None
    }
}

fn is_separator(c: char, flavor: PathFlavor) -> bool {
    c == '/' || (flavor.is_windows() && c == '\\')
}

impl PathParts {
    /// Parse `path` using the grammar of `flavor`.
    ///
    /// POSIX paths only split on `/`; the Windows flavors accept either
    /// separator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for an empty path or a UNC path that
    /// lacks a server or share name.
    ///
    /// # Examples
    ///
    /// ```
    /// use symkeep::path::{Anchor, PathFlavor, PathParts};
    ///
    /// let parts = PathParts::parse(r"\\srv\share\a\..\b", PathFlavor::WindowsUnc).unwrap();
    /// assert!(matches!(parts.anchor, Anchor::Unc { .. }));
    /// assert_eq!(parts.segments, vec!["b".to_string()]);
    /// ```
    pub fn parse(path: &str, flavor: PathFlavor) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::InvalidPath {
                path: path.into(),
                reason: "path is empty".to_string(),
            });
        }

        let stripped = if flavor.is_windows() {
            strip_verbatim(path)
        } else {
            path.into()
        };
        let text: &str = &stripped;
        let mut chars = text.chars();
        let first = chars.next().unwrap_or_default();
        let second = chars.next();

        let drive = if flavor.is_windows() {
            drive_letter(text)
        } else {
            None
        };

        let (anchor, rest) = if flavor.is_windows()
            && is_separator(first, flavor)
            && second.is_some_and(|c| is_separator(c, flavor))
        {
            let mut pieces = text[2..]
                .split(|c| is_separator(c, flavor))
                .filter(|s| !s.is_empty());
            let (Some(server), Some(share)) = (pieces.next(), pieces.next()) else {
                return Err(Error::InvalidPath {
                    path: path.into(),
                    reason: "UNC path needs both a server and a share".to_string(),
                });
            };
            let mut parts = Self {
                anchor: Anchor::Unc {
                    server: server.to_string(),
                    share: share.to_string(),
                },
                segments: Vec::new(),
            };
            for segment in pieces {
                parts.push_segment(segment);
            }
            return Ok(parts);
        } else if let Some(letter) = drive {
            let rest = &text[2..];
            if rest.starts_with(|c| is_separator(c, flavor)) {
                (Anchor::DriveRoot(letter), rest)
            } else {
                (Anchor::Drive(letter), rest)
            }
        } else if is_separator(first, flavor) {
            (Anchor::Root, text)
        } else {
            (Anchor::Relative, text)
        };

        let mut parts = Self {
            anchor,
            segments: Vec::new(),
        };
        for segment in rest.split(|c| is_separator(c, flavor)) {
            parts.push_segment(segment);
        }
        Ok(parts)
    }

    /// Append one raw segment, applying `.` and `..` rules.
    pub fn push_segment(&mut self, segment: &str) {
        match segment {
            "" | "." => {}
            ".." => {
                let can_pop = self.segments.last().is_some_and(|s| s != "..");
                if can_pop {
                    self.segments.pop();
                } else if !self.anchor.is_absolute() {
                    self.segments.push("..".to_string());
                }
            }
            other => self.segments.push(other.to_string()),
        }
    }

    /// Whether this path is anchored to a fixed location.
    #[must_use]
    pub const fn is_absolute(&self) -> bool {
        self.anchor.is_absolute()
    }

    /// The final segment, if any.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str).filter(|s| *s != "..")
    }

    /// Whether `prefix` is a segment-wise prefix of this path.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self, case_insensitive: bool) -> bool {
        if !self.anchor.eq_with_case(&prefix.anchor, case_insensitive) {
            return false;
        }
        if prefix.segments.len() > self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(&prefix.segments)
            .all(|(a, b)| if case_insensitive { a.eq_ignore_ascii_case(b) } else { a == b })
    }

    /// Replace the leading `prefix_len` segments and the anchor with `base`.
    #[must_use]
    pub fn rebased_onto(&self, prefix_len: usize, base: &Self) -> Self {
        let mut out = base.clone();
        for segment in &self.segments[prefix_len.min(self.segments.len())..] {
            out.push_segment(segment);
        }
        out
    }

    /// Render with `separator`, which is `/` or `\`.
    #[must_use]
    pub fn render(&self, separator: char) -> String {
        let sep = separator.to_string();
        let body = self.segments.join(&sep);
        match &self.anchor {
            Anchor::Relative => {
                if body.is_empty() {
                    ".".to_string()
                } else {
                    body
                }
            }
            Anchor::Root => format!("{sep}{body}"),
            Anchor::Drive(c) => format!("{c}:{body}"),
            Anchor::DriveRoot(c) => format!("{c}:{sep}{body}"),
            Anchor::Unc { server, share } => {
                if body.is_empty() {
                    format!("{sep}{sep}{server}{sep}{share}")
                } else {
                    format!("{sep}{sep}{server}{sep}{share}{sep}{body}")
                }
            }
        }
    }

    /// Render in the native grammar of `flavor`.
    #[must_use]
    pub fn render_for(&self, flavor: PathFlavor) -> String {
        self.render(flavor.separator())
    }
}

impl fmt::Display for PathParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render('/'))
    }
}

/// Lexically normalize `path` in the grammar of `flavor`.
///
/// # Errors
///
/// Returns an error if the path cannot be parsed.
///
/// # Examples
///
/// ```
/// use symkeep::path::{normalize, PathFlavor};
///
/// assert_eq!(normalize("/a/./b//c/../d", PathFlavor::Posix).unwrap(), "/a/b/d");
/// assert_eq!(normalize("c:/Users//me", PathFlavor::WindowsLocal).unwrap(), r"C:\Users\me");
/// ```
pub fn normalize(path: &str, flavor: PathFlavor) -> Result<String> {
    Ok(PathParts::parse(path, flavor)?.render_for(flavor))
}
