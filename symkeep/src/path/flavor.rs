//! Path grammar classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

use super::host::{HostContext, HostPlatform};
use super::parts::{drive_letter, strip_verbatim};

/// The grammar a path string was written in.
///
/// # Examples
///
/// ```
/// use symkeep::path::PathFlavor;
///
/// let flavor: PathFlavor = "windows-unc".parse().unwrap();
/// assert_eq!(flavor, PathFlavor::WindowsUnc);
/// assert_eq!(flavor.to_string(), "windows-unc");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathFlavor {
    /// Forward-slash paths with no drive prefix.
    Posix,
    /// Drive-letter or backslash paths on a local volume.
    WindowsLocal,
    /// `\\server\share` network paths.
    WindowsUnc,
    /// Drive-letter paths whose drive is a network share mapping.
    WindowsMappedDrive,
}

impl PathFlavor {
    /// All flavors, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Posix,
        Self::WindowsLocal,
        Self::WindowsUnc,
        Self::WindowsMappedDrive,
    ];

    /// Whether this is one of the Windows grammars.
    #[must_use]
    pub const fn is_windows(self) -> bool {
        !matches!(self, Self::Posix)
    }

    /// Native separator of the grammar.
    #[must_use]
    pub const fn separator(self) -> char {
        if self.is_windows() {
            '\\'
        } else {
            '/'
        }
    }

    /// Kebab-case name used in records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Posix => "posix",
            Self::WindowsLocal => "windows-local",
            Self::WindowsUnc => "windows-unc",
            Self::WindowsMappedDrive => "windows-mapped-drive",
        }
    }
}

impl fmt::Display for PathFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathFlavor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| Error::Validation {
                field: "path_flavor".into(),
                message: format!("unknown path flavor '{s}'"),
            })
    }
}

/// Classify `path` against the drive table of `host`.
///
/// Two leading separators mean UNC, a drive prefix means a local drive
/// unless `host` maps that drive to a share, any remaining backslash means
/// Windows-local and everything else is POSIX.
///
/// # Examples
///
/// ```
/// use symkeep::path::{classify, HostContext, PathFlavor};
///
/// let host = HostContext::windows().with_drive('Z', r"\\server\share").unwrap();
/// assert_eq!(classify(r"\\server\share\f.txt", &host), PathFlavor::WindowsUnc);
/// assert_eq!(classify(r"Z:\f.txt", &host), PathFlavor::WindowsMappedDrive);
/// assert_eq!(classify(r"C:\f.txt", &host), PathFlavor::WindowsLocal);
/// assert_eq!(classify("/usr/lib", &host), PathFlavor::Posix);
/// ```
#[must_use]
pub fn classify(path: &str, host: &HostContext) -> PathFlavor {
    let path = strip_verbatim(path);
    if path.starts_with(r"\\") || path.starts_with("//") {
        return PathFlavor::WindowsUnc;
    }
    if let Some(letter) = drive_letter(&path) {
        return if host.maps_drive(letter) {
            PathFlavor::WindowsMappedDrive
        } else {
            PathFlavor::WindowsLocal
        };
    }
    if path.contains('\\') {
        return PathFlavor::WindowsLocal;
    }
    PathFlavor::Posix
}

/// Classify link text read back from this host's own filesystem.
///
/// Unlike [`classify`], which reads any grammar a user may type, this
/// trusts the host: on a POSIX host backslashes, drive-like prefixes and
/// doubled slashes are ordinary characters of a POSIX path.
///
/// # Examples
///
/// ```
/// use symkeep::path::{classify_native, HostContext, PathFlavor};
///
/// let posix = HostContext::posix();
/// assert_eq!(classify_native(r"dir\file.txt", &posix), PathFlavor::Posix);
/// assert_eq!(classify_native("c:notes", &posix), PathFlavor::Posix);
/// assert_eq!(classify_native(r"C:\f.txt", &HostContext::windows()), PathFlavor::WindowsLocal);
/// ```
#[must_use]
pub fn classify_native(path: &str, host: &HostContext) -> PathFlavor {
    match host.platform() {
        HostPlatform::Windows => classify(path, host),
        HostPlatform::Posix => PathFlavor::Posix,
    }
}
