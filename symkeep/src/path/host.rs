//! Snapshot of the current host's drive, share and mount tables.
//!
//! A [`HostContext`] is an immutable value passed explicitly into path
//! resolution. Refreshing it produces a new snapshot through
//! [`SharedHostContext::refresh`]; operations already holding the old
//! snapshot keep using it.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::flavor::PathFlavor;
use super::parts::{Anchor, PathParts};

/// Which path grammar family the host uses natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    /// Drive letters, UNC shares, backslashes.
    Windows,
    /// A single root, forward slashes.
    Posix,
}

impl HostPlatform {
    /// The platform this binary was built for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    /// Flavor used when rendering local paths.
    #[must_use]
    pub const fn native_flavor(self) -> PathFlavor {
        match self {
            Self::Windows => PathFlavor::WindowsLocal,
            Self::Posix => PathFlavor::Posix,
        }
    }
}

/// Which candidate wins when several local forms resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathPreference {
    /// Prefer the form matching the recorded flavor.
    #[default]
    Original,
    /// Prefer `\\server\share` forms.
    Unc,
    /// Prefer mapped drive letters.
    Drive,
}

impl fmt::Display for PathPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::Unc => write!(f, "unc"),
            Self::Drive => write!(f, "drive"),
        }
    }
}

impl FromStr for PathPreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "unc" => Ok(Self::Unc),
            "drive" => Ok(Self::Drive),
            _ => Err(Error::Validation {
                field: "path_preference".into(),
                message: format!("unknown preference '{s}' (expected original, unc or drive)"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DriveMapping {
    letter: char,
    share: PathParts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MountMapping {
    share: PathParts,
    mount_point: PathParts,
}

/// Drive, share and mount tables of one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    platform: HostPlatform,
    drives: Vec<DriveMapping>,
    mounts: Vec<MountMapping>,
    exposed: Vec<PathParts>,
    open_shares: bool,
    preference: PathPreference,
}

fn parse_share(share: &str) -> Result<PathParts> {
    let parts = PathParts::parse(share, PathFlavor::WindowsUnc)?;
    if matches!(parts.anchor, Anchor::Unc { .. }) {
        Ok(parts)
    } else {
        Err(Error::Validation {
            field: "share".into(),
            message: format!("'{share}' is not a \\\\server\\share path"),
        })
    }
}

impl HostContext {
    /// An empty POSIX host.
    #[must_use]
    pub const fn posix() -> Self {
        Self::empty(HostPlatform::Posix)
    }

    /// An empty Windows host. Unknown shares are not assumed reachable.
    #[must_use]
    pub const fn windows() -> Self {
        Self::empty(HostPlatform::Windows)
    }

    /// An empty host for the build platform.
    #[must_use]
    pub const fn current() -> Self {
        Self::empty(HostPlatform::current())
    }

    const fn empty(platform: HostPlatform) -> Self {
        Self {
            platform,
            drives: Vec::new(),
            mounts: Vec::new(),
            exposed: Vec::new(),
            open_shares: false,
            preference: PathPreference::Original,
        }
    }

    /// Record that `letter` is mapped to `share` (which may include a
    /// sub-directory of the share).
    ///
    /// # Errors
    ///
    /// Returns an error if `share` is not a UNC path.
    pub fn with_drive(mut self, letter: char, share: &str) -> Result<Self> {
        let letter = letter.to_ascii_uppercase();
        let share = parse_share(share)?;
        self.drives.retain(|d| d.letter != letter);
        self.drives.push(DriveMapping { letter, share });
        Ok(self)
    }

    /// Record that the host can reach `share` directly.
    ///
    /// # Errors
    ///
    /// Returns an error if `share` is not a UNC path.
    pub fn with_exposed_share(mut self, share: &str) -> Result<Self> {
        self.exposed.push(parse_share(share)?);
        Ok(self)
    }

    /// Record that `share` is mounted at `mount_point` (POSIX hosts).
    ///
    /// # Errors
    ///
    /// Returns an error if `share` is not a UNC path or `mount_point` is
    /// not absolute.
    pub fn with_mount(mut self, share: &str, mount_point: &str) -> Result<Self> {
        let share = parse_share(share)?;
        let mount_point = PathParts::parse(mount_point, PathFlavor::Posix)?;
        if !mount_point.is_absolute() {
            return Err(Error::Validation {
                field: "mount_point".into(),
                message: format!("mount point '{mount_point}' must be absolute"),
            });
        }
        self.mounts.push(MountMapping { share, mount_point });
        Ok(self)
    }

    /// Treat every UNC share as reachable.
    #[must_use]
    pub const fn with_open_shares(mut self, open: bool) -> Self {
        self.open_shares = open;
        self
    }

    /// Set the candidate preference.
    #[must_use]
    pub const fn with_preference(mut self, preference: PathPreference) -> Self {
        self.preference = preference;
        self
    }

    /// The host's platform.
    #[must_use]
    pub const fn platform(&self) -> HostPlatform {
        self.platform
    }

    /// The candidate preference.
    #[must_use]
    pub const fn preference(&self) -> PathPreference {
        self.preference
    }

    /// Whether `letter` is a known share mapping.
    #[must_use]
    pub fn maps_drive(&self, letter: char) -> bool {
        let letter = letter.to_ascii_uppercase();
        self.drives.iter().any(|d| d.letter == letter)
    }

    /// Whether `path` (a UNC path) is on a share this host can reach.
    #[must_use]
    pub fn share_reachable(&self, path: &PathParts) -> bool {
        self.open_shares
            || self.exposed.iter().any(|share| path.starts_with(share, true))
            || self.drives.iter().any(|d| path.starts_with(&d.share, true))
    }

    /// Translate a UNC path to the mapped drive with the longest matching
    /// share prefix.
    #[must_use]
    pub fn drive_for_unc(&self, path: &PathParts) -> Option<PathParts> {
        self.drives
            .iter()
            .filter(|d| path.starts_with(&d.share, true))
            .max_by_key(|d| d.share.segments.len())
            .map(|d| {
                let base = PathParts {
                    anchor: Anchor::DriveRoot(d.letter),
                    segments: Vec::new(),
                };
                path.rebased_onto(d.share.segments.len(), &base)
            })
    }

    /// Expand a drive-rooted path through the drive table.
    #[must_use]
    pub fn unc_for_drive(&self, path: &PathParts) -> Option<PathParts> {
        let Anchor::DriveRoot(letter) = path.anchor else {
            return None;
        };
        self.drives
            .iter()
            .find(|d| d.letter == letter.to_ascii_uppercase())
            .map(|d| path.rebased_onto(0, &d.share))
    }

    /// Translate a UNC path to a local mount point with the longest
    /// matching share prefix.
    #[must_use]
    pub fn mount_for_unc(&self, path: &PathParts) -> Option<PathParts> {
        self.mounts
            .iter()
            .filter(|m| path.starts_with(&m.share, true))
            .max_by_key(|m| m.share.segments.len())
            .map(|m| path.rebased_onto(m.share.segments.len(), &m.mount_point))
    }

    /// Probe the running system for its drive and mount tables.
    ///
    /// Failures degrade to an empty table.
    #[must_use]
    pub fn detect() -> Self {
        let mut host = Self::current();
        if cfg!(windows) {
            host.open_shares = true;
            match std::process::Command::new("net").arg("use").output() {
                Ok(output) => {
                    let text = String::from_utf8_lossy(&output.stdout);
                    for (letter, share) in parse_net_use(&text) {
                        if let Ok(updated) = host.clone().with_drive(letter, &share) {
                            host = updated;
                        }
                    }
                }
                Err(e) => log::debug!("could not run 'net use': {e}"),
            }
        } else {
            match std::fs::read_to_string("/proc/mounts") {
                Ok(table) => {
                    for (share, mount_point) in parse_mount_table(&table) {
                        if let Ok(updated) = host.clone().with_mount(&share, &mount_point) {
                            host = updated;
                        }
                    }
                }
                Err(e) => log::debug!("no mount table available: {e}"),
            }
        }
        log::debug!(
            "host context: {} drive mapping(s), {} share mount(s)",
            host.drives.len(),
            host.mounts.len()
        );
        host
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self::current()
    }
}

/// Extract `(drive, share)` pairs from `net use` output.
///
/// Lines look like `OK           Z:        \\server\share   Microsoft Windows Network`;
/// the status column may be blank.
///
/// # Examples
///
/// ```
/// use symkeep::path::host::parse_net_use;
///
/// let out = "OK           Z:        \\\\nas\\media   Microsoft Windows Network\n";
/// assert_eq!(parse_net_use(out), vec![('Z', r"\\nas\media".to_string())]);
/// ```
#[must_use]
pub fn parse_net_use(output: &str) -> Vec<(char, String)> {
    let mut mappings = Vec::new();
    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().take(3).collect();
        let Some(drive_idx) = tokens.iter().take(2).position(|t| {
            t.len() == 2 && t.ends_with(':') && t.starts_with(|c: char| c.is_ascii_alphabetic())
        }) else {
            continue;
        };
        let Some(remote) = tokens.get(drive_idx + 1) else {
            continue;
        };
        if !remote.starts_with(r"\\") {
            continue;
        }
        let letter = tokens[drive_idx]
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase());
        if let Some(letter) = letter {
            mappings.push((letter, (*remote).to_string()));
        }
    }
    mappings
}

/// Extract `(share, mount point)` pairs for SMB/CIFS entries of a
/// `/proc/mounts` style table.
#[must_use]
pub fn parse_mount_table(table: &str) -> Vec<(String, String)> {
    table
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let source = fields.next()?;
            let target = fields.next()?;
            let fstype = fields.next()?;
            if !matches!(fstype, "cifs" | "smb3" | "smbfs") || !source.starts_with("//") {
                return None;
            }
            Some((decode_mount_escapes(source), decode_mount_escapes(target)))
        })
        .collect()
}

fn decode_mount_escapes(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut rest = field;
    while let Some(idx) = rest.find('\\') {
        out.push_str(&rest[..idx]);
        let code = rest.get(idx + 1..idx + 4);
        match code.and_then(|c| u8::from_str_radix(c, 8).ok()) {
            Some(byte) => {
                out.push(char::from(byte));
                rest = &rest[idx + 4..];
            }
            None => {
                out.push('\\');
                rest = &rest[idx + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// A host context shared across threads.
///
/// Readers take a cheap snapshot; a refresh swaps in a new snapshot under
/// the write lock.
#[derive(Debug, Clone)]
pub struct SharedHostContext {
    inner: Arc<RwLock<Arc<HostContext>>>,
}

impl SharedHostContext {
    /// Wrap an initial snapshot.
    #[must_use]
    pub fn new(host: HostContext) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(host))),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<HostContext> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the snapshot. Existing snapshots are unaffected.
    pub fn refresh(&self, host: HostContext) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(host);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unc(path: &str) -> PathParts {
        PathParts::parse(path, PathFlavor::WindowsUnc).unwrap()
    }

    #[test]
    fn test_parse_net_use_variants() {
        let output = "\
New connections will be remembered.

Status       Local     Remote                    Network
-------------------------------------------------------------------------------
OK           Z:        \\\\server\\share          Microsoft Windows Network
Disconnected Y:        \\\\nas\\backup            Microsoft Windows Network
             X:        \\\\host\\docs             Microsoft Windows Network
OK                     \\\\host\\ipc$             Microsoft Windows Network
The command completed successfully.
";
        let parsed = parse_net_use(output);
        assert_eq!(
            parsed,
            vec![
                ('Z', r"\\server\share".to_string()),
                ('Y', r"\\nas\backup".to_string()),
                ('X', r"\\host\docs".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_mount_table() {
        let table = "\
/dev/sda1 / ext4 rw 0 0
//nas/media /mnt/media cifs rw 0 0
//nas/my\\040files /mnt/my\\040files smb3 rw 0 0
";
        let mounts = parse_mount_table(table);
        assert_eq!(
            mounts,
            vec![
                ("//nas/media".to_string(), "/mnt/media".to_string()),
                ("//nas/my files".to_string(), "/mnt/my files".to_string()),
            ]
        );
    }

    #[test]
    fn test_drive_for_unc_uses_longest_prefix() {
        let host = HostContext::windows()
            .with_drive('Z', r"\\srv\share")
            .unwrap()
            .with_drive('Y', r"\\srv\share\deep")
            .unwrap();
        let mapped = host.drive_for_unc(&unc(r"\\SRV\share\deep\f.txt")).unwrap();
        assert_eq!(mapped.render('\\'), r"Y:\f.txt");
        let shallow = host.drive_for_unc(&unc(r"\\srv\share\other")).unwrap();
        assert_eq!(shallow.render('\\'), r"Z:\other");
    }

    #[test]
    fn test_unc_for_drive() {
        let host = HostContext::windows().with_drive('z', r"\\srv\share").unwrap();
        let drive = PathParts::parse(r"Z:\a\b", PathFlavor::WindowsMappedDrive).unwrap();
        assert_eq!(host.unc_for_drive(&drive).unwrap().render('\\'), r"\\srv\share\a\b");
        let other = PathParts::parse(r"C:\a", PathFlavor::WindowsLocal).unwrap();
        assert!(host.unc_for_drive(&other).is_none());
    }

    #[test]
    fn test_share_reachability() {
        let host = HostContext::windows()
            .with_exposed_share(r"\\srv\public")
            .unwrap();
        assert!(host.share_reachable(&unc(r"\\srv\public\x")));
        assert!(!host.share_reachable(&unc(r"\\srv\private\x")));
        let open = HostContext::windows().with_open_shares(true);
        assert!(open.share_reachable(&unc(r"\\any\where")));
    }

    #[test]
    fn test_mount_for_unc() {
        let host = HostContext::posix()
            .with_mount("//nas/media", "/mnt/media")
            .unwrap();
        let local = host.mount_for_unc(&unc(r"\\nas\media\films\a.mkv")).unwrap();
        assert_eq!(local.render('/'), "/mnt/media/films/a.mkv");
        assert!(HostContext::posix()
            .with_mount("//nas/media", "relative")
            .is_err());
    }

    #[test]
    fn test_with_drive_rejects_non_unc() {
        assert!(HostContext::windows().with_drive('Z', r"C:\x").is_err());
    }

    #[test]
    fn test_preference_parse() {
        assert_eq!("UNC".parse::<PathPreference>().unwrap(), PathPreference::Unc);
        assert!("nearest".parse::<PathPreference>().is_err());
    }

    #[test]
    fn test_shared_refresh_keeps_old_snapshot() {
        let shared = SharedHostContext::new(HostContext::windows());
        let before = shared.snapshot();
        shared.refresh(HostContext::windows().with_drive('Z', r"\\a\b").unwrap());
        assert!(!before.maps_drive('Z'));
        assert!(shared.snapshot().maps_drive('Z'));
    }
}
