//! Conversion of recorded paths to portable and host-local forms.

use std::sync::Arc;

use crate::error::{Error, Result};

use super::flavor::{classify, classify_native, PathFlavor};
use super::host::{HostContext, HostPlatform, PathPreference};
use super::parts::{Anchor, PathParts};
use super::rebase::PrefixRewrite;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateKind {
    Unc,
    Drive,
    Native,
}

/// Convert `path` to its portable, forward-slash form.
///
/// Mapped drives are expanded to their share when `host` knows the
/// mapping, so the portable form names the network location rather than a
/// host-specific letter.
///
/// # Errors
///
/// Returns an error if the path cannot be parsed.
///
/// # Examples
///
/// ```
/// use symkeep::path::{to_portable, HostContext, PathFlavor};
///
/// let host = HostContext::windows().with_drive('Z', r"\\srv\share").unwrap();
/// assert_eq!(
///     to_portable(r"Z:\docs\a.txt", PathFlavor::WindowsMappedDrive, &host).unwrap(),
///     "//srv/share/docs/a.txt"
/// );
/// assert_eq!(
///     to_portable(r"C:\Users\me", PathFlavor::WindowsLocal, &host).unwrap(),
///     "C:/Users/me"
/// );
/// ```
pub fn to_portable(path: &str, flavor: PathFlavor, host: &HostContext) -> Result<String> {
    let parts = PathParts::parse(path, flavor)?;
    if flavor == PathFlavor::WindowsMappedDrive {
        if let Some(unc) = host.unc_for_drive(&parts) {
            return Ok(unc.render('/'));
        }
    }
    Ok(parts.render('/'))
}

/// Resolve a recorded path to a path usable on `host`.
///
/// Candidates are tried in order: the UNC form when the host can reach the
/// share, the drive or mount translation of the share (and the reverse for
/// mapped drives), the path itself when it is already in the host's
/// grammar, and finally `rewrite`. When several candidates resolve the
/// host's [`PathPreference`] decides. Relative paths resolve to themselves.
///
/// # Errors
///
/// Returns [`Error::PathUnresolvable`] listing every candidate tried when
/// none is usable on this host.
///
/// # Examples
///
/// ```
/// use symkeep::path::{to_local, HostContext, PathFlavor, PathPreference};
///
/// let host = HostContext::windows()
///     .with_drive('Z', r"\\server\share").unwrap()
///     .with_preference(PathPreference::Drive);
/// let local = to_local(r"\\server\share\f.txt", PathFlavor::WindowsUnc, &host, None).unwrap();
/// assert_eq!(local, r"Z:\f.txt");
/// ```
pub fn to_local(
    path: &str,
    flavor: PathFlavor,
    host: &HostContext,
    rewrite: Option<&PrefixRewrite>,
) -> Result<String> {
    let parts = PathParts::parse(path, flavor)?;
    let native = host.platform().native_flavor();

    if parts.anchor == Anchor::Relative {
        return Ok(parts.render_for(native));
    }

    let mut attempted = Vec::new();
    let mut resolved: Vec<(CandidateKind, String)> = Vec::new();

    match (&parts.anchor, host.platform()) {
        (Anchor::Unc { .. }, HostPlatform::Windows) => {
            let unc = parts.render('\\');
            attempted.push(unc.clone());
            if host.share_reachable(&parts) {
                resolved.push((CandidateKind::Unc, unc));
            }
            if let Some(drive) = host.drive_for_unc(&parts) {
                let drive = drive.render('\\');
                attempted.push(drive.clone());
                resolved.push((CandidateKind::Drive, drive));
            }
        }
        (Anchor::Unc { .. }, HostPlatform::Posix) => {
            attempted.push(parts.render('/'));
            if let Some(mount) = host.mount_for_unc(&parts) {
                let mount = mount.render('/');
                attempted.push(mount.clone());
                resolved.push((CandidateKind::Native, mount));
            }
        }
        (Anchor::DriveRoot(_) | Anchor::Drive(_), HostPlatform::Windows) => {
            let drive = parts.render('\\');
            attempted.push(drive.clone());
            if let Some(unc) = host.unc_for_drive(&parts) {
                let unc = unc.render('\\');
                attempted.push(unc.clone());
                resolved.push((CandidateKind::Drive, drive));
                resolved.push((CandidateKind::Unc, unc));
            } else {
                resolved.push((CandidateKind::Native, drive));
            }
        }
        (Anchor::DriveRoot(_) | Anchor::Drive(_), HostPlatform::Posix) => {
            attempted.push(parts.render('\\'));
        }
        (Anchor::Root, HostPlatform::Posix) => {
            let local = parts.render('/');
            attempted.push(local.clone());
            resolved.push((CandidateKind::Native, local));
        }
        (Anchor::Root, HostPlatform::Windows) => {
            attempted.push(parts.render('/'));
        }
        // Returned early above.
        (Anchor::Relative, _) => {}
    }

    if let Some(choice) = choose(&resolved, flavor, host.preference()) {
        return Ok(choice);
    }

    if let Some(rewrite) = rewrite {
        if let Some(rewritten) = rewrite.apply(&parts, flavor) {
            let usable = match host.platform() {
                HostPlatform::Posix => matches!(rewritten.anchor, Anchor::Root),
                HostPlatform::Windows => matches!(
                    rewritten.anchor,
                    Anchor::DriveRoot(_) | Anchor::Unc { .. }
                ),
            };
            let rendered = rewritten.render_for(native);
            attempted.push(rendered.clone());
            if usable {
                return Ok(rendered);
            }
        }
    }

    Err(Error::PathUnresolvable {
        path: path.to_string(),
        candidates: attempted,
    })
}

fn choose(
    resolved: &[(CandidateKind, String)],
    flavor: PathFlavor,
    preference: PathPreference,
) -> Option<String> {
    let wanted = match preference {
        PathPreference::Unc => Some(CandidateKind::Unc),
        PathPreference::Drive => Some(CandidateKind::Drive),
        PathPreference::Original => match flavor {
            PathFlavor::WindowsUnc => Some(CandidateKind::Unc),
            PathFlavor::WindowsMappedDrive => Some(CandidateKind::Drive),
            PathFlavor::Posix | PathFlavor::WindowsLocal => None,
        },
    };
    wanted
        .and_then(|kind| resolved.iter().find(|(k, _)| *k == kind))
        .or_else(|| resolved.first())
        .map(|(_, path)| path.clone())
}

/// Path resolution bound to one host snapshot and an optional
/// target-base rewrite.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use symkeep::path::{HostContext, PathFlavor, PathResolver};
///
/// let resolver = PathResolver::new(Arc::new(HostContext::posix()));
/// assert_eq!(resolver.classify("/srv/data"), PathFlavor::Posix);
/// assert_eq!(resolver.to_local("/srv/./data", PathFlavor::Posix).unwrap(), "/srv/data");
/// ```
#[derive(Debug, Clone)]
pub struct PathResolver {
    host: Arc<HostContext>,
    rewrite: Option<PrefixRewrite>,
}

impl PathResolver {
    /// Create a resolver for `host`.
    #[must_use]
    pub const fn new(host: Arc<HostContext>) -> Self {
        Self {
            host,
            rewrite: None,
        }
    }

    /// Attach a target-base rewrite used as the last resolution fallback.
    #[must_use]
    pub fn with_rewrite(mut self, rewrite: Option<PrefixRewrite>) -> Self {
        self.rewrite = rewrite;
        self
    }

    /// The host snapshot in use.
    #[must_use]
    pub fn host(&self) -> &HostContext {
        &self.host
    }

    /// Classify `path` against this host's drive table.
    #[must_use]
    pub fn classify(&self, path: &str) -> PathFlavor {
        classify(path, &self.host)
    }

    /// Classify link text read from this host's filesystem.
    #[must_use]
    pub fn classify_native(&self, path: &str) -> PathFlavor {
        classify_native(path, &self.host)
    }

    /// Lexically normalize `path` in the grammar of `flavor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be parsed.
    pub fn normalize(&self, path: &str, flavor: PathFlavor) -> Result<String> {
        super::parts::normalize(path, flavor)
    }

    /// See [`to_portable`].
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be parsed.
    pub fn to_portable(&self, path: &str, flavor: PathFlavor) -> Result<String> {
        to_portable(path, flavor, &self.host)
    }

    /// See [`to_local`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathUnresolvable`] when no candidate is usable.
    pub fn to_local(&self, path: &str, flavor: PathFlavor) -> Result<String> {
        to_local(path, flavor, &self.host, self.rewrite.as_ref())
    }

    /// Resolve the first usable form among `forms`, merging the attempted
    /// candidates of every failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathUnresolvable`] when none of the forms resolve.
    pub fn to_local_any(&self, forms: &[(&str, PathFlavor)]) -> Result<String> {
        let mut candidates = Vec::new();
        let mut first_path = None;
        for (path, flavor) in forms {
            first_path.get_or_insert_with(|| (*path).to_string());
            match self.to_local(path, *flavor) {
                Ok(local) => return Ok(local),
                Err(Error::PathUnresolvable { candidates: tried, .. }) => {
                    for candidate in tried {
                        if !candidates.contains(&candidate) {
                            candidates.push(candidate);
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::PathUnresolvable {
            path: first_path.unwrap_or_default(),
            candidates,
        })
    }
}
