//! Discovering symbolic links under a directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::path::local::resolve_link_target;
use crate::record::TargetKind;

/// One discovered link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkInfo {
    /// The link path.
    pub link: PathBuf,
    /// The link text.
    pub target: PathBuf,
    /// Where the text points, relative text joined to the link directory.
    pub resolved: PathBuf,
    /// What the target currently is.
    pub kind: TargetKind,
    /// Whether the text is relative.
    pub relative: bool,
    /// Whether the target is missing.
    pub broken: bool,
}

/// List the symbolic links under `dir`.
///
/// Links are never followed, so a link to a directory is listed but not
/// descended into. The result is sorted.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if `dir` does not exist and
/// [`Error::InvalidPath`] if it is not a directory. Unreadable
/// subdirectories are logged and skipped.
///
/// # Examples
///
/// ```no_run
/// use symkeep::operations::scan::scan_links;
/// use std::path::Path;
///
/// for link in scan_links(Path::new("/srv/links"), true)? {
///     println!("{}", link.display());
/// }
/// # Ok::<(), symkeep::Error>(())
/// ```
pub fn scan_links(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let meta = fs::metadata(dir).map_err(|_| Error::NotFound {
        resource: dir.display().to_string(),
    })?;
    if !meta.is_dir() {
        return Err(Error::InvalidPath {
            path: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut links = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).max_depth(max_depth) {
        match entry {
            Ok(entry) if entry.depth() > 0 && entry.path_is_symlink() => {
                links.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => log::warn!("skipping unreadable entry under {}: {e}", dir.display()),
        }
    }
    links.sort();
    log::debug!("found {} links under {}", links.len(), dir.display());
    Ok(links)
}

/// Describe the link at `link`.
///
/// # Errors
///
/// Returns [`Error::NotASymlink`] if `link` is not a symbolic link.
pub fn inspect(link: &Path) -> Result<LinkInfo> {
    let target = fs::read_link(link).map_err(|e| match fs::symlink_metadata(link) {
        Ok(_) => Error::NotASymlink {
            path: link.to_path_buf(),
        },
        Err(_) => Error::from_io_at(link, e),
    })?;
    let resolved = resolve_link_target(link, &target);
    let kind = match fs::metadata(link) {
        Ok(meta) if meta.is_dir() => TargetKind::Directory,
        Ok(_) => TargetKind::File,
        Err(_) => TargetKind::Missing,
    };
    Ok(LinkInfo {
        link: link.to_path_buf(),
        relative: !target.is_absolute(),
        target,
        resolved,
        kind,
        broken: kind == TargetKind::Missing,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("file.txt"), "x").unwrap();
        symlink("file.txt", root.join("b-link")).unwrap();
        symlink("missing", root.join("a-broken")).unwrap();
        symlink("../../file.txt", root.join("sub/deeper/nested")).unwrap();
        symlink(root.join("sub"), root.join("dir-link")).unwrap();
        dir
    }

    #[test]
    fn test_scan_recursive_sorted() {
        let dir = tree();
        let links = scan_links(dir.path(), true).unwrap();
        let names: Vec<PathBuf> = links
            .iter()
            .map(|l| l.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a-broken"),
                PathBuf::from("b-link"),
                PathBuf::from("dir-link"),
                PathBuf::from("sub/deeper/nested"),
            ]
        );
    }

    #[test]
    fn test_scan_flat() {
        let dir = tree();
        let links = scan_links(dir.path(), false).unwrap();
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn test_scan_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            scan_links(&dir.path().join("none"), true),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_inspect() {
        let dir = tree();
        let ok = inspect(&dir.path().join("sub/deeper/nested")).unwrap();
        assert!(!ok.broken);
        assert!(ok.relative);
        assert_eq!(ok.kind, TargetKind::File);
        assert_eq!(ok.resolved, dir.path().join("file.txt"));

        let broken = inspect(&dir.path().join("a-broken")).unwrap();
        assert!(broken.broken);
        assert_eq!(broken.kind, TargetKind::Missing);

        let dir_link = inspect(&dir.path().join("dir-link")).unwrap();
        assert_eq!(dir_link.kind, TargetKind::Directory);

        assert!(matches!(
            inspect(&dir.path().join("file.txt")),
            Err(Error::NotASymlink { .. })
        ));
    }
}
