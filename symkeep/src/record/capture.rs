//! Building records from the live filesystem.

use std::fs::{self, Metadata};
use std::path::Path;

use chrono::Utc;

use crate::error::{Error, Result};
use crate::path::local::{absolutize, resolve_link_target};
use crate::path::{PathParts, PathResolver};
use crate::timestamp::{self, CapturedTimestamps, TimestampSet};

use super::model::{
    Attributes, ExecutionMode, HistoryReason, LinkRecord, PathRepr, TargetInfo, TargetKind,
    FORMAT_VERSION,
};

fn path_text(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: "path contains invalid UTF-8".to_string(),
    })
}

fn target_kind(meta: Option<&Metadata>) -> TargetKind {
    match meta {
        Some(m) if m.is_dir() => TargetKind::Directory,
        Some(_) => TargetKind::File,
        None => TargetKind::Missing,
    }
}

/// Capture the symbolic link at `link` into a record.
///
/// The link is never followed when locating it; the target is stat'ed for
/// its kind, size and timestamps when it resolves.
///
/// # Errors
///
/// Returns [`Error::NotASymlink`] if `link` is not a symbolic link, or an
/// I/O error if it cannot be read.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use std::sync::Arc;
/// use symkeep::path::{HostContext, PathResolver};
/// use symkeep::record::{capture_link, ExecutionMode};
///
/// let resolver = PathResolver::new(Arc::new(HostContext::detect()));
/// let record = capture_link(Path::new("docs-link"), &resolver, ExecutionMode::Info)?;
/// println!("{} -> {}", record.link, record.target.path);
/// # Ok::<(), symkeep::Error>(())
/// ```
pub fn capture_link(link: &Path, resolver: &PathResolver, mode: ExecutionMode) -> Result<LinkRecord> {
    let link = absolutize(link)?;
    let link_meta = fs::symlink_metadata(&link).map_err(|e| Error::from_io_at(&link, e))?;
    if !link_meta.file_type().is_symlink() {
        return Err(Error::NotASymlink { path: link });
    }

    let text = fs::read_link(&link)?;
    let target_meta = fs::metadata(&link).ok();
    let timestamps = timestamp::capture(&link)?;
    let attributes = capture_attributes(&link, &link_meta, target_meta.as_ref());

    log::debug!("captured {} -> {}", link.display(), text.display());
    build(
        &link,
        PathRepr::capture_native(path_text(&text)?, resolver)?,
        !text.is_absolute(),
        target_meta.as_ref(),
        timestamps,
        attributes,
        resolver,
        mode,
    )
}

/// Build a record for a link that does not exist yet.
///
/// `target` is interpreted like link text: relative targets are relative to
/// the link's directory.
///
/// # Errors
///
/// Returns an error if either path cannot be made absolute or parsed.
pub fn record_for_target(
    target: &str,
    link: &Path,
    resolver: &PathResolver,
    mode: ExecutionMode,
) -> Result<LinkRecord> {
    let link = absolutize(link)?;
    let target_path = Path::new(target);
    let relative = !PathParts::parse(target, resolver.classify(target))?.is_absolute();
    let resolved = resolve_link_target(&link, target_path);
    let target_meta = fs::metadata(&resolved).ok();
    let timestamps = CapturedTimestamps {
        link: TimestampSet::default(),
        target: target_meta.as_ref().map(timestamp::capture::from_metadata),
    };
    build(
        &link,
        PathRepr::capture(target, resolver)?,
        relative,
        target_meta.as_ref(),
        timestamps,
        Attributes::default(),
        resolver,
        mode,
    )
}

#[allow(clippy::too_many_arguments)]
fn build(
    link: &Path,
    target: PathRepr,
    relative: bool,
    target_meta: Option<&Metadata>,
    timestamps: CapturedTimestamps,
    attributes: Attributes,
    resolver: &PathResolver,
    mode: ExecutionMode,
) -> Result<LinkRecord> {
    let kind = target_kind(target_meta);
    let mut record = LinkRecord {
        format_version: FORMAT_VERSION,
        created_by: LinkRecord::creator(),
        captured_at: Some(Utc::now()),
        platform: std::env::consts::OS.to_string(),
        link: PathRepr::capture_native(path_text(link)?, resolver)?,
        target: TargetInfo {
            path: target,
            kind,
            relative,
            size: target_meta.filter(|m| m.is_file()).map(Metadata::len),
        },
        timestamps,
        attributes,
        execution_mode: mode,
        embedded_config: None,
        history: Vec::new(),
    };
    record.touch(HistoryReason::Captured);
    Ok(record)
}

#[cfg(unix)]
fn capture_attributes(link: &Path, link_meta: &Metadata, target_meta: Option<&Metadata>) -> Attributes {
    use std::os::unix::fs::PermissionsExt;

    let mode = target_meta.map(|m| m.permissions().mode() & 0o7777);
    Attributes {
        hidden: link
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.')),
        system: false,
        readonly: link_meta.permissions().readonly(),
        executable: mode.map(|m| m & 0o111 != 0),
        mode,
        extra: serde_json::Map::new(),
    }
}

#[cfg(windows)]
fn capture_attributes(_link: &Path, link_meta: &Metadata, _target_meta: Option<&Metadata>) -> Attributes {
    use std::os::windows::fs::MetadataExt;

    const FILE_ATTRIBUTE_READONLY: u32 = 0x1;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;

    let bits = link_meta.file_attributes();
    Attributes {
        hidden: bits & FILE_ATTRIBUTE_HIDDEN != 0,
        system: bits & FILE_ATTRIBUTE_SYSTEM != 0,
        readonly: bits & FILE_ATTRIBUTE_READONLY != 0,
        executable: None,
        mode: None,
        extra: serde_json::Map::new(),
    }
}

#[cfg(not(any(unix, windows)))]
fn capture_attributes(_link: &Path, link_meta: &Metadata, _target_meta: Option<&Metadata>) -> Attributes {
    Attributes {
        readonly: link_meta.permissions().readonly(),
        ..Attributes::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{HostContext, PathFlavor};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn resolver() -> PathResolver {
        PathResolver::new(Arc::new(HostContext::current()))
    }

    #[test]
    fn test_capture_rejects_regular_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, "x").unwrap();
        let err = capture_link(&file, &resolver(), ExecutionMode::Info).unwrap_err();
        assert!(matches!(err, Error::NotASymlink { .. }));
    }

    #[test]
    #[cfg(unix)]
    fn test_capture_absolute_file_link() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, "abc").unwrap();
        let link = dir.path().join("l");
        std::os::unix::fs::symlink(&file, &link).unwrap();

        let record = capture_link(&link, &resolver(), ExecutionMode::Auto).unwrap();
        assert_eq!(record.format_version, FORMAT_VERSION);
        assert_eq!(record.link.raw, link.to_str().unwrap());
        assert_eq!(record.target.path.raw, file.to_str().unwrap());
        assert_eq!(record.target.path.flavor, PathFlavor::Posix);
        assert_eq!(record.target.kind, TargetKind::File);
        assert_eq!(record.target.size, Some(3));
        assert!(!record.target.relative);
        assert!(record.timestamps.target.is_some());
        assert_eq!(record.execution_mode, ExecutionMode::Auto);
        assert_eq!(record.history[0].reason, HistoryReason::Captured);
    }

    #[test]
    #[cfg(unix)]
    fn test_capture_relative_directory_link() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::create_dir(dir.path().join("links")).unwrap();
        let link = dir.path().join("links").join("d");
        std::os::unix::fs::symlink("../data", &link).unwrap();

        let record = capture_link(&link, &resolver(), ExecutionMode::Info).unwrap();
        assert!(record.target.relative);
        assert_eq!(record.target.path.raw, "../data");
        assert_eq!(record.target.kind, TargetKind::Directory);
        assert!(record.target.size.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn test_capture_dangling_link() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("l");
        std::os::unix::fs::symlink("/nonexistent/target", &link).unwrap();

        let record = capture_link(&link, &resolver(), ExecutionMode::Info).unwrap();
        assert_eq!(record.target.kind, TargetKind::Missing);
        assert!(record.timestamps.target.is_none());
        assert!(record.attributes.mode.is_none());
    }

    #[test]
    fn test_record_for_target_without_link() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, "x").unwrap();
        let link = dir.path().join("new-link");

        let record =
            record_for_target("f.txt", &link, &resolver(), ExecutionMode::Open).unwrap();
        assert!(record.target.relative);
        assert_eq!(record.target.kind, TargetKind::File);
        assert!(record.timestamps.link.is_empty());
        assert!(record.timestamps.target.is_some());
    }

    #[cfg(unix)]
    fn posix_resolver() -> PathResolver {
        PathResolver::new(Arc::new(HostContext::posix()))
    }

    /// Capture `link`, remove it, recreate it from the record and return the
    /// recreated link text.
    #[cfg(unix)]
    fn recreate_from_capture(link: &Path) -> (LinkRecord, std::path::PathBuf) {
        use crate::config::ResolvedConfig;
        use crate::engine::{RecreationEngine, Request, TerminalState};

        let record = capture_link(link, &posix_resolver(), ExecutionMode::Info).unwrap();
        fs::remove_file(link).unwrap();
        let outcome = RecreationEngine::new(posix_resolver()).recreate(
            "r",
            &record,
            &Request::default(),
            &ResolvedConfig::default(),
        );
        assert_eq!(outcome.state, TerminalState::Verified { confirmed: true }, "{}", outcome.detail);
        (record, fs::read_link(link).unwrap())
    }

    #[test]
    #[cfg(unix)]
    fn test_backslash_in_posix_name_is_kept() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(r"a\b.txt");
        fs::write(&file, "x").unwrap();
        let link = dir.path().join(r"l\1");
        std::os::unix::fs::symlink(&file, &link).unwrap();

        let (record, text) = recreate_from_capture(&link);
        assert_eq!(record.target.path.flavor, PathFlavor::Posix);
        assert_eq!(record.link.flavor, PathFlavor::Posix);
        assert_eq!(record.target.path.raw, file.to_str().unwrap());
        assert_eq!(text, file);
    }

    #[test]
    #[cfg(unix)]
    fn test_drive_like_relative_name_is_kept() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("c:notes"), "x").unwrap();
        let link = dir.path().join("l");
        std::os::unix::fs::symlink("c:notes", &link).unwrap();

        let (record, text) = recreate_from_capture(&link);
        assert_eq!(record.target.path.flavor, PathFlavor::Posix);
        assert!(record.target.relative);
        assert_eq!(record.target.kind, TargetKind::File);
        assert_eq!(text, Path::new("c:notes"));
    }

    #[test]
    #[cfg(unix)]
    fn test_doubled_leading_slash_is_posix_root() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("l");
        std::os::unix::fs::symlink("//tmp", &link).unwrap();

        let (record, text) = recreate_from_capture(&link);
        assert_eq!(record.target.path.flavor, PathFlavor::Posix);
        assert_eq!(record.target.path.raw, "//tmp");
        assert_eq!(record.target.kind, TargetKind::Directory);
        assert_eq!(
            fs::canonicalize(&text).unwrap(),
            fs::canonicalize("/tmp").unwrap()
        );
    }

    #[test]
    fn test_typed_target_keeps_windows_grammar() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("l");
        let record = record_for_target(
            r"\\nas\share\f.txt",
            &link,
            &PathResolver::new(Arc::new(HostContext::posix())),
            ExecutionMode::Info,
        )
        .unwrap();
        assert_eq!(record.target.path.flavor, PathFlavor::WindowsUnc);
        assert!(!record.target.relative);
    }
}
