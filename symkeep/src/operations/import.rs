//! Recreating links from record files.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobMatcher};
use serde::Serialize;
use walkdir::WalkDir;

use crate::batch::{BatchCoordinator, BatchReport, RecordInput};
use crate::engine::{Placement, TerminalState};
use crate::error::{Error, Result};
use crate::path::HostContext;
use crate::record::{format, HistoryReason};
use crate::timestamp;

/// A record file found by [`find_records`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundRecord {
    /// The record file.
    pub path: PathBuf,
    /// The directory it was found under. Structure below it is preserved
    /// when importing into a target location.
    pub base: PathBuf,
}

impl FoundRecord {
    /// The record's directory relative to [`FoundRecord::base`].
    #[must_use]
    pub fn subdir(&self) -> PathBuf {
        self.path
            .parent()
            .and_then(|p| p.strip_prefix(&self.base).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

/// Options for [`import_records`].
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Put links here instead of at their recorded paths.
    pub target_location: Option<PathBuf>,
    /// Put every link directly in the target location.
    pub flatten: bool,
    /// Delete record files whose link was verified.
    pub remove_records: bool,
    /// Note the recreation in each verified record's history and refresh
    /// its target timestamps.
    pub update_records: bool,
}

/// What an import did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    /// The batch report, one entry per record file.
    pub report: BatchReport,
    /// Record files deleted.
    pub removed: Vec<PathBuf>,
    /// Record files rewritten.
    pub updated: Vec<PathBuf>,
    /// Problems maintaining record files.
    pub warnings: Vec<String>,
}

/// Compile a file-name pattern such as `*.symkeep` or `docs-*`.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a malformed pattern.
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob: Glob| glob.compile_matcher())
        .map_err(|e| Error::Validation {
            field: "pattern".into(),
            message: e.to_string(),
        })
}

/// Collect record files from `sources`.
///
/// A file source is taken as is. A directory source contributes every file
/// with the record extension below it (only its direct children unless
/// `recursive`), in file-name order. `pattern` filters by file name.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for a missing source, or an error for a
/// malformed pattern.
///
/// # Examples
///
/// ```no_run
/// use symkeep::operations::import::find_records;
/// use std::path::PathBuf;
///
/// let found = find_records(&[PathBuf::from("records")], true, Some("docs-*"))?;
/// for record in found {
///     println!("{}", record.path.display());
/// }
/// # Ok::<(), symkeep::Error>(())
/// ```
pub fn find_records(sources: &[PathBuf], recursive: bool, pattern: Option<&str>) -> Result<Vec<FoundRecord>> {
    let matcher = pattern.map(compile_pattern).transpose()?;
    let matches = |path: &Path| {
        matcher
            .as_ref()
            .map_or(true, |m| path.file_name().is_some_and(|name| m.is_match(name)))
    };

    let mut found = Vec::new();
    for source in sources {
        let meta = fs::metadata(source).map_err(|_| Error::NotFound {
            resource: source.display().to_string(),
        })?;
        if meta.is_file() {
            if matches(source) {
                found.push(FoundRecord {
                    path: source.clone(),
                    base: source.parent().map(Path::to_path_buf).unwrap_or_default(),
                });
            }
            continue;
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        for entry in WalkDir::new(source)
            .follow_links(false)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("skipping unreadable entry under {}: {e}", source.display());
                    continue;
                }
            };
            if entry.file_type().is_file() && format::is_record_file(entry.path()) && matches(entry.path()) {
                found.push(FoundRecord {
                    path: entry.into_path(),
                    base: source.clone(),
                });
            }
        }
    }
    log::debug!("found {} record files", found.len());
    Ok(found)
}

/// Load `found` and recreate their links through `coordinator`.
///
/// Records that fail to load are reported as failed entries. Record files
/// are only maintained after a real run; a dry run reports the plan and
/// leaves them alone.
///
/// # Errors
///
/// Returns the coordinator's preflight errors.
pub fn import_records(
    found: &[FoundRecord],
    host: &HostContext,
    coordinator: &BatchCoordinator,
    dry_run: bool,
    options: &ImportOptions,
) -> Result<ImportResult> {
    let inputs: Vec<RecordInput> = found
        .iter()
        .map(|f| {
            let placement = match &options.target_location {
                None => Placement::Original,
                Some(location) if options.flatten => Placement::Into(location.clone()),
                Some(location) => Placement::Under {
                    location: location.clone(),
                    subdir: f.subdir(),
                },
            };
            RecordInput::new(f.path.display().to_string(), format::read(&f.path, host))
                .with_placement(placement)
        })
        .collect();

    let coordinator = if dry_run {
        coordinator.clone().dry_run()
    } else {
        coordinator.clone()
    };
    let report = coordinator.run(inputs)?;
    let mut result = ImportResult {
        report,
        ..Default::default()
    };
    if dry_run {
        return Ok(result);
    }

    for (f, outcome) in found.iter().zip(&result.report.entries) {
        if !matches!(outcome.state, TerminalState::Verified { .. }) {
            continue;
        }
        if options.remove_records {
            match fs::remove_file(&f.path) {
                Ok(()) => result.removed.push(f.path.clone()),
                Err(e) => result
                    .warnings
                    .push(format!("could not remove {}: {e}", f.path.display())),
            }
        } else if options.update_records {
            match refresh_record(&f.path, outcome.destination.as_deref(), host) {
                Ok(()) => result.updated.push(f.path.clone()),
                Err(e) => result
                    .warnings
                    .push(format!("could not update {}: {e}", f.path.display())),
            }
        }
    }
    for warning in &result.warnings {
        log::warn!("{warning}");
    }
    Ok(result)
}

fn refresh_record(path: &Path, destination: Option<&Path>, host: &HostContext) -> Result<()> {
    let mut record = format::read(path, host)?;
    if let Some(times) = destination.and_then(|d| timestamp::capture::read(d, true).ok()) {
        record.timestamps.target = Some(times);
    }
    record.touch(HistoryReason::Recreated);
    format::write(path, &record, format::is_wrapped(path)?)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::ResolvedConfig;
    use crate::engine::RecreationEngine;
    use crate::path::PathResolver;
    use crate::record::{record_for_target, ExecutionMode};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn resolver() -> PathResolver {
        PathResolver::new(Arc::new(HostContext::posix()))
    }

    fn coordinator() -> BatchCoordinator {
        BatchCoordinator::new(RecreationEngine::new(resolver()), ResolvedConfig::default())
    }

    /// Records for `records/a/one` and `records/b/two`, both pointing at a
    /// real file.
    fn fixture() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("data.txt");
        fs::write(&target, "x").unwrap();
        let records = dir.path().join("records");
        for (sub, name) in [("a", "one"), ("b", "two")] {
            let link = dir.path().join("links").join(sub).join(name);
            let record =
                record_for_target(target.to_str().unwrap(), &link, &resolver(), ExecutionMode::Info)
                    .unwrap();
            let path = format::default_record_path(&records.join(sub).join(name));
            format::write(&path, &record, sub == "b").unwrap();
        }
        (dir, records)
    }

    #[test]
    fn test_find_records_recursive_and_pattern() {
        let (_dir, records) = fixture();
        fs::write(records.join("notes.txt"), "not a record").unwrap();

        let all = find_records(&[records.clone()], true, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].subdir(), PathBuf::from("a"));

        let flat = find_records(&[records.clone()], false, None).unwrap();
        assert!(flat.is_empty());

        let filtered = find_records(&[records], true, Some("two*")).unwrap();
        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].path.ends_with("b/two.symkeep"));
    }

    #[test]
    fn test_find_records_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            find_records(&[dir.path().join("none")], true, None),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            find_records(&[dir.path().to_path_buf()], true, Some("[")),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_import_original_locations() {
        let (dir, records) = fixture();
        let found = find_records(&[records], true, None).unwrap();
        let result = import_records(&found, resolver().host(), &coordinator(), false, &ImportOptions::default())
            .unwrap();

        assert_eq!(result.report.counts.verified, 2);
        assert!(dir.path().join("links/a/one").symlink_metadata().is_ok());
        assert!(dir.path().join("links/b/two").symlink_metadata().is_ok());
    }

    #[test]
    fn test_import_preserves_structure_under_location() {
        let (dir, records) = fixture();
        let out = dir.path().join("out");
        let found = find_records(&[records], true, None).unwrap();
        let options = ImportOptions {
            target_location: Some(out.clone()),
            ..Default::default()
        };
        import_records(&found, resolver().host(), &coordinator(), false, &options).unwrap();
        assert!(out.join("a/one").symlink_metadata().is_ok());
        assert!(out.join("b/two").symlink_metadata().is_ok());
    }

    #[test]
    fn test_import_flatten() {
        let (dir, records) = fixture();
        let out = dir.path().join("flat");
        let found = find_records(&[records], true, None).unwrap();
        let options = ImportOptions {
            target_location: Some(out.clone()),
            flatten: true,
            ..Default::default()
        };
        import_records(&found, resolver().host(), &coordinator(), false, &options).unwrap();
        assert!(out.join("one").symlink_metadata().is_ok());
        assert!(out.join("two").symlink_metadata().is_ok());
    }

    #[test]
    fn test_import_remove_records() {
        let (_dir, records) = fixture();
        let found = find_records(&[records], true, None).unwrap();
        let options = ImportOptions {
            remove_records: true,
            ..Default::default()
        };
        let result = import_records(&found, resolver().host(), &coordinator(), false, &options).unwrap();
        assert_eq!(result.removed.len(), 2);
        assert!(found.iter().all(|f| !f.path.exists()));
    }

    #[test]
    fn test_import_update_records_keeps_form() {
        let (_dir, records) = fixture();
        let found = find_records(&[records], true, None).unwrap();
        let options = ImportOptions {
            update_records: true,
            ..Default::default()
        };
        let result = import_records(&found, resolver().host(), &coordinator(), false, &options).unwrap();
        assert_eq!(result.updated.len(), 2);

        let record = format::read(&found[1].path, resolver().host()).unwrap();
        assert_eq!(
            record.history.last().map(|h| h.reason),
            Some(HistoryReason::Recreated)
        );
        assert!(fs::read_to_string(&found[1].path).unwrap().starts_with("#!"));
        assert!(fs::read_to_string(&found[0].path).unwrap().starts_with('{'));
    }

    #[test]
    fn test_import_dry_run_touches_nothing() {
        let (dir, records) = fixture();
        let found = find_records(&[records], true, None).unwrap();
        let options = ImportOptions {
            remove_records: true,
            ..Default::default()
        };
        let result = import_records(&found, resolver().host(), &coordinator(), true, &options).unwrap();
        assert_eq!(result.report.counts.skipped, 2);
        assert!(result.removed.is_empty());
        assert!(found.iter().all(|f| f.path.exists()));
        assert!(dir.path().join("links").symlink_metadata().is_err());
    }
}
