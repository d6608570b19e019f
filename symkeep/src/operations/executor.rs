//! Plan execution engine.
//!
//! This module implements the executor that takes operation plans
//! and applies them to the filesystem.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::engine::fs::{create_link, occupant, remove_link, replace_link, Occupant};
use crate::error::{Error, Result};
use crate::path::local::resolve_link_target;
use crate::record::{format, TargetKind};

use super::plan::{OperationPlan, PlanAction};

/// Suffix of the link kept with the old target when relinking.
pub const BACKUP_SUFFIX: &str = "backup";

/// The backup link path for `link`.
#[must_use]
pub fn backup_path(link: &Path) -> PathBuf {
    let mut name = OsString::from(link.as_os_str());
    name.push(".");
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Result of executing a plan.
///
/// This struct provides information about what happened during execution,
/// including whether it was a dry run and what actions were taken.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionResult {
    /// Whether every action succeeded.
    pub success: bool,

    /// Whether this was a dry-run (no actual changes made).
    pub dry_run: bool,

    /// Descriptions of actions that were taken (or would be taken in dry-run).
    pub actions_taken: Vec<String>,

    /// Actions that failed, with the error.
    pub failures: Vec<(String, String)>,

    /// Warnings from the plan.
    pub warnings: Vec<String>,
}

/// Executes operation plans against the filesystem.
///
/// The executor can run in normal mode (applying changes) or dry-run mode
/// (describing without changes). A failing action is recorded and the
/// remaining actions still run.
///
/// # Examples
///
/// ```
/// use symkeep::operations::{OperationPlan, PlanExecutor};
///
/// let plan = OperationPlan::new("Nothing to do").add_warning("no links found");
/// let result = PlanExecutor::new().dry_run().execute(&plan);
/// assert!(result.success);
/// assert!(result.dry_run);
/// assert_eq!(result.warnings.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanExecutor {
    dry_run: bool,
}

impl PlanExecutor {
    /// Creates a new plan executor.
    #[must_use]
    pub const fn new() -> Self {
        Self { dry_run: false }
    }

    /// Sets the executor to dry-run mode.
    ///
    /// In dry-run mode, the executor describes the plan but does not
    /// touch the filesystem.
    #[must_use]
    pub const fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Executes the given plan.
    ///
    /// Action failures are collected in [`ExecutionResult::failures`].
    /// A link is not removed when writing its default record file failed
    /// earlier in the plan.
    #[must_use]
    pub fn execute(&self, plan: &OperationPlan) -> ExecutionResult {
        let mut result = ExecutionResult {
            success: true,
            dry_run: self.dry_run,
            warnings: plan.warnings.clone(),
            ..Default::default()
        };

        let mut unwritten: HashSet<&Path> = HashSet::new();
        for action in &plan.actions {
            let description = action.description();
            if self.dry_run {
                result.actions_taken.push(description);
                continue;
            }
            if let PlanAction::RemoveLink(link) = action {
                if unwritten.contains(format::default_record_path(link).as_path()) {
                    log::warn!("keeping {}: its record was not written", link.display());
                    result.success = false;
                    result
                        .failures
                        .push((description, "record was not written".to_string()));
                    continue;
                }
            }
            match Self::execute_action(action) {
                Ok(()) => {
                    log::debug!("{description}");
                    result.actions_taken.push(description);
                }
                Err(e) => {
                    if let PlanAction::WriteRecord { path, .. } = action {
                        unwritten.insert(path.as_path());
                    }
                    log::warn!("{description} failed: {e}");
                    result.success = false;
                    result.failures.push((description, e.to_string()));
                }
            }
        }

        result
    }

    /// Executes a single action.
    fn execute_action(action: &PlanAction) -> Result<()> {
        match action {
            PlanAction::WriteRecord {
                path,
                record,
                wrapped,
            } => format::write(path, record, *wrapped),
            PlanAction::RemoveLink(path) => match occupant(path)? {
                Occupant::Link(_) => remove_link(path),
                Occupant::Vacant => Ok(()),
                Occupant::Other => Err(Error::NotASymlink { path: path.clone() }),
            },
            PlanAction::Relink {
                link,
                old_target,
                new_target,
                backup,
            } => Self::relink(link, old_target, new_target, *backup),
        }
    }

    fn relink(link: &Path, old_target: &Path, new_target: &Path, backup: bool) -> Result<()> {
        let current = match occupant(link)? {
            Occupant::Link(current) => current,
            _ => return Err(Error::NotASymlink { path: link.to_path_buf() }),
        };
        if current != old_target {
            return Err(Error::Validation {
                field: "link".into(),
                message: format!(
                    "{} changed since planning (now points at {})",
                    link.display(),
                    current.display()
                ),
            });
        }

        let kind = kind_of(link, new_target);
        if backup {
            let backup = backup_path(link);
            if let Occupant::Link(_) = occupant(&backup)? {
                remove_link(&backup)?;
            }
            create_link(old_target, &backup, kind_of(link, old_target))?;
        }
        replace_link(new_target, link, kind)
    }
}

fn kind_of(link: &Path, target: &Path) -> TargetKind {
    match fs::metadata(resolve_link_target(link, target)) {
        Ok(meta) if meta.is_dir() => TargetKind::Directory,
        Ok(_) => TargetKind::File,
        Err(_) => TargetKind::Missing,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn relink_plan(link: &Path, old: &str, new: &str) -> OperationPlan {
        OperationPlan::new("Test").add_action(PlanAction::Relink {
            link: link.to_path_buf(),
            old_target: PathBuf::from(old),
            new_target: PathBuf::from(new),
            backup: true,
        })
    }

    #[test]
    fn test_relink_keeps_backup() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("l");
        symlink("/old/target", &link).unwrap();

        let result = PlanExecutor::new()
            .execute(&relink_plan(&link, "/old/target", "../new"));

        assert!(result.success, "{:?}", result.failures);
        assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("../new"));
        assert_eq!(
            fs::read_link(dir.path().join("l.backup")).unwrap(),
            PathBuf::from("/old/target")
        );
        assert!(crate::engine::fs::staging_path(&link).symlink_metadata().is_err());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("l");
        symlink("/old/target", &link).unwrap();

        let result = PlanExecutor::new()
            .dry_run()
            .execute(&relink_plan(&link, "/old/target", "/new"));

        assert!(result.dry_run);
        assert_eq!(result.actions_taken.len(), 1);
        assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("/old/target"));
        assert!(dir.path().join("l.backup").symlink_metadata().is_err());
    }

    #[test]
    fn test_changed_link_fails_and_continues() {
        let dir = TempDir::new().unwrap();
        let changed = dir.path().join("changed");
        let other = dir.path().join("other");
        symlink("/somewhere/else", &changed).unwrap();
        symlink("/x", &other).unwrap();

        let plan = relink_plan(&changed, "/old/target", "/new")
            .add_action(PlanAction::RemoveLink(other.clone()));
        let result = PlanExecutor::new().execute(&plan);

        assert!(!result.success);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.actions_taken.len(), 1);
        assert!(other.symlink_metadata().is_err());
        assert_eq!(fs::read_link(&changed).unwrap(), PathBuf::from("/somewhere/else"));
    }

    #[test]
    fn test_remove_link_refuses_regular_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "x").unwrap();

        let plan = OperationPlan::new("Test").add_action(PlanAction::RemoveLink(file.clone()));
        let result = PlanExecutor::new().execute(&plan);
        assert!(!result.success);
        assert!(file.exists());
    }

    #[test]
    fn test_link_kept_when_record_fails() {
        use crate::path::{HostContext, PathResolver};
        use crate::record::{capture_link, ExecutionMode};
        use std::sync::Arc;

        let dir = TempDir::new().unwrap();
        let link = dir.path().join("l");
        symlink("/tmp", &link).unwrap();
        let resolver = PathResolver::new(Arc::new(HostContext::posix()));
        let record = capture_link(&link, &resolver, ExecutionMode::Info).unwrap();

        // A directory in the way makes the write fail.
        let record_path = format::default_record_path(&link);
        fs::create_dir(&record_path).unwrap();

        let plan = OperationPlan::new("Test")
            .add_action(PlanAction::WriteRecord {
                path: record_path,
                record: Box::new(record),
                wrapped: false,
            })
            .add_action(PlanAction::RemoveLink(link.clone()));
        let result = PlanExecutor::new().execute(&plan);

        assert_eq!(result.failures.len(), 2);
        assert!(link.symlink_metadata().is_ok());
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(backup_path(Path::new("/a/l")), PathBuf::from("/a/l.backup"));
    }
}
