//! Converting a directory of links into record files.
//!
//! `convert` writes each record next to its link; `mirror` writes them
//! under a separate tree at the same relative location.

use std::path::Path;

use crate::error::{Error, Result};
use crate::path::PathResolver;
use crate::record::{capture_link, format, ExecutionMode};

use super::plan::{OperationPlan, PlanAction};
use super::scan::scan_links;

/// Options shared by `convert` and `mirror`.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Keep each link after its record is written. Ignored by `mirror`.
    pub keep_originals: bool,
    /// Execution mode stored in the records.
    pub mode: ExecutionMode,
    /// Write the wrapped form.
    pub wrapped: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            keep_originals: true,
            mode: ExecutionMode::default(),
            wrapped: false,
        }
    }
}

/// Plan writing a sibling record for every link under `dir`.
///
/// Links that cannot be captured become plan warnings.
///
/// # Errors
///
/// Returns an error if `dir` cannot be scanned.
pub fn plan_convert(dir: &Path, resolver: &PathResolver, options: &ConvertOptions) -> Result<OperationPlan> {
    let mut plan = OperationPlan::new(format!("Convert links under {}", dir.display()));
    for link in scan_links(dir, options.recursive)? {
        let record = match capture_link(&link, resolver, options.mode) {
            Ok(record) => record,
            Err(e) => {
                plan = plan.add_warning(format!("{}: {e}", link.display()));
                continue;
            }
        };
        plan = plan.add_action(PlanAction::WriteRecord {
            path: format::default_record_path(&link),
            record: Box::new(record),
            wrapped: options.wrapped,
        });
        if !options.keep_originals {
            plan = plan.add_action(PlanAction::RemoveLink(link));
        }
    }
    if plan.is_empty() {
        plan = plan.add_warning(format!("no links found under {}", dir.display()));
    }
    Ok(plan)
}

/// Plan writing a record for every link under `src` into `dest`, at the
/// link's path relative to `src`.
///
/// # Errors
///
/// Returns an error if `src` cannot be scanned, or [`Error::InvalidPath`]
/// if `dest` lies inside `src`.
pub fn plan_mirror(
    src: &Path,
    dest: &Path,
    resolver: &PathResolver,
    options: &ConvertOptions,
) -> Result<OperationPlan> {
    if options.recursive && dest.starts_with(src) && dest != src {
        return Err(Error::InvalidPath {
            path: dest.to_path_buf(),
            reason: format!("mirror destination is inside {}", src.display()),
        });
    }

    let mut plan = OperationPlan::new(format!(
        "Mirror links under {} into {}",
        src.display(),
        dest.display()
    ));
    for link in scan_links(src, options.recursive)? {
        let Ok(relative) = link.strip_prefix(src) else {
            continue;
        };
        match capture_link(&link, resolver, options.mode) {
            Ok(record) => {
                plan = plan.add_action(PlanAction::WriteRecord {
                    path: format::default_record_path(&dest.join(relative)),
                    record: Box::new(record),
                    wrapped: options.wrapped,
                });
            }
            Err(e) => plan = plan.add_warning(format!("{}: {e}", link.display())),
        }
    }
    if plan.is_empty() {
        plan = plan.add_warning(format!("no links found under {}", src.display()));
    }
    Ok(plan)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::operations::PlanExecutor;
    use crate::path::HostContext;
    use std::fs;
    use std::os::unix::fs::symlink;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn resolver() -> PathResolver {
        PathResolver::new(Arc::new(HostContext::posix()))
    }

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        symlink("/tmp", dir.path().join("top")).unwrap();
        symlink("../top", dir.path().join("sub/inner")).unwrap();
        dir
    }

    #[test]
    fn test_convert_keeps_links_by_default() {
        let dir = tree();
        let plan = plan_convert(dir.path(), &resolver(), &ConvertOptions::default()).unwrap();
        assert_eq!(plan.len(), 2);

        let result = PlanExecutor::new().execute(&plan);
        assert!(result.success);
        assert!(dir.path().join("top.symkeep").is_file());
        assert!(dir.path().join("sub/inner.symkeep").is_file());
        assert!(dir.path().join("top").symlink_metadata().is_ok());
    }

    #[test]
    fn test_convert_remove_originals() {
        let dir = tree();
        let options = ConvertOptions {
            keep_originals: false,
            recursive: false,
            ..Default::default()
        };
        let plan = plan_convert(dir.path(), &resolver(), &options).unwrap();
        assert_eq!(plan.len(), 2);

        PlanExecutor::new().execute(&plan);
        assert!(dir.path().join("top.symkeep").is_file());
        assert!(dir.path().join("top").symlink_metadata().is_err());
        assert!(dir.path().join("sub/inner").symlink_metadata().is_ok());
    }

    #[test]
    fn test_convert_empty_dir_warns() {
        let dir = TempDir::new().unwrap();
        let plan = plan_convert(dir.path(), &resolver(), &ConvertOptions::default()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.warnings.len(), 1);
    }

    #[test]
    fn test_mirror_same_relative_layout() {
        let src = tree();
        let dest = TempDir::new().unwrap();
        let plan = plan_mirror(src.path(), dest.path(), &resolver(), &ConvertOptions::default()).unwrap();
        let result = PlanExecutor::new().execute(&plan);

        assert!(result.success);
        assert!(dest.path().join("top.symkeep").is_file());
        assert!(dest.path().join("sub/inner.symkeep").is_file());
        assert!(src.path().join("top.symkeep").symlink_metadata().is_err());
    }

    #[test]
    fn test_mirror_rejects_nested_destination() {
        let src = tree();
        let nested = src.path().join("sub/out");
        assert!(matches!(
            plan_mirror(src.path(), &nested, &resolver(), &ConvertOptions::default()),
            Err(Error::InvalidPath { .. })
        ));
    }
}
