//! Rewriting link targets in bulk.
//!
//! Live links and record files are both supported. A target-base rewrite
//! is applied to absolute targets first; the relative/absolute conversion
//! then applies to the result.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path::local::{relative_link_text, resolve_link_target};
use crate::path::{rebase, PathFlavor, PathParts, PathResolver, PrefixRewrite, RebaseDirection};
use crate::record::{format, invoke::resolve_target, LinkRecord};

use super::import::find_records;
use super::plan::{OperationPlan, PlanAction};
use super::scan::{inspect, scan_links};

/// Options for [`plan_rebase_links`] and [`plan_rebase_records`].
#[derive(Debug, Clone)]
pub struct RebaseOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Convert targets to relative or absolute form.
    pub direction: Option<RebaseDirection>,
    /// Replace the prefix of absolute targets.
    pub target_base: Option<PrefixRewrite>,
    /// Leave links whose target exists alone.
    pub only_broken: bool,
}

impl Default for RebaseOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            direction: None,
            target_base: None,
            only_broken: false,
        }
    }
}

impl RebaseOptions {
    /// Whether these options can change anything.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.direction.is_some() || self.target_base.is_some()
    }
}

/// Plan rewriting the live links under `dir`.
///
/// Each changed link is relinked with a `<link>.backup` link kept at the
/// old target.
///
/// # Errors
///
/// Returns [`Error::Validation`] when no change was requested, or an error
/// if `dir` cannot be scanned.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use std::sync::Arc;
/// use symkeep::operations::rebase::{plan_rebase_links, RebaseOptions};
/// use symkeep::operations::PlanExecutor;
/// use symkeep::path::{HostContext, PathResolver, RebaseDirection};
///
/// let resolver = PathResolver::new(Arc::new(HostContext::detect()));
/// let options = RebaseOptions {
///     direction: Some(RebaseDirection::ToRelative),
///     ..Default::default()
/// };
/// let plan = plan_rebase_links(Path::new("/srv/links"), &resolver, &options)?;
/// let result = PlanExecutor::new().dry_run().execute(&plan);
/// for action in result.actions_taken {
///     println!("{action}");
/// }
/// # Ok::<(), symkeep::Error>(())
/// ```
pub fn plan_rebase_links(dir: &Path, resolver: &PathResolver, options: &RebaseOptions) -> Result<OperationPlan> {
    require_change(options)?;
    let mut plan = OperationPlan::new(format!("Rebase links under {}", dir.display()));

    for link in scan_links(dir, options.recursive)? {
        let info = match inspect(&link) {
            Ok(info) => info,
            Err(e) => {
                plan = plan.add_warning(format!("{}: {e}", link.display()));
                continue;
            }
        };
        if options.only_broken && !info.broken {
            continue;
        }
        match rebased_link_target(&link, &info.target, resolver, options) {
            Ok(Some(new_target)) => {
                plan = plan.add_action(PlanAction::Relink {
                    link,
                    old_target: info.target,
                    new_target,
                    backup: true,
                });
            }
            Ok(None) => log::debug!("{} unchanged", link.display()),
            Err(e) => plan = plan.add_warning(format!("{}: {e}", link.display())),
        }
    }
    Ok(plan)
}

/// The new text for a link at `link` currently pointing at `target`, or
/// `None` when nothing changes.
///
/// # Errors
///
/// Returns an error when the target is not valid UTF-8 or has no relative
/// form from the link.
pub fn rebased_link_target(
    link: &Path,
    target: &Path,
    resolver: &PathResolver,
    options: &RebaseOptions,
) -> Result<Option<PathBuf>> {
    let text = target.to_str().ok_or_else(|| Error::InvalidPath {
        path: target.to_path_buf(),
        reason: "path contains invalid UTF-8".to_string(),
    })?;

    let mut new = target.to_path_buf();
    if let Some(rewrite) = options.target_base.as_ref().filter(|_| target.is_absolute()) {
        if let Some(rewritten) = rewrite.apply_str(text, resolver.classify_native(text)) {
            new = PathBuf::from(rewritten);
        }
    }

    match options.direction {
        Some(RebaseDirection::ToRelative) if new.is_absolute() => {
            new = relative_link_text(link, &new).ok_or_else(|| Error::InvalidPath {
                path: new.clone(),
                reason: "no relative form from the link's directory".to_string(),
            })?;
        }
        Some(RebaseDirection::ToAbsolute) if !new.is_absolute() => {
            new = resolve_link_target(link, &new);
        }
        _ => {}
    }

    Ok((new != target).then_some(new))
}

/// Plan rewriting the targets of the record files under `dir`.
///
/// Records keep their format and wrapped form; the rewrite is noted in
/// their history. With `only_broken`, records whose target exists on this
/// host are left alone.
///
/// # Errors
///
/// Returns [`Error::Validation`] when no change was requested, or an error
/// if `dir` cannot be searched.
pub fn plan_rebase_records(dir: &Path, resolver: &PathResolver, options: &RebaseOptions) -> Result<OperationPlan> {
    require_change(options)?;
    let mut plan = OperationPlan::new(format!("Rebase records under {}", dir.display()));

    for found in find_records(&[dir.to_path_buf()], options.recursive, None)? {
        let path = found.path;
        let step = format::read(&path, resolver.host()).and_then(|mut record| {
            if options.only_broken && resolve_target(&record, resolver).is_ok_and(|t| t.exists()) {
                return Ok(None);
            }
            let Some(new_target) = rebased_record_target(&record, options)? else {
                return Ok(None);
            };
            record.rebase_target(&new_target, resolver)?;
            Ok(Some((record, format::is_wrapped(&path)?)))
        });
        match step {
            Ok(Some((record, wrapped))) => {
                plan = plan.add_action(PlanAction::WriteRecord {
                    path,
                    record: Box::new(record),
                    wrapped,
                });
            }
            Ok(None) => {}
            Err(e) => plan = plan.add_warning(format!("{}: {e}", path.display())),
        }
    }
    Ok(plan)
}

/// The new target text for `record`, or `None` when nothing changes.
///
/// # Errors
///
/// Returns an error when the record's paths cannot be parsed or the link
/// and target do not share a root.
pub fn rebased_record_target(record: &LinkRecord, options: &RebaseOptions) -> Result<Option<String>> {
    let current = &record.target.path;
    let mut flavor = current.flavor;
    let mut text = current.normalized.clone();

    if let Some(rewrite) = &options.target_base {
        if PathParts::parse(&text, flavor)?.is_absolute() {
            if let Some(rewritten) = rewrite.apply_str(&text, flavor) {
                flavor = written_flavor(&rewritten, flavor);
                text = rewritten;
            }
        }
    }

    if let Some(direction) = options.direction {
        let mut link_dir = PathParts::parse(&record.link.normalized, record.link.flavor)?;
        link_dir.segments.pop();
        text = rebase(&text, flavor, Some(&link_dir.render_for(flavor)), direction)?;
    }

    Ok((text != current.normalized).then_some(text))
}

fn written_flavor(text: &str, fallback: PathFlavor) -> PathFlavor {
    if text.starts_with('/') {
        PathFlavor::Posix
    } else if text.starts_with(r"\\") {
        PathFlavor::WindowsUnc
    } else if crate::path::parts::drive_letter(text).is_some() {
        PathFlavor::WindowsLocal
    } else {
        fallback
    }
}

fn require_change(options: &RebaseOptions) -> Result<()> {
    if options.has_changes() {
        Ok(())
    } else {
        Err(Error::Validation {
            field: "rebase".into(),
            message: "nothing to do: give a direction or a target base".into(),
        })
    }
}
