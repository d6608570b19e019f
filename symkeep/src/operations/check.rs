//! Health checks over live links, with optional repair of broken
//! relative links.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::resolved::DEFAULT_FIX_SEARCH_DEPTH;
use crate::engine::fs::search_same_name;
use crate::error::Result;
use crate::path::local::relative_link_text;

use super::executor::PlanExecutor;
use super::plan::{OperationPlan, PlanAction};
use super::scan::{inspect, scan_links};

/// Options for [`check_links`].
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Search for the targets of broken relative links and relink them.
    pub fix_relative: bool,
    /// Ancestor levels (and levels below each) searched when fixing.
    pub search_depth: usize,
    /// Report the fixes without applying them.
    pub dry_run: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            fix_relative: false,
            search_depth: DEFAULT_FIX_SEARCH_DEPTH,
            dry_run: false,
        }
    }
}

/// Health of one link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum LinkStatus {
    /// The target exists.
    Ok,
    /// The target is missing.
    Broken {
        /// Why, when the link could not even be read.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// The link was (or in a dry run would be) pointed at a found target.
    Fixed {
        /// The new link text.
        new_target: PathBuf,
    },
}

/// One checked link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckEntry {
    /// The link.
    pub link: PathBuf,
    /// Its target text.
    pub target: Option<PathBuf>,
    /// Where the text points.
    pub resolved: Option<PathBuf>,
    /// Health.
    #[serde(flatten)]
    pub status: LinkStatus,
}

/// The result of [`check_links`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    /// Every link, sorted by path.
    pub entries: Vec<CheckEntry>,
    /// Whether fixes were only planned.
    pub dry_run: bool,
}

impl CheckReport {
    fn count(&self, pred: impl Fn(&LinkStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.status)).count()
    }

    /// Links whose target exists.
    #[must_use]
    pub fn ok(&self) -> usize {
        self.count(|s| matches!(s, LinkStatus::Ok))
    }

    /// Links left broken.
    #[must_use]
    pub fn broken(&self) -> usize {
        self.count(|s| matches!(s, LinkStatus::Broken { .. }))
    }

    /// Links repaired.
    #[must_use]
    pub fn fixed(&self) -> usize {
        self.count(|s| matches!(s, LinkStatus::Fixed { .. }))
    }
}

/// Check every link under `dir`.
///
/// With `fix_relative`, a broken relative link is repaired by searching
/// the link's directory and its ancestors for an entry with the target's
/// file name; the first match becomes the new relative target.
///
/// # Errors
///
/// Returns an error if `dir` cannot be scanned.
pub fn check_links(dir: &Path, options: &CheckOptions) -> Result<CheckReport> {
    let mut entries = Vec::new();
    let mut plan = OperationPlan::new(format!("Fix broken relative links under {}", dir.display()));

    for link in scan_links(dir, options.recursive)? {
        let info = match inspect(&link) {
            Ok(info) => info,
            Err(e) => {
                entries.push(CheckEntry {
                    link,
                    target: None,
                    resolved: None,
                    status: LinkStatus::Broken {
                        error: Some(e.to_string()),
                    },
                });
                continue;
            }
        };

        let mut status = if info.broken {
            LinkStatus::Broken { error: None }
        } else {
            LinkStatus::Ok
        };
        if info.broken && info.relative && options.fix_relative {
            if let Some(new_target) = find_replacement(&link, &info.target, options.search_depth) {
                plan = plan.add_action(PlanAction::Relink {
                    link: link.clone(),
                    old_target: info.target.clone(),
                    new_target: new_target.clone(),
                    backup: false,
                });
                status = LinkStatus::Fixed { new_target };
            }
        }
        entries.push(CheckEntry {
            link,
            target: Some(info.target),
            resolved: Some(info.resolved),
            status,
        });
    }

    if !plan.is_empty() {
        let executor = if options.dry_run {
            PlanExecutor::new().dry_run()
        } else {
            PlanExecutor::new()
        };
        let result = executor.execute(&plan);
        for (action, error) in &result.failures {
            log::warn!("{action}: {error}");
        }
        if !result.success {
            demote_failed_fixes(&mut entries, &plan, &result.failures);
        }
    }

    let report = CheckReport {
        entries,
        dry_run: options.dry_run,
    };
    log::info!(
        "{} ok, {} broken, {} fixed",
        report.ok(),
        report.broken(),
        report.fixed()
    );
    Ok(report)
}

fn find_replacement(link: &Path, target: &Path, depth: usize) -> Option<PathBuf> {
    let name = target.file_name()?;
    let start = link.parent()?;
    let found = search_same_name(start, name, depth)?;
    relative_link_text(link, &found)
}

fn demote_failed_fixes(entries: &mut [CheckEntry], plan: &OperationPlan, failures: &[(String, String)]) {
    for action in &plan.actions {
        let PlanAction::Relink { link, .. } = action else {
            continue;
        };
        let description = action.description();
        let Some((_, error)) = failures.iter().find(|(d, _)| *d == description) else {
            continue;
        };
        if let Some(entry) = entries.iter_mut().find(|e| &e.link == link) {
            entry.status = LinkStatus::Broken {
                error: Some(error.clone()),
            };
        }
    }
}
