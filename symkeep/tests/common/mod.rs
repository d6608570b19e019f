//! Common test utilities for integration tests.
//!
//! This module provides helper functions and fixture builders for testing
//! the symkeep library.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use symkeep::batch::BatchCoordinator;
use symkeep::config::ResolvedConfig;
use symkeep::engine::RecreationEngine;
use symkeep::path::{HostContext, PathResolver};
use symkeep::record::{format, record_for_target, ExecutionMode, LinkRecord};
use tempfile::TempDir;

/// A resolver for a plain POSIX host with no shares.
#[allow(dead_code)]
pub fn posix_resolver() -> PathResolver {
    PathResolver::new(Arc::new(HostContext::posix()))
}

/// A coordinator over [`posix_resolver`] with `config`.
#[allow(dead_code)]
pub fn coordinator(config: ResolvedConfig) -> BatchCoordinator {
    BatchCoordinator::new(RecreationEngine::new(posix_resolver()), config)
}

/// Builder for a temporary tree of target files, links and records.
///
/// # Examples
///
/// ```no_run
/// # use common::LinkTree;
/// let tree = LinkTree::new().with_file("data/a.txt").with_link("links/a", "../data/a.txt");
/// ```
#[allow(dead_code)]
pub struct LinkTree {
    dir: TempDir,
}

#[allow(dead_code)]
impl LinkTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// The tree's root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// `root/rel`.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Adds a regular file, creating parent directories.
    pub fn with_file(self, rel: &str) -> Self {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, rel).unwrap();
        self
    }

    /// Adds a directory.
    pub fn with_dir(self, rel: &str) -> Self {
        fs::create_dir_all(self.path(rel)).unwrap();
        self
    }

    /// Adds a symbolic link at `rel` with link text `target`.
    #[cfg(unix)]
    pub fn with_link(self, rel: &str, target: &str) -> Self {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink(target, &path).unwrap();
        self
    }

    /// Writes a record for a link at `link_rel` pointing at `target`,
    /// stored under `records/`. Returns the record file path.
    pub fn write_record(&self, link_rel: &str, target: &str) -> PathBuf {
        let record = self.record(link_rel, target);
        let path = format::default_record_path(&self.path("records").join(link_rel));
        format::write(&path, &record, false).unwrap();
        path
    }

    /// A record for a link at `link_rel` pointing at `target`.
    pub fn record(&self, link_rel: &str, target: &str) -> LinkRecord {
        record_for_target(target, &self.path(link_rel), &posix_resolver(), ExecutionMode::Info).unwrap()
    }

    /// The link text at `rel`.
    pub fn read_link(&self, rel: &str) -> PathBuf {
        fs::read_link(self.path(rel)).unwrap()
    }

    /// Whether a link (broken or not) exists at `rel`.
    pub fn has_link(&self, rel: &str) -> bool {
        fs::symlink_metadata(self.path(rel)).is_ok_and(|m| m.file_type().is_symlink())
    }
}
