//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with temporary directories
//! - Command builder helpers for common patterns
//! - Fixture helpers for files, links and records

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Configuration variables cleared for every command so the host
/// environment cannot leak into tests.
const CONFIG_ENV_VARS: [&str; 10] = [
    "SYMKEEP_TIMESTAMP_STRATEGY",
    "SYMKEEP_USE_LIVE_TARGET",
    "SYMKEEP_FIX_RELATIVE",
    "SYMKEEP_VERIFY",
    "SYMKEEP_FORCE",
    "SYMKEEP_TARGET_BASE",
    "SYMKEEP_CONCURRENCY",
    "SYMKEEP_DEFAULT_MODE",
    "SYMKEEP_DATA_DIR",
    "SYMKEEP_LOG_MODE",
];

/// Test environment with isolated data directory.
///
/// This struct provides an isolated test environment with:
/// - A temporary directory used as the working directory
/// - A separate data directory for the global configuration
/// - Helper methods for common CLI operations
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
    /// Path to the symkeep data directory
    pub data_dir: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    ///
    /// The data directory path is not created; commands that write the
    /// global configuration create it.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let data_dir = temp_path.join("symkeep-data");

        Self {
            temp_dir,
            temp_path,
            data_dir,
        }
    }

    /// Get a bare command builder without pre-configured flags.
    ///
    /// The working directory is the test directory and configuration
    /// variables are cleared.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("symkeep").expect("Failed to find symkeep binary");
        cmd.current_dir(&self.temp_path);
        for var in CONFIG_ENV_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Get a command builder with the data directory pre-configured.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--data-dir").arg(&self.data_dir);
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// `temp_path/rel`.
    pub fn join(&self, rel: &str) -> PathBuf {
        self.temp_path.join(rel)
    }

    /// Create a subdirectory in the test environment.
    pub fn create_dir(&self, name: &str) -> PathBuf {
        let path = self.join(name);
        std::fs::create_dir_all(&path).expect("Failed to create test directory");
        path
    }

    /// Create a file (and its parents) containing its own relative path.
    pub fn create_file(&self, rel: &str) -> PathBuf {
        let path = self.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, rel).expect("Failed to create test file");
        path
    }

    /// Create a symbolic link at `rel` with link text `target`.
    #[cfg(unix)]
    pub fn create_link(&self, rel: &str, target: &str) -> PathBuf {
        let path = self.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink(target, &path).expect("Failed to create link");
        path
    }

    /// The link text at `rel`.
    pub fn read_link(&self, rel: &str) -> PathBuf {
        std::fs::read_link(self.join(rel)).expect("Not a link")
    }

    /// Whether a link (broken or not) exists at `rel`.
    pub fn has_link(&self, rel: &str) -> bool {
        std::fs::symlink_metadata(self.join(rel)).is_ok_and(|m| m.file_type().is_symlink())
    }

    /// Run `symkeep create TARGET LINK --output OUTPUT` and return the record path.
    ///
    /// # Panics
    /// Panics if the command fails.
    pub fn create_record(&self, target: &str, link_rel: &str, output_rel: &str) -> PathBuf {
        let output = self.join(output_rel);
        self.command()
            .arg("create")
            .arg(target)
            .arg(self.join(link_rel))
            .arg("--output")
            .arg(&output)
            .assert()
            .success();
        output
    }

    /// Run a command and parse its stdout as JSON.
    ///
    /// # Panics
    /// Panics if stdout is not valid JSON.
    pub fn json(cmd: &mut Command) -> serde_json::Value {
        let output = cmd.output().expect("Failed to run command");
        serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
            panic!(
                "stdout is not JSON ({e}): {}\nstderr: {}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            )
        })
    }
}
