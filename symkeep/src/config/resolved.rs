//! The fully resolved configuration consumed by the recreation core.

use std::time::Duration;

use serde::Serialize;

use crate::config::schema::Config;
use crate::error::{Error, Result};
use crate::path::{PathPreference, PrefixRewrite};
use crate::record::{EmbeddedConfig, ExecutionMode};
use crate::timestamp::TimestampStrategy;

/// Default bound for the same-name search.
pub const DEFAULT_FIX_SEARCH_DEPTH: usize = 5;

/// Default number of parallel workers.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Every setting with its default filled in.
///
/// Built from a merged [`Config`] and, per record, layered with the
/// record's [`EmbeddedConfig`].
///
/// # Examples
///
/// ```
/// use symkeep::config::{Config, ResolvedConfig};
/// use symkeep::record::EmbeddedConfig;
/// use symkeep::timestamp::TimestampStrategy;
///
/// let batch = ResolvedConfig::from_config(&Config::default());
/// assert_eq!(batch.timestamp_strategy, TimestampStrategy::Current);
/// assert!(batch.verify);
///
/// let file = EmbeddedConfig {
///     timestamp_strategy: Some(TimestampStrategy::PreserveAll),
///     ..Default::default()
/// };
/// let effective = batch.layered(&file);
/// assert_eq!(effective.timestamp_strategy, TimestampStrategy::PreserveAll);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    /// Timestamp strategy.
    pub timestamp_strategy: TimestampStrategy,
    /// Re-read live target timestamps.
    pub use_live_target: bool,
    /// Run the same-name search for unresolvable targets.
    pub fix_relative: bool,
    /// Depth bound of that search.
    pub fix_search_depth: usize,
    /// Verify created links.
    pub verify: bool,
    /// Overwrite links pointing elsewhere.
    pub force: bool,
    /// Create unresolvable links from their raw text.
    pub allow_broken: bool,
    /// Fallback prefix rewrite.
    pub target_base_rewrite: Option<PrefixRewrite>,
    /// Parallel workers.
    pub concurrency_limit: usize,
    /// Per-record deadline in milliseconds.
    pub record_timeout_ms: Option<u64>,
    /// Mode for new records.
    pub default_mode: ExecutionMode,
    /// Write wrapped records.
    pub make_executable: bool,
    /// Keep links after `convert`.
    pub keep_originals: bool,
    /// Recursive scans.
    pub recursive: bool,
    /// Candidate preference for network paths.
    pub path_preference: PathPreference,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            timestamp_strategy: TimestampStrategy::default(),
            use_live_target: false,
            fix_relative: false,
            fix_search_depth: DEFAULT_FIX_SEARCH_DEPTH,
            verify: true,
            force: false,
            allow_broken: false,
            target_base_rewrite: None,
            concurrency_limit: DEFAULT_CONCURRENCY,
            record_timeout_ms: None,
            default_mode: ExecutionMode::default(),
            make_executable: false,
            keep_originals: true,
            recursive: true,
            path_preference: PathPreference::default(),
        }
    }
}

impl ResolvedConfig {
    /// Fill every unset key of `config` with its built-in default.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let d = Self::default();
        Self {
            timestamp_strategy: config.timestamp_strategy.unwrap_or(d.timestamp_strategy),
            use_live_target: config.use_live_target.unwrap_or(d.use_live_target),
            fix_relative: config.fix_relative.unwrap_or(d.fix_relative),
            fix_search_depth: config.fix_search_depth.unwrap_or(d.fix_search_depth),
            verify: config.verify.unwrap_or(d.verify),
            force: config.force.unwrap_or(d.force),
            allow_broken: config.allow_broken.unwrap_or(d.allow_broken),
            target_base_rewrite: config.target_base_rewrite.clone(),
            concurrency_limit: config.concurrency_limit.unwrap_or(d.concurrency_limit),
            record_timeout_ms: config.record_timeout_ms,
            default_mode: config.default_mode.unwrap_or(d.default_mode),
            make_executable: config.make_executable.unwrap_or(d.make_executable),
            keep_originals: config.keep_originals.unwrap_or(d.keep_originals),
            recursive: config.recursive.unwrap_or(d.recursive),
            path_preference: config.path_preference.unwrap_or(d.path_preference),
        }
    }

    /// This configuration with a record's embedded overrides applied.
    #[must_use]
    pub fn layered(&self, embedded: &EmbeddedConfig) -> Self {
        let mut layered = self.clone();
        if let Some(strategy) = embedded.timestamp_strategy {
            layered.timestamp_strategy = strategy;
        }
        if let Some(live) = embedded.use_live_target {
            layered.use_live_target = live;
        }
        if let Some(verify) = embedded.verify {
            layered.verify = verify;
        }
        if let Some(mode) = embedded.default_mode {
            layered.default_mode = mode;
        }
        layered
    }

    /// The per-record deadline.
    #[must_use]
    pub fn record_timeout(&self) -> Option<Duration> {
        self.record_timeout_ms.map(Duration::from_millis)
    }

    /// Reject settings a batch cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for a zero concurrency limit,
    /// a zero timeout, a zero search depth with `fix_relative`, or an empty
    /// rewrite prefix.
    pub fn check(&self) -> Result<()> {
        let fail = |details: &str| {
            Err(Error::InvalidConfiguration {
                details: details.to_string(),
            })
        };
        if self.concurrency_limit == 0 {
            return fail("concurrency_limit must be at least 1");
        }
        if self.record_timeout_ms == Some(0) {
            return fail("record_timeout_ms must be greater than 0");
        }
        if self.fix_relative && self.fix_search_depth == 0 {
            return fail("fix_search_depth must be at least 1 when fix_relative is set");
        }
        if let Some(rewrite) = &self.target_base_rewrite {
            if rewrite.old_prefix().trim().is_empty() || rewrite.new_prefix().trim().is_empty() {
                return fail("target_base_rewrite prefixes must be non-empty");
            }
        }
        Ok(())
    }
}
