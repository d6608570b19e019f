//! Configuration schema definitions.
//!
//! This module defines the configuration keys symkeep reads from files,
//! the environment and the command line. Every field is optional so that
//! sources can be layered.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::{PathPreference, PrefixRewrite};
use crate::record::ExecutionMode;
use crate::timestamp::TimestampStrategy;

/// Complete configuration structure.
///
/// # Examples
///
/// ```
/// use symkeep::config::Config;
/// use symkeep::timestamp::TimestampStrategy;
///
/// let config = Config {
///     timestamp_strategy: Some(TimestampStrategy::Target),
///     verify: Some(false),
///     ..Default::default()
/// };
/// assert_eq!(config.timestamp_strategy, Some(TimestampStrategy::Target));
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Which timestamps recreated links receive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_strategy: Option<TimestampStrategy>,

    /// Re-read the live target's timestamps at recreation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_live_target: Option<bool>,

    /// Search for a same-named target when a target cannot be resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_relative: Option<bool>,

    /// Depth bound for the same-name search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_search_depth: Option<usize>,

    /// Read back every created link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify: Option<bool>,

    /// Replace existing links that point elsewhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,

    /// Create links whose target cannot be resolved, using the raw text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_broken: Option<bool>,

    /// Target-base rewrite, `old_prefix:new_prefix`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_base_rewrite: Option<PrefixRewrite>,

    /// Maximum records processed in parallel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency_limit: Option<usize>,

    /// Per-record deadline in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_timeout_ms: Option<u64>,

    /// Execution mode written into new records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<ExecutionMode>,

    /// Write new records in the wrapped, executable form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_executable: Option<bool>,

    /// Keep links after `convert` has written their records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_originals: Option<bool>,

    /// Descend into subdirectories when scanning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,

    /// Which candidate wins when a network path resolves several ways.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_preference: Option<PathPreference>,
}

impl Config {
    /// Every key accepted by [`Config::set_key`].
    pub const KEYS: [&'static str; 15] = [
        "timestamp_strategy",
        "use_live_target",
        "fix_relative",
        "fix_search_depth",
        "verify",
        "force",
        "allow_broken",
        "target_base_rewrite",
        "concurrency_limit",
        "record_timeout_ms",
        "default_mode",
        "make_executable",
        "keep_originals",
        "recursive",
        "path_preference",
    ];

    /// Whether no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set `key` from its textual form, as written on the command line.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown key or a value that does
    /// not parse.
    ///
    /// # Examples
    ///
    /// ```
    /// use symkeep::config::Config;
    ///
    /// let mut config = Config::default();
    /// config.set_key("concurrency_limit", "8").unwrap();
    /// assert_eq!(config.concurrency_limit, Some(8));
    /// assert!(config.set_key("colour", "blue").is_err());
    /// ```
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "timestamp_strategy" => self.timestamp_strategy = Some(value.parse()?),
            "use_live_target" => self.use_live_target = Some(parse_bool(key, value)?),
            "fix_relative" => self.fix_relative = Some(parse_bool(key, value)?),
            "fix_search_depth" => self.fix_search_depth = Some(parse_number(key, value)?),
            "verify" => self.verify = Some(parse_bool(key, value)?),
            "force" => self.force = Some(parse_bool(key, value)?),
            "allow_broken" => self.allow_broken = Some(parse_bool(key, value)?),
            "target_base_rewrite" => self.target_base_rewrite = Some(value.parse()?),
            "concurrency_limit" => self.concurrency_limit = Some(parse_number(key, value)?),
            "record_timeout_ms" => self.record_timeout_ms = Some(parse_number(key, value)?),
            "default_mode" => self.default_mode = Some(value.parse()?),
            "make_executable" => self.make_executable = Some(parse_bool(key, value)?),
            "keep_originals" => self.keep_originals = Some(parse_bool(key, value)?),
            "recursive" => self.recursive = Some(parse_bool(key, value)?),
            "path_preference" => self.path_preference = Some(value.parse()?),
            _ => {
                return Err(Error::Validation {
                    field: key.into(),
                    message: format!("unknown key (expected one of: {})", Self::KEYS.join(", ")),
                })
            }
        }
        Ok(())
    }
}

/// Parse a boolean value from a string.
///
/// Accepts: true/1/yes/on for true, false/0/no/off for false (case-insensitive).
///
/// # Errors
///
/// Returns a validation error naming `field` for anything else.
pub fn parse_bool(field: &str, s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::Validation {
            field: field.into(),
            message: format!("Invalid boolean value: '{s}' (expected true/false/1/0/yes/no/on/off)"),
        }),
    }
}

/// Parse a non-negative integer.
///
/// # Errors
///
/// Returns a validation error naming `field` if `s` is not a number.
pub fn parse_number<T: std::str::FromStr>(field: &str, s: &str) -> Result<T> {
    s.trim().parse().map_err(|_| Error::Validation {
        field: field.into(),
        message: format!("Must be a non-negative integer, got '{s}'"),
    })
}
