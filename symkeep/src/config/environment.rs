//! Environment variable handling for configuration overrides.
//!
//! This module provides support for `SYMKEEP_*` environment variables that
//! override configuration file values.

use crate::config::schema::{parse_bool, parse_number, Config};
use crate::error::Result;
use std::env;

/// Handles environment variable overrides for configuration.
///
/// | Variable                     | Key                   |
/// |------------------------------|-----------------------|
/// | `SYMKEEP_TIMESTAMP_STRATEGY` | `timestamp_strategy`  |
/// | `SYMKEEP_USE_LIVE_TARGET`    | `use_live_target`     |
/// | `SYMKEEP_FIX_RELATIVE`       | `fix_relative`        |
/// | `SYMKEEP_VERIFY`             | `verify`              |
/// | `SYMKEEP_FORCE`              | `force`               |
/// | `SYMKEEP_TARGET_BASE`        | `target_base_rewrite` |
/// | `SYMKEEP_CONCURRENCY`        | `concurrency_limit`   |
/// | `SYMKEEP_DEFAULT_MODE`       | `default_mode`        |
///
/// # Examples
///
/// ```no_run
/// use symkeep::config::{Config, EnvironmentConfig};
///
/// let mut config = Config::default();
/// EnvironmentConfig::apply_overrides(&mut config).unwrap();
/// ```
pub struct EnvironmentConfig;

impl EnvironmentConfig {
    /// Apply environment variable overrides to config.
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable value is invalid
    /// (e.g., unknown strategy, invalid boolean).
    pub fn apply_overrides(config: &mut Config) -> Result<()> {
        if let Ok(val) = env::var("SYMKEEP_TIMESTAMP_STRATEGY") {
            config.timestamp_strategy = Some(val.parse()?);
        }

        if let Ok(val) = env::var("SYMKEEP_USE_LIVE_TARGET") {
            config.use_live_target = Some(parse_bool("SYMKEEP_USE_LIVE_TARGET", &val)?);
        }

        if let Ok(val) = env::var("SYMKEEP_FIX_RELATIVE") {
            config.fix_relative = Some(parse_bool("SYMKEEP_FIX_RELATIVE", &val)?);
        }

        if let Ok(val) = env::var("SYMKEEP_VERIFY") {
            config.verify = Some(parse_bool("SYMKEEP_VERIFY", &val)?);
        }

        if let Ok(val) = env::var("SYMKEEP_FORCE") {
            config.force = Some(parse_bool("SYMKEEP_FORCE", &val)?);
        }

        if let Ok(val) = env::var("SYMKEEP_TARGET_BASE") {
            config.target_base_rewrite = Some(val.parse()?);
        }

        if let Ok(val) = env::var("SYMKEEP_CONCURRENCY") {
            config.concurrency_limit = Some(parse_number("SYMKEEP_CONCURRENCY", &val)?);
        }

        if let Ok(val) = env::var("SYMKEEP_DEFAULT_MODE") {
            config.default_mode = Some(val.parse()?);
        }

        Ok(())
    }
}
