//! Configuration validation.
//!
//! Types already reject unknown strategies, modes and malformed rewrites
//! while parsing; this module checks the numeric ranges.

use crate::config::schema::Config;
use crate::error::{Error, Result};

/// Upper bound for `fix_search_depth`.
pub const MAX_SEARCH_DEPTH: usize = 32;

/// Upper bound for `concurrency_limit`.
pub const MAX_CONCURRENCY: usize = 256;

/// Validates configuration values.
///
/// # Examples
///
/// ```
/// use symkeep::config::{Config, ConfigValidator};
///
/// let config = Config::default();
/// ConfigValidator::validate(&config).unwrap();
///
/// let bad = Config { concurrency_limit: Some(0), ..Default::default() };
/// assert!(ConfigValidator::validate(&bad).is_err());
/// ```
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first invalid field.
    pub fn validate(config: &Config) -> Result<()> {
        if let Some(limit) = config.concurrency_limit {
            Self::validate_range("concurrency_limit", limit, 1, MAX_CONCURRENCY)?;
        }

        if let Some(depth) = config.fix_search_depth {
            Self::validate_range("fix_search_depth", depth, 1, MAX_SEARCH_DEPTH)?;
        }

        if config.record_timeout_ms == Some(0) {
            return Err(Error::Validation {
                field: "record_timeout_ms".into(),
                message: "Timeout must be greater than 0 (omit it for no timeout)".into(),
            });
        }

        Ok(())
    }

    fn validate_range(field: &str, value: usize, min: usize, max: usize) -> Result<()> {
        if value < min || value > max {
            return Err(Error::Validation {
                field: field.into(),
                message: format!("Must be between {min} and {max}, got {value}"),
            });
        }
        Ok(())
    }
}
