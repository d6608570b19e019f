//! Configuration merging and precedence handling.

use crate::config::loader::ConfigSource;
use crate::config::schema::Config;

/// Merges configuration sources according to precedence rules.
///
/// # Examples
///
/// ```
/// use symkeep::config::{Config, ConfigMerger};
///
/// let low = Config { verify: Some(true), ..Default::default() };
/// let high = Config { verify: Some(false), ..Default::default() };
///
/// let mut result = low;
/// ConfigMerger::merge_into(&mut result, &high);
/// assert_eq!(result.verify, Some(false));
/// ```
pub struct ConfigMerger;

/// Copy `$field` from `$source` into `$target` when it is set.
macro_rules! overlay {
    ($target:ident, $source:ident, $($field:ident),+ $(,)?) => {
        $(
            if $source.$field.is_some() {
                $target.$field.clone_from(&$source.$field);
            }
        )+
    };
}

impl ConfigMerger {
    /// Merge multiple configuration sources into final config.
    ///
    /// Sources should be provided in order from lowest to highest precedence.
    #[must_use]
    pub fn merge(sources: Vec<ConfigSource>) -> Config {
        let mut result = Config::default();

        for source in sources {
            Self::merge_into(&mut result, &source.config);
        }

        result
    }

    /// Merge source config into target (source overwrites target).
    ///
    /// Every key is a simple value: the source wins when it is set.
    pub fn merge_into(target: &mut Config, source: &Config) {
        overlay!(
            target,
            source,
            timestamp_strategy,
            use_live_target,
            fix_relative,
            fix_search_depth,
            verify,
            force,
            allow_broken,
            target_base_rewrite,
            concurrency_limit,
            record_timeout_ms,
            default_mode,
            make_executable,
            keep_originals,
            recursive,
            path_preference,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::TimestampStrategy;
    use std::path::PathBuf;

    fn source(precedence: u8, config: Config) -> ConfigSource {
        ConfigSource {
            path: PathBuf::from(format!("/config/{precedence}.yaml")),
            precedence,
            config,
        }
    }

    #[test]
    fn test_merge_empty() {
        assert!(ConfigMerger::merge(Vec::new()).is_empty());
    }

    #[test]
    fn test_merge_higher_precedence_wins() {
        let merged = ConfigMerger::merge(vec![
            source(
                1,
                Config {
                    timestamp_strategy: Some(TimestampStrategy::Current),
                    verify: Some(true),
                    ..Default::default()
                },
            ),
            source(
                2,
                Config {
                    timestamp_strategy: Some(TimestampStrategy::Target),
                    ..Default::default()
                },
            ),
        ]);
        assert_eq!(merged.timestamp_strategy, Some(TimestampStrategy::Target));
        assert_eq!(merged.verify, Some(true));
    }

    #[test]
    fn test_merge_into_none_keeps_target() {
        let mut target = Config {
            concurrency_limit: Some(2),
            target_base_rewrite: Some("/a:/b".parse().unwrap()),
            ..Default::default()
        };
        ConfigMerger::merge_into(&mut target, &Config::default());
        assert_eq!(target.concurrency_limit, Some(2));
        assert!(target.target_base_rewrite.is_some());
    }

    #[test]
    fn test_merge_into_replaces_rewrite() {
        let mut target = Config {
            target_base_rewrite: Some("/a:/b".parse().unwrap()),
            ..Default::default()
        };
        let source = Config {
            target_base_rewrite: Some("/c:/d".parse().unwrap()),
            ..Default::default()
        };
        ConfigMerger::merge_into(&mut target, &source);
        assert_eq!(target.target_base_rewrite, source.target_base_rewrite);
    }
}
