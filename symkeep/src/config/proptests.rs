//! Property-based tests for configuration system.

use super::merger::ConfigMerger;
use super::resolved::ResolvedConfig;
use super::schema::Config;
use crate::record::ExecutionMode;
use crate::timestamp::TimestampStrategy;
use proptest::prelude::*;

fn strategy_strategy() -> impl Strategy<Value = TimestampStrategy> {
    prop::sample::select(TimestampStrategy::ALL.to_vec())
}

fn mode_strategy() -> impl Strategy<Value = ExecutionMode> {
    prop::sample::select(ExecutionMode::ALL.to_vec())
}

// Strategy for generating configs
fn config_strategy() -> impl Strategy<Value = Config> {
    (
        prop::option::of(strategy_strategy()),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
        prop::option::of(1usize..=32),
        prop::option::of(1usize..=256),
        prop::option::of(1u64..=60_000),
        prop::option::of(mode_strategy()),
    )
        .prop_map(
            |(strategy, verify, force, depth, limit, timeout, mode)| Config {
                timestamp_strategy: strategy,
                verify,
                force,
                fix_search_depth: depth,
                concurrency_limit: limit,
                record_timeout_ms: timeout,
                default_mode: mode,
                ..Default::default()
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        .. ProptestConfig::default()
    })]

    // Set keys of the higher source always win, unset keys fall through
    #[test]
    fn config_merge_higher_precedence_wins(low in config_strategy(), high in config_strategy()) {
        let mut merged = low.clone();
        ConfigMerger::merge_into(&mut merged, &high);

        prop_assert_eq!(merged.timestamp_strategy, high.timestamp_strategy.or(low.timestamp_strategy));
        prop_assert_eq!(merged.verify, high.verify.or(low.verify));
        prop_assert_eq!(merged.force, high.force.or(low.force));
        prop_assert_eq!(merged.fix_search_depth, high.fix_search_depth.or(low.fix_search_depth));
        prop_assert_eq!(merged.concurrency_limit, high.concurrency_limit.or(low.concurrency_limit));
        prop_assert_eq!(merged.record_timeout_ms, high.record_timeout_ms.or(low.record_timeout_ms));
        prop_assert_eq!(merged.default_mode, high.default_mode.or(low.default_mode));
    }

    // Merging an empty config is the identity
    #[test]
    fn config_merge_empty_is_identity(config in config_strategy()) {
        let mut merged = config.clone();
        ConfigMerger::merge_into(&mut merged, &Config::default());
        prop_assert_eq!(&merged, &config);

        let mut from_empty = Config::default();
        ConfigMerger::merge_into(&mut from_empty, &config);
        prop_assert_eq!(from_empty, config);
    }

    // Merging the same source twice changes nothing
    #[test]
    fn config_merge_idempotent(base in config_strategy(), overlay in config_strategy()) {
        let mut once = base.clone();
        ConfigMerger::merge_into(&mut once, &overlay);
        let mut twice = once.clone();
        ConfigMerger::merge_into(&mut twice, &overlay);
        prop_assert_eq!(once, twice);
    }

    // Validated configs resolve to something a batch can run with
    #[test]
    fn config_in_range_resolves_cleanly(config in config_strategy()) {
        prop_assert!(super::validator::ConfigValidator::validate(&config).is_ok());
        prop_assert!(ResolvedConfig::from_config(&config).check().is_ok());
    }

    // YAML round trip preserves every set key
    #[test]
    fn config_yaml_roundtrip(config in config_strategy()) {
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        prop_assert_eq!(parsed, config);
    }
}
