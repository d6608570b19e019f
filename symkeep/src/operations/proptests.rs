//! Property-based tests for operations module.
//!
//! These tests focus on rebasing invariants and plan execution.

use super::executor::PlanExecutor;
use super::plan::{OperationPlan, PlanAction};
use super::rebase::{rebased_record_target, RebaseOptions};
use crate::path::local::{relative_link_text, resolve_link_target};
use crate::path::{HostContext, PathResolver, PrefixRewrite, RebaseDirection};
use crate::record::{record_for_target, ExecutionMode};
use proptest::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

fn segments_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9_-]{1,10}", 1..6)
}

fn absolute(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}

fn resolver() -> PathResolver {
    PathResolver::new(Arc::new(HostContext::posix()))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        .. ProptestConfig::default()
    })]

    // Live-link relative text always points back at the same target
    #[test]
    fn relative_text_resolves_to_target(link in segments_strategy(), target in segments_strategy()) {
        let link = PathBuf::from(absolute(&link));
        let target = PathBuf::from(absolute(&target));
        if let Some(text) = relative_link_text(&link, &target) {
            prop_assert!(!text.is_absolute());
            prop_assert_eq!(resolve_link_target(&link, &text), target);
        }
    }

    // Record targets converted to relative and back are unchanged
    #[test]
    fn record_relative_round_trip(link in segments_strategy(), target in segments_strategy()) {
        let resolver = resolver();
        let target = absolute(&target);
        let record = record_for_target(&target, &PathBuf::from(absolute(&link)), &resolver, ExecutionMode::Info)
            .unwrap();

        let to_relative = RebaseOptions {
            direction: Some(RebaseDirection::ToRelative),
            ..Default::default()
        };
        let mut rebased = record.clone();
        if let Some(rel) = rebased_record_target(&record, &to_relative).unwrap() {
            rebased.rebase_target(&rel, &resolver).unwrap();
        }

        let to_absolute = RebaseOptions {
            direction: Some(RebaseDirection::ToAbsolute),
            ..Default::default()
        };
        let back = rebased_record_target(&rebased, &to_absolute)
            .unwrap()
            .unwrap_or_else(|| rebased.target.path.normalized.clone());
        prop_assert_eq!(back, target);
    }

    // Prefix rewrites only touch targets under the old prefix
    #[test]
    fn target_base_only_rewrites_matching(
        prefix in segments_strategy(),
        rest in segments_strategy(),
        other in segments_strategy(),
    ) {
        prop_assume!(prefix[0] != "elsewhere");
        let resolver = resolver();
        let old = absolute(&prefix);
        let rewrite = PrefixRewrite::new(old.clone(), "/mnt/new").unwrap();
        let options = RebaseOptions {
            target_base: Some(rewrite),
            ..Default::default()
        };

        let under = format!("{old}/{}", rest.join("/"));
        let record = record_for_target(&under, &PathBuf::from("/links/l"), &resolver, ExecutionMode::Info)
            .unwrap();
        let rewritten = rebased_record_target(&record, &options).unwrap();
        prop_assert_eq!(rewritten, Some(format!("/mnt/new/{}", rest.join("/"))));

        let elsewhere = format!("/elsewhere/{}", other.join("/"));
        let record = record_for_target(&elsewhere, &PathBuf::from("/links/l"), &resolver, ExecutionMode::Info)
            .unwrap();
        prop_assert_eq!(rebased_record_target(&record, &options).unwrap(), None);
    }

    // Dry runs describe every action and never fail
    #[test]
    fn dry_run_describes_every_action(names in prop::collection::vec("[a-z]{1,8}", 0..10)) {
        let mut plan = OperationPlan::new("test");
        for name in &names {
            plan = plan.add_action(PlanAction::RemoveLink(PathBuf::from("/nonexistent").join(name)));
        }
        let result = PlanExecutor::new().dry_run().execute(&plan);
        prop_assert!(result.success);
        prop_assert_eq!(result.actions_taken.len(), names.len());
    }
}
