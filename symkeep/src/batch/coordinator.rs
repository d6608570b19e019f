//! Parallel, order-preserving batch recreation.

use std::thread;
use std::time::Instant;

use crossbeam_channel::unbounded;

use crate::config::ResolvedConfig;
use crate::engine::{Outcome, Placement, RecreationEngine, Request};
use crate::error::{Error, Result};
use crate::record::LinkRecord;

use super::report::BatchReport;

/// One unit of batch work.
///
/// Records that failed to load are still submitted so they appear in the
/// report at their input position.
#[derive(Debug)]
pub struct RecordInput {
    /// Identifier used in the report, usually the record file path.
    pub id: String,
    /// The loaded record, or why it could not be loaded.
    pub record: Result<LinkRecord>,
    /// Where the link goes.
    pub placement: Placement,
}

impl RecordInput {
    /// An input placed at the record's own link path.
    #[must_use]
    pub fn new(id: impl Into<String>, record: Result<LinkRecord>) -> Self {
        Self {
            id: id.into(),
            record,
            placement: Placement::Original,
        }
    }

    /// Place the link elsewhere.
    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }
}

/// Runs many records through a [`RecreationEngine`].
///
/// Records are processed independently by up to `concurrency_limit`
/// workers; one record's failure never stops the others. The report lists
/// outcomes in input order regardless of completion order.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use symkeep::batch::BatchCoordinator;
/// use symkeep::config::ResolvedConfig;
/// use symkeep::engine::RecreationEngine;
/// use symkeep::path::{HostContext, PathResolver};
///
/// let engine = RecreationEngine::new(PathResolver::new(Arc::new(HostContext::posix())));
/// let coordinator = BatchCoordinator::new(engine, ResolvedConfig::default());
/// let report = coordinator.run(Vec::new()).unwrap();
/// assert_eq!(report.counts.total(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct BatchCoordinator {
    engine: RecreationEngine,
    config: ResolvedConfig,
    dry_run: bool,
}

impl BatchCoordinator {
    /// Create a coordinator running `engine` with the batch-level `config`.
    #[must_use]
    pub const fn new(engine: RecreationEngine, config: ResolvedConfig) -> Self {
        Self {
            engine,
            config,
            dry_run: false,
        }
    }

    /// Resolve and inspect only.
    #[must_use]
    pub const fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// The batch-level configuration.
    #[must_use]
    pub const fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Process every input.
    ///
    /// # Errors
    ///
    /// Fails before touching any record when the configuration is
    /// inconsistent, or when every input failed with
    /// [`Error::FormatVersionUnsupported`]. Per-record failures are
    /// reported, never returned.
    pub fn run(&self, inputs: Vec<RecordInput>) -> Result<BatchReport> {
        self.preflight(&inputs)?;

        let total = inputs.len();
        let workers = self.config.concurrency_limit.min(total).max(1);
        log::info!("recreating {total} records with {workers} workers");

        let (job_tx, job_rx) = unbounded::<(usize, RecordInput)>();
        let (result_tx, result_rx) = unbounded::<(usize, Outcome)>();
        for job in inputs.into_iter().enumerate() {
            // The receiver outlives this loop.
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        thread::scope(|scope| {
            for _ in 0..workers {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                scope.spawn(move || {
                    for (index, input) in &jobs {
                        let outcome = self.process(input);
                        if results.send((index, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let mut slots: Vec<Option<Outcome>> = (0..total).map(|_| None).collect();
        for (index, outcome) in result_rx {
            slots[index] = Some(outcome);
        }
        let entries: Vec<Outcome> = slots.into_iter().flatten().collect();

        let report = BatchReport::from_outcomes(entries);
        log::info!(
            "batch done: {} verified, {} unconfirmed, {} skipped, {} failed, {} incomplete",
            report.counts.verified,
            report.counts.unconfirmed,
            report.counts.skipped,
            report.counts.failed,
            report.counts.incomplete
        );
        Ok(report)
    }

    fn preflight(&self, inputs: &[RecordInput]) -> Result<()> {
        self.config.check()?;

        let unsupported = inputs
            .iter()
            .filter(|i| matches!(i.record, Err(Error::FormatVersionUnsupported { .. })))
            .count();
        if !inputs.is_empty() && unsupported == inputs.len() {
            if let Some(Err(Error::FormatVersionUnsupported { found, supported })) =
                inputs.first().map(|i| &i.record)
            {
                return Err(Error::FormatVersionUnsupported {
                    found: *found,
                    supported: *supported,
                });
            }
        }
        Ok(())
    }

    fn process(&self, input: RecordInput) -> Outcome {
        let RecordInput {
            id,
            record,
            placement,
        } = input;
        let record = match record {
            Ok(record) => record,
            Err(err) => return Outcome::failed(id, err.failure_kind(), err.to_string()),
        };

        let config = match &record.embedded_config {
            Some(embedded) => self.config.layered(embedded),
            None => self.config.clone(),
        };
        let request = Request {
            placement,
            dry_run: self.dry_run,
            deadline: config.record_timeout().map(|t| Instant::now() + t),
        };
        self.engine.recreate(&id, &record, &request, &config)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::engine::{CancelToken, SkipReason, TerminalState};
    use crate::error::FailureKind;
    use crate::path::{HostContext, PathResolver};
    use crate::record::{record_for_target, EmbeddedConfig, ExecutionMode};
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn resolver() -> PathResolver {
        PathResolver::new(Arc::new(HostContext::posix()))
    }

    fn coordinator(config: ResolvedConfig) -> BatchCoordinator {
        BatchCoordinator::new(RecreationEngine::new(resolver()), config)
    }

    fn record(target: &str, link: &Path) -> LinkRecord {
        record_for_target(target, link, &resolver(), ExecutionMode::Info).unwrap()
    }

    #[test]
    fn test_one_failure_does_not_stop_batch() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("t.txt");
        fs::write(&target, "x").unwrap();
        let target = target.to_str().unwrap().to_string();

        let inputs: Vec<RecordInput> = (0..10)
            .map(|i| {
                let link = dir.path().join(format!("link{i}"));
                let rec = if i == 4 {
                    record(r"Q:\gone\t.txt", &link)
                } else {
                    record(&target, &link)
                };
                RecordInput::new(format!("r{i}"), Ok(rec))
            })
            .collect();

        let config = ResolvedConfig {
            concurrency_limit: 3,
            ..Default::default()
        };
        let report = coordinator(config).run(inputs).unwrap();

        assert_eq!(report.counts.failed, 1);
        assert_eq!(report.counts.verified, 9);
        let ids: Vec<&str> = report.entries.iter().map(|e| e.id.as_str()).collect();
        let expected: Vec<String> = (0..10).map(|i| format!("r{i}")).collect();
        assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(
            report.entries[4].state,
            TerminalState::Failed {
                kind: FailureKind::PathUnresolvable
            }
        );
        assert!(dir.path().join("link9").symlink_metadata().is_ok());
    }

    #[test]
    fn test_load_failures_reported_in_place() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("l");
        let inputs = vec![
            RecordInput::new(
                "bad",
                Err(Error::RecordCorrupt {
                    details: "truncated".into(),
                }),
            ),
            RecordInput::new("good", Ok(record("/tmp", &link))),
            RecordInput::new(
                "new",
                Err(Error::FormatVersionUnsupported {
                    found: 9,
                    supported: 2,
                }),
            ),
        ];
        let report = coordinator(ResolvedConfig::default()).run(inputs).unwrap();
        assert_eq!(
            report.entries[0].state,
            TerminalState::Failed {
                kind: FailureKind::RecordCorrupt
            }
        );
        assert_eq!(report.entries[1].state, TerminalState::Verified { confirmed: true });
        assert_eq!(
            report.entries[2].state,
            TerminalState::Failed {
                kind: FailureKind::FormatVersionUnsupported
            }
        );
    }

    #[test]
    fn test_all_unsupported_aborts() {
        let inputs = vec![
            RecordInput::new(
                "a",
                Err(Error::FormatVersionUnsupported {
                    found: 3,
                    supported: 2,
                }),
            ),
            RecordInput::new(
                "b",
                Err(Error::FormatVersionUnsupported {
                    found: 4,
                    supported: 2,
                }),
            ),
        ];
        let err = coordinator(ResolvedConfig::default()).run(inputs).unwrap_err();
        assert!(matches!(err, Error::FormatVersionUnsupported { found: 3, .. }));
    }

    #[test]
    fn test_inconsistent_config_aborts() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("l");
        let config = ResolvedConfig {
            concurrency_limit: 0,
            ..Default::default()
        };
        let result = coordinator(config).run(vec![RecordInput::new("a", Ok(record("/tmp", &link)))]);
        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
        assert!(link.symlink_metadata().is_err());
    }

    #[test]
    fn test_same_destination_serialized() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("t.txt");
        fs::write(&target, "x").unwrap();
        let link = dir.path().join("shared");
        let rec = record(target.to_str().unwrap(), &link);
        let inputs: Vec<RecordInput> = (0..6)
            .map(|i| RecordInput::new(format!("r{i}"), Ok(rec.clone())))
            .collect();
        let config = ResolvedConfig {
            concurrency_limit: 6,
            ..Default::default()
        };

        let report = coordinator(config).run(inputs).unwrap();
        assert_eq!(report.counts.verified, 6);
        let created = report
            .entries
            .iter()
            .filter(|e| e.detail != "already linked")
            .count();
        assert_eq!(created, 1);
    }

    #[test]
    fn test_embedded_config_layers_over_batch() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("l");
        let mut rec = record("/tmp", &link);
        rec.embedded_config = Some(EmbeddedConfig {
            verify: Some(false),
            ..Default::default()
        });
        let report = coordinator(ResolvedConfig::default())
            .run(vec![RecordInput::new("a", Ok(rec))])
            .unwrap();
        assert_eq!(report.counts.unconfirmed, 1);
    }

    #[test]
    fn test_dry_run_and_cancel() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("l");
        let report = coordinator(ResolvedConfig::default())
            .dry_run()
            .run(vec![RecordInput::new("a", Ok(record("/tmp", &link)))])
            .unwrap();
        assert_eq!(
            report.entries[0].state,
            TerminalState::Skipped {
                reason: SkipReason::DryRun
            }
        );

        let cancel = CancelToken::new();
        cancel.cancel();
        let engine = RecreationEngine::new(resolver()).with_cancel(cancel);
        let report = BatchCoordinator::new(engine, ResolvedConfig::default())
            .run(vec![RecordInput::new("a", Ok(record("/tmp", &link)))])
            .unwrap();
        assert_eq!(report.counts.incomplete, 1);
        assert_eq!(report.unfinished().len(), 1);
        assert!(link.symlink_metadata().is_err());
    }
}
