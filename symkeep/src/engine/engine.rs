//! The per-record recreation state machine.

use std::fs as stdfs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError};
use std::time::Instant;

use chrono::Utc;

use crate::config::ResolvedConfig;
use crate::error::{Error, Result};
use crate::path::local::{absolutize, relative_link_text, resolve_link_target};
use crate::path::{PathParts, PathResolver};
use crate::record::{LinkRecord, TargetKind};
use crate::timestamp;

use super::fs::{self, Occupant};
use super::locks::{CancelToken, PathLocks};
use super::state::{Outcome, RecreationState, SkipReason, TerminalState};

/// Where a recreated link is placed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Placement {
    /// The record's own link path, resolved for this host.
    #[default]
    Original,
    /// `location/<link file name>`.
    Into(PathBuf),
    /// `location/subdir/<link file name>`, preserving a directory structure.
    Under {
        /// Base directory.
        location: PathBuf,
        /// Path below the base.
        subdir: PathBuf,
    },
}

/// Per-record request options.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Where the link goes.
    pub placement: Placement,
    /// Resolve and inspect the destination without touching it.
    pub dry_run: bool,
    /// Give up at the next stage boundary after this instant.
    pub deadline: Option<Instant>,
}

enum Halt {
    Cancelled,
    Expired,
    Error(Error),
}

impl From<Error> for Halt {
    fn from(err: Error) -> Self {
        Self::Error(err)
    }
}

type Step<T> = std::result::Result<T, Halt>;

struct Run<'a> {
    outcome: Outcome,
    deadline: Option<Instant>,
    cancel: &'a CancelToken,
}

impl Run<'_> {
    fn enter(&mut self, stage: RecreationState) -> Step<()> {
        if self.cancel.is_cancelled() {
            return Err(Halt::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Halt::Expired);
        }
        self.outcome.stages.push(stage);
        Ok(())
    }

    fn reached(&self) -> RecreationState {
        self.outcome
            .stages
            .last()
            .copied()
            .unwrap_or(RecreationState::Pending)
    }
}

struct Target {
    /// Text written into the link.
    text: PathBuf,
    /// Where that text points from the destination.
    absolute: PathBuf,
}

/// Turns [`LinkRecord`]s back into live links.
///
/// One engine is shared by every worker of a batch; the path locks and
/// cancellation token it holds are shared with it.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use symkeep::config::ResolvedConfig;
/// use symkeep::engine::{RecreationEngine, Request};
/// use symkeep::path::{HostContext, PathResolver};
/// use symkeep::record::format;
///
/// let host = Arc::new(HostContext::detect());
/// let record = format::read("docs.symkeep".as_ref(), &host)?;
/// let engine = RecreationEngine::new(PathResolver::new(host));
/// let outcome = engine.recreate("docs.symkeep", &record, &Request::default(), &ResolvedConfig::default());
/// println!("{}: {}", outcome.id, outcome.state);
/// # Ok::<(), symkeep::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct RecreationEngine {
    resolver: PathResolver,
    locks: Arc<PathLocks>,
    cancel: CancelToken,
}

impl RecreationEngine {
    /// Create an engine with its own lock table and token.
    #[must_use]
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            resolver,
            locks: Arc::new(PathLocks::new()),
            cancel: CancelToken::new(),
        }
    }

    /// Share `locks` with other engines.
    #[must_use]
    pub fn with_locks(mut self, locks: Arc<PathLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Observe `cancel` at every stage boundary.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The resolver in use.
    #[must_use]
    pub const fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Where `record` lands under `placement`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathUnresolvable`] when the original link path does
    /// not map onto this host, or [`Error::InvalidPath`] when it has no
    /// file name.
    pub fn destination(&self, record: &LinkRecord, placement: &Placement) -> Result<PathBuf> {
        let destination = match placement {
            Placement::Original => PathBuf::from(record.link.resolve(&self.resolver)?),
            Placement::Into(location) => location.join(link_name(record)?),
            Placement::Under { location, subdir } => location.join(subdir).join(link_name(record)?),
        };
        absolutize(&destination)
    }

    /// Run `record` through the state machine.
    ///
    /// `config` is the record's effective configuration (batch settings
    /// layered with the record's embedded config). Never returns an error:
    /// every failure ends the record in [`TerminalState::Failed`].
    #[must_use]
    pub fn recreate(
        &self,
        id: &str,
        record: &LinkRecord,
        request: &Request,
        config: &ResolvedConfig,
    ) -> Outcome {
        let mut run = Run {
            outcome: Outcome {
                id: id.to_string(),
                state: TerminalState::Incomplete {
                    reached: RecreationState::Pending,
                },
                destination: None,
                target: None,
                detail: String::new(),
                warnings: Vec::new(),
                stages: Vec::new(),
            },
            deadline: request.deadline,
            cancel: &self.cancel,
        };

        let (state, detail) = match self.drive(&mut run, record, request, config) {
            Ok(done) => done,
            Err(Halt::Cancelled) => {
                let reached = run.reached();
                let detail = if reached.link_exists() {
                    format!("cancelled after creating the link (reached {reached})")
                } else {
                    "cancelled before any change".to_string()
                };
                (TerminalState::Incomplete { reached }, detail)
            }
            Err(Halt::Expired) => {
                let millis = config.record_timeout_ms.unwrap_or_default();
                let err = Error::Timeout { millis };
                (
                    TerminalState::Failed {
                        kind: err.failure_kind(),
                    },
                    format!("{err} (reached {})", run.reached()),
                )
            }
            Err(Halt::Error(err)) => (
                TerminalState::Failed {
                    kind: err.failure_kind(),
                },
                err.to_string(),
            ),
        };

        for warning in &run.outcome.warnings {
            log::warn!("{id}: {warning}");
        }
        match state {
            TerminalState::Failed { .. } => log::warn!("{id}: {state}: {detail}"),
            _ => log::debug!("{id}: {state}: {detail}"),
        }

        run.outcome.state = state;
        run.outcome.detail = detail;
        run.outcome
    }

    fn drive(
        &self,
        run: &mut Run<'_>,
        record: &LinkRecord,
        request: &Request,
        config: &ResolvedConfig,
    ) -> Step<(TerminalState, String)> {
        run.enter(RecreationState::Pending)?;
        let destination = self.destination(record, &request.placement)?;
        run.outcome.destination = Some(destination.clone());

        run.enter(RecreationState::Resolving)?;
        let target = self.resolve_target(record, &destination, config, &mut run.outcome.warnings)?;
        run.outcome.target = Some(target.text.display().to_string());

        let slot = self.locks.slot(&destination);
        let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let replacing = match fs::occupant(&destination)? {
            Occupant::Vacant => false,
            Occupant::Link(actual) if fs::targets_match(&actual, &target.text) => {
                return Ok((
                    TerminalState::Verified { confirmed: true },
                    "already linked".to_string(),
                ));
            }
            Occupant::Link(actual) if !config.force => {
                return Ok((
                    TerminalState::Skipped {
                        reason: SkipReason::Conflict,
                    },
                    format!("existing link points at {}", actual.display()),
                ));
            }
            Occupant::Link(_) => true,
            Occupant::Other => {
                return Err(Error::DestinationOccupied { path: destination }.into());
            }
        };

        if request.dry_run {
            let verb = if replacing { "would replace" } else { "would create" };
            return Ok((
                TerminalState::Skipped {
                    reason: SkipReason::DryRun,
                },
                format!("{verb} {} -> {}", destination.display(), target.text.display()),
            ));
        }

        run.enter(RecreationState::Creating)?;
        if replacing {
            fs::replace_link(&target.text, &destination, record.target.kind)?;
        } else {
            if let Some(parent) = destination.parent() {
                stdfs::create_dir_all(parent).map_err(|e| Error::from_io_at(parent, e))?;
            }
            fs::create_link(&target.text, &destination, record.target.kind)?;
        }
        log::debug!("linked {} -> {}", destination.display(), target.text.display());

        run.enter(RecreationState::TimestampApplying)?;
        self.apply_timestamps(record, &destination, &target.absolute, config, &mut run.outcome.warnings);

        run.enter(RecreationState::AttributeApplying)?;
        let attribute_warnings = fs::apply_attributes(&destination, &record.attributes);
        run.outcome.warnings.extend(attribute_warnings);

        if !config.verify {
            return Ok((
                TerminalState::Verified { confirmed: false },
                "created; verification disabled".to_string(),
            ));
        }

        run.enter(RecreationState::Verifying)?;
        match fs::occupant(&destination)? {
            Occupant::Link(actual) if fs::targets_match(&actual, &target.text) => Ok((
                TerminalState::Verified { confirmed: true },
                format!("linked to {}", target.text.display()),
            )),
            Occupant::Link(actual) => Err(Error::VerificationFailed {
                path: destination,
                expected: target.text.display().to_string(),
                actual: actual.display().to_string(),
            }
            .into()),
            Occupant::Vacant | Occupant::Other => Err(Error::VerificationFailed {
                path: destination,
                expected: target.text.display().to_string(),
                actual: "no link".to_string(),
            }
            .into()),
        }
    }

    fn resolve_target(
        &self,
        record: &LinkRecord,
        destination: &Path,
        config: &ResolvedConfig,
        warnings: &mut Vec<String>,
    ) -> Result<Target> {
        let info = &record.target;
        let text = match info.path.resolve(&self.resolver) {
            Ok(text) => PathBuf::from(text),
            Err(Error::PathUnresolvable { path, candidates }) => {
                if let Some(found) = self.relink(record, destination, config) {
                    warnings.push(format!(
                        "target {path} unresolvable; relinked to {}",
                        found.text.display()
                    ));
                    return Ok(found);
                }
                if !config.allow_broken {
                    return Err(Error::PathUnresolvable { path, candidates });
                }
                warnings.push(format!("target {path} unresolvable; link created broken"));
                PathBuf::from(&info.path.raw)
            }
            Err(e) => return Err(e),
        };

        let absolute = resolve_link_target(destination, &text);
        if info.kind != TargetKind::Missing && !absolute.exists() {
            if info.relative {
                if let Some(found) = self.relink(record, destination, config) {
                    warnings.push(format!(
                        "target {} missing; relinked to {}",
                        text.display(),
                        found.text.display()
                    ));
                    return Ok(found);
                }
            }
            warnings.push(format!("target {} does not exist on this host", absolute.display()));
        }
        Ok(Target { text, absolute })
    }

    /// Run the bounded same-name search when `fix_relative` is set.
    fn relink(&self, record: &LinkRecord, destination: &Path, config: &ResolvedConfig) -> Option<Target> {
        if !config.fix_relative {
            return None;
        }
        let parts = PathParts::parse(&record.target.path.normalized, record.target.path.flavor).ok()?;
        let name = parts.file_name()?;
        let start = destination.parent()?;
        let found = fs::search_same_name(start, name.as_ref(), config.fix_search_depth)?;
        let text = relative_link_text(destination, &found).unwrap_or_else(|| found.clone());
        Some(Target {
            text,
            absolute: found,
        })
    }

    fn apply_timestamps(
        &self,
        record: &LinkRecord,
        destination: &Path,
        target: &Path,
        config: &ResolvedConfig,
        warnings: &mut Vec<String>,
    ) {
        let live = if config.use_live_target {
            match timestamp::capture::read(target, true) {
                Ok(times) => Some(times),
                Err(e) => {
                    log::debug!("live target {} unreadable: {e}", target.display());
                    None
                }
            }
        } else {
            None
        };

        let plan = match timestamp::resolve(
            config.timestamp_strategy,
            &record.timestamps,
            live.as_ref(),
            Utc::now(),
        ) {
            Ok(plan) => plan,
            Err(e) => {
                warnings.push(e.to_string());
                return;
            }
        };
        warnings.extend(plan.warnings());

        match timestamp::apply(destination, &plan) {
            Ok(applied) => warnings.extend(applied),
            Err(e) => warnings.push(format!("timestamps not applied: {e}")),
        }
    }
}

fn link_name(record: &LinkRecord) -> Result<String> {
    PathParts::parse(&record.link.normalized, record.link.flavor)?
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidPath {
            path: PathBuf::from(&record.link.raw),
            reason: "link path has no file name".to_string(),
        })
}
