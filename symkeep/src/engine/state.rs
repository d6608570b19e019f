//! Recreation states and per-record outcomes.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::FailureKind;

/// A non-terminal stage of the recreation state machine.
///
/// Records move through these in order; every stage a record enters is
/// listed in its [`Outcome::stages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecreationState {
    /// Not yet started.
    Pending,
    /// Mapping the target onto this host.
    Resolving,
    /// Creating the link object.
    Creating,
    /// Applying the timestamp plan.
    TimestampApplying,
    /// Applying attribute bits.
    AttributeApplying,
    /// Reading the link back.
    Verifying,
}

impl RecreationState {
    /// Returns the kebab-case name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolving => "resolving",
            Self::Creating => "creating",
            Self::TimestampApplying => "timestamp-applying",
            Self::AttributeApplying => "attribute-applying",
            Self::Verifying => "verifying",
        }
    }

    /// Whether a link exists on disk once this stage has been entered.
    #[must_use]
    pub fn link_exists(self) -> bool {
        self > Self::Creating
    }
}

impl fmt::Display for RecreationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a record was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// A link at the destination points elsewhere and `force` is off.
    Conflict,
    /// Planned only.
    DryRun,
}

impl SkipReason {
    /// Returns the kebab-case name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conflict => "conflict",
            Self::DryRun => "dry-run",
        }
    }
}

/// Where a record's state machine stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum TerminalState {
    /// The link is in place. `confirmed` is false when read-back
    /// verification was disabled.
    Verified {
        /// Whether the link was read back and matched.
        confirmed: bool,
    },
    /// The record failed.
    Failed {
        /// Failure classification.
        kind: FailureKind,
    },
    /// Nothing was done by policy.
    Skipped {
        /// Why.
        reason: SkipReason,
    },
    /// Interrupted by cancellation. Not a terminal outcome; the record is
    /// reported so a later run can finish it.
    Incomplete {
        /// The last stage entered.
        reached: RecreationState,
    },
}

impl TerminalState {
    /// Whether the record reached `Verified` or `Skipped`.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Verified { .. } | Self::Skipped { .. })
    }

    /// Whether the record failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified { confirmed: true } => f.write_str("verified"),
            Self::Verified { confirmed: false } => f.write_str("verified(unconfirmed)"),
            Self::Failed { kind } => write!(f, "failed({kind})"),
            Self::Skipped { reason } => write!(f, "skipped({})", reason.as_str()),
            Self::Incomplete { reached } => write!(f, "incomplete({reached})"),
        }
    }
}

/// The result of running one record through the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Caller-supplied record identifier, usually the record file path.
    pub id: String,
    /// Where the state machine stopped.
    #[serde(flatten)]
    pub state: TerminalState,
    /// The link path on this host, once known.
    pub destination: Option<PathBuf>,
    /// The target text written (or to be written) into the link.
    pub target: Option<String>,
    /// Human-readable detail.
    pub detail: String,
    /// Soft failures that did not change the state.
    pub warnings: Vec<String>,
    /// Every stage entered, in order.
    pub stages: Vec<RecreationState>,
}

impl Outcome {
    /// An outcome for a record that never entered the engine.
    #[must_use]
    pub fn failed(id: impl Into<String>, kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: TerminalState::Failed { kind },
            destination: None,
            target: None,
            detail: detail.into(),
            warnings: Vec::new(),
            stages: Vec::new(),
        }
    }
}
