//! Plan types for link and record operations.
//!
//! This module defines the plan structures that describe what actions
//! will be taken during an operation, without actually performing them.

use std::path::PathBuf;

use crate::record::LinkRecord;

/// A single action to be taken during plan execution.
///
/// Each action corresponds to one filesystem change that will be
/// performed when the plan is executed.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanAction {
    /// Write a record file, replacing any existing one.
    WriteRecord {
        /// Record file path.
        path: PathBuf,
        /// The record to write.
        record: Box<LinkRecord>,
        /// Use the wrapped, executable form.
        wrapped: bool,
    },

    /// Remove a live symbolic link.
    RemoveLink(PathBuf),

    /// Point a live link at a new target.
    Relink {
        /// The link to rewrite.
        link: PathBuf,
        /// Its current target text.
        old_target: PathBuf,
        /// The replacement target text.
        new_target: PathBuf,
        /// Keep `<link>.backup` pointing at the old target.
        backup: bool,
    },
}

impl PlanAction {
    /// Returns a human-readable description of this action.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::WriteRecord { path, record, .. } => {
                format!("Write record {} for {}", path.display(), record.link)
            }
            Self::RemoveLink(path) => format!("Remove link {}", path.display()),
            Self::Relink {
                link,
                old_target,
                new_target,
                ..
            } => format!(
                "Relink {}: {} -> {}",
                link.display(),
                old_target.display(),
                new_target.display()
            ),
        }
    }
}

/// A complete operation plan describing all actions to be taken.
///
/// Plans are generated during the planning phase and can be inspected,
/// logged, or executed. They include a description, a sequence of actions,
/// and any warnings that should be communicated to the user.
#[derive(Debug, Clone)]
pub struct OperationPlan {
    /// A human-readable description of the operation.
    pub description: String,

    /// The sequence of actions to perform.
    pub actions: Vec<PlanAction>,

    /// Warnings to communicate to the user.
    pub warnings: Vec<String>,
}

impl OperationPlan {
    /// Creates a new operation plan with the given description.
    ///
    /// # Examples
    ///
    /// ```
    /// use symkeep::operations::OperationPlan;
    ///
    /// let plan = OperationPlan::new("Rebase links under /data");
    /// assert_eq!(plan.description, "Rebase links under /data");
    /// assert!(plan.is_empty());
    /// ```
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            actions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds an action to the plan.
    ///
    /// # Examples
    ///
    /// ```
    /// use symkeep::operations::{OperationPlan, PlanAction};
    /// use std::path::PathBuf;
    ///
    /// let plan = OperationPlan::new("Test")
    ///     .add_action(PlanAction::RemoveLink(PathBuf::from("/links/old")));
    ///
    /// assert_eq!(plan.actions.len(), 1);
    /// ```
    #[must_use]
    pub fn add_action(mut self, action: PlanAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Adds a warning to the plan.
    #[must_use]
    pub fn add_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Checks if the plan has no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Returns the number of actions in the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }
}
