//! Aggregated batch results.

use serde::Serialize;

use crate::engine::{Outcome, TerminalState};

/// Number of records per terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    /// Verified by reading the link back.
    pub verified: usize,
    /// Created with verification disabled.
    pub unconfirmed: usize,
    /// Skipped by policy.
    pub skipped: usize,
    /// Failed.
    pub failed: usize,
    /// Interrupted before reaching a terminal state.
    pub incomplete: usize,
}

impl Counts {
    fn add(&mut self, state: &TerminalState) {
        match state {
            TerminalState::Verified { confirmed: true } => self.verified += 1,
            TerminalState::Verified { confirmed: false } => self.unconfirmed += 1,
            TerminalState::Skipped { .. } => self.skipped += 1,
            TerminalState::Failed { .. } => self.failed += 1,
            TerminalState::Incomplete { .. } => self.incomplete += 1,
        }
    }

    /// Total records counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.verified + self.unconfirmed + self.skipped + self.failed + self.incomplete
    }
}

/// Every record's outcome, in input order, with per-state counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Outcomes in input order.
    pub entries: Vec<Outcome>,
    /// Counts per terminal state.
    pub counts: Counts,
}

impl BatchReport {
    /// Build a report from outcomes already in input order.
    #[must_use]
    pub fn from_outcomes(entries: Vec<Outcome>) -> Self {
        let mut counts = Counts::default();
        for entry in &entries {
            counts.add(&entry.state);
        }
        Self { entries, counts }
    }

    /// Entries that are neither verified nor skipped. Re-running these
    /// finishes the batch.
    #[must_use]
    pub fn unfinished(&self) -> Vec<&Outcome> {
        self.entries
            .iter()
            .filter(|e| !e.state.is_finished())
            .collect()
    }

    /// Whether any record failed.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.counts.failed > 0
    }

    /// The outcome for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Outcome> {
        self.entries.iter().find(|e| e.id == id)
    }
}
