use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::scorer::{score, MatchResult};
use crate::segmenter::ReadingUnit;
use crate::summary::SessionSummary;
use crate::util::{percentage, std_dev};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    NotLoaded,
    Active,
    Complete,
}

/// Outcome of evaluating one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub position: usize,
    pub result: MatchResult,
    /// Cumulative accuracy after this unit
    pub accuracy: f64,
    /// Words this evaluation added to the cumulative missing set
    pub newly_missing: BTreeSet<String>,
    pub is_complete: bool,
}

/// Drives a sequence of reading units through evaluation rounds.
///
/// Match sums reset on every `load`; the missing-word set accumulates across
/// documents until `clear_missing` is called.
#[derive(Debug, Clone, Default)]
pub struct ReadingSession {
    units: Vec<ReadingUnit>,
    cursor: usize,
    cumulative_matched: usize,
    cumulative_total: usize,
    cumulative_missing: BTreeSet<String>,
    unit_recalls: Vec<f64>,
}

impl ReadingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        if self.units.is_empty() {
            SessionStatus::NotLoaded
        } else if self.cursor < self.units.len() {
            SessionStatus::Active
        } else {
            SessionStatus::Complete
        }
    }

    pub fn load(&mut self, units: Vec<ReadingUnit>) -> Result<(), SessionError> {
        self.require_not("load", SessionStatus::Active)?;
        if units.is_empty() {
            return Err(SessionError::EmptyDocument);
        }

        debug!(units = units.len(), "session loaded");
        self.units = units;
        self.cursor = 0;
        self.cumulative_matched = 0;
        self.cumulative_total = 0;
        self.unit_recalls.clear();
        Ok(())
    }

    pub fn current_unit(&self) -> Result<&ReadingUnit, SessionError> {
        self.require("read the current unit", SessionStatus::Active)?;
        Ok(&self.units[self.cursor])
    }

    /// Score `transcript` against the current unit and advance to the next one.
    ///
    /// An empty transcript is a valid input: every reference word is recorded
    /// as missing.
    pub fn evaluate(&mut self, transcript: &str) -> Result<Evaluation, SessionError> {
        self.require("evaluate", SessionStatus::Active)?;

        let position = self.cursor;
        let result = score(self.units[position].text(), transcript);

        self.cumulative_matched += result.matched_count;
        self.cumulative_total += result.total_count;
        if let Some(recall) = result.recall() {
            self.unit_recalls.push(recall);
        }

        let newly_missing: BTreeSet<String> = result
            .missing_words
            .difference(&self.cumulative_missing)
            .cloned()
            .collect();
        self.cumulative_missing.extend(newly_missing.iter().cloned());

        self.cursor += 1;
        let is_complete = self.cursor == self.units.len();
        let accuracy = self.current_accuracy();

        debug!(
            position,
            matched = result.matched_count,
            total = result.total_count,
            accuracy,
            "unit evaluated"
        );
        if is_complete {
            info!(units = self.units.len(), accuracy, "session complete");
        }

        Ok(Evaluation {
            position,
            result,
            accuracy,
            newly_missing,
            is_complete,
        })
    }

    /// Running recall over evaluated units, 0 when nothing scorable was read
    pub fn current_accuracy(&self) -> f64 {
        percentage(self.cumulative_matched, self.cumulative_total)
    }

    pub fn final_accuracy(&self) -> Result<f64, SessionError> {
        self.require("read the final accuracy", SessionStatus::Complete)?;
        Ok(self.current_accuracy())
    }

    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        self.require("summarize", SessionStatus::Complete)?;
        Ok(SessionSummary::new(
            self.units.len(),
            self.cumulative_matched,
            self.cumulative_total,
            std_dev(&self.unit_recalls).unwrap_or(0.0),
            self.cumulative_missing.len(),
        ))
    }

    pub fn clear_missing(&mut self) {
        self.cumulative_missing.clear();
    }

    /// Seed the missing set, e.g. from a previously saved word list
    pub fn extend_missing<I: IntoIterator<Item = String>>(&mut self, words: I) {
        self.cumulative_missing.extend(words);
    }

    pub fn cumulative_missing(&self) -> &BTreeSet<String> {
        &self.cumulative_missing
    }

    pub fn cumulative_matched(&self) -> usize {
        self.cumulative_matched
    }

    pub fn cumulative_total(&self) -> usize {
        self.cumulative_total
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[ReadingUnit] {
        &self.units
    }

    fn require(&self, operation: &'static str, expected: SessionStatus) -> Result<(), SessionError> {
        match self.status() {
            status if status == expected => Ok(()),
            status => Err(SessionError::InvalidState { operation, status }),
        }
    }

    fn require_not(&self, operation: &'static str, forbidden: SessionStatus) -> Result<(), SessionError> {
        match self.status() {
            status if status == forbidden => Err(SessionError::InvalidState { operation, status }),
            _ => Ok(()),
        }
    }
}
