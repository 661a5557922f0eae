use serde::Serialize;

use crate::util::percentage;

/// Award for a finished session, by final accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn from_accuracy(accuracy: f64) -> Option<Medal> {
        if accuracy >= 83.3333 {
            Some(Medal::Gold)
        } else if accuracy >= 66.6667 {
            Some(Medal::Silver)
        } else if accuracy >= 50.0 {
            Some(Medal::Bronze)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub units: usize,
    pub matched: usize,
    pub total: usize,
    pub accuracy: f64,
    /// Standard deviation of per-unit recall; lower is steadier
    pub consistency: f64,
    /// Size of the cumulative missing-word set when the session ended
    pub missing: usize,
    pub medal: Option<Medal>,
}

impl SessionSummary {
    pub fn new(units: usize, matched: usize, total: usize, consistency: f64, missing: usize) -> Self {
        let accuracy = percentage(matched, total);
        Self {
            units,
            matched,
            total,
            accuracy,
            consistency,
            missing,
            medal: Medal::from_accuracy(accuracy),
        }
    }

    pub fn final_message(&self) -> String {
        format!("Finished! Final Accuracy: {:.2}%", self.accuracy)
    }
}

pub fn accuracy_label(accuracy: f64) -> String {
    format!("Current Accuracy: {:.2}%", accuracy)
}
