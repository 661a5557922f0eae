use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::summary::SessionSummary;
use crate::util::mean;

/// One finished session, as logged to `history.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Local>,
    pub document: String,
    pub units: usize,
    pub matched: usize,
    pub total: usize,
    pub accuracy: f64,
    pub consistency: f64,
    pub missing: usize,
}

impl HistoryEntry {
    pub fn from_summary(document: &str, summary: &SessionSummary) -> Self {
        Self {
            date: Local::now(),
            document: document.to_string(),
            units: summary.units,
            matched: summary.matched,
            total: summary.total,
            accuracy: (summary.accuracy * 100.0).round() / 100.0,
            consistency: (summary.consistency * 100.0).round() / 100.0,
            missing: summary.missing,
        }
    }
}

/// Append-only CSV log of finished sessions
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self {
            path: AppDirs::history_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &HistoryEntry) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet, we need to emit a header
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush()?;
        Ok(())
    }

    /// All logged sessions, oldest first; a missing log is empty
    pub fn load(&self) -> crate::Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut entries = Vec::new();
        for record in reader.deserialize() {
            entries.push(record?);
        }
        Ok(entries)
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryReport {
    pub sessions: usize,
    pub mean_accuracy: Option<f64>,
    pub best_accuracy: Option<f64>,
}

impl HistoryReport {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let accuracies: Vec<f64> = entries.iter().map(|e| e.accuracy).collect();
        Self {
            sessions: entries.len(),
            mean_accuracy: mean(&accuracies),
            best_accuracy: accuracies.iter().copied().reduce(f64::max),
        }
    }
}
