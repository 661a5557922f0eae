use crossterm::style::Stylize;
use itertools::Itertools;
use std::io::Write;
use tracing::warn;

use crate::config::Config;
use crate::history::{HistoryEntry, HistoryLog};
use crate::scorer::{highlight, HighlightedToken};
use crate::session::{Evaluation, ReadingSession};
use crate::stats::WordStatsDb;
use crate::summary::{accuracy_label, SessionSummary};
use crate::transcript::{TranscriptEvent, TranscriptSource};

/// Reads documents aloud unit by unit, scoring each transcript as it arrives
pub struct Practice<S: TranscriptSource, W: Write> {
    pub session: ReadingSession,
    config: Config,
    source: S,
    out: W,
    stats_db: Option<WordStatsDb>,
    history: Option<HistoryLog>,
}

impl<S: TranscriptSource, W: Write> Practice<S, W> {
    pub fn new(config: Config, source: S, out: W) -> Self {
        Self {
            session: ReadingSession::new(),
            config,
            source,
            out,
            stats_db: None,
            history: None,
        }
    }

    pub fn with_stats_db(mut self, stats_db: WordStatsDb) -> Self {
        self.stats_db = Some(stats_db);
        self
    }

    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = Some(history);
        self
    }

    pub fn stats_db(&self) -> Option<&WordStatsDb> {
        self.stats_db.as_ref()
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Practice one document to the end.
    ///
    /// Returns `None` when the transcript source quits before the last unit.
    pub fn run_document(&mut self, name: &str, text: &str) -> crate::Result<Option<SessionSummary>> {
        let units = self.config.segment_config().segment(text)?;
        self.session.load(units)?;

        let total = self.session.len();
        writeln!(self.out, "{name}: {total} units")?;

        loop {
            let unit = self.session.current_unit()?.clone();
            writeln!(self.out)?;
            writeln!(self.out, "[{}/{}] {}", unit.position() + 1, total, unit.text())?;

            let transcript = match self.source.next_event(&unit) {
                TranscriptEvent::Heard(text) => text,
                TranscriptEvent::Failed(reason) => {
                    warn!(position = unit.position(), %reason, "transcription failed");
                    String::new()
                }
                TranscriptEvent::Quit => {
                    writeln!(self.out, "Stopped at unit {} of {}", unit.position() + 1, total)?;
                    return Ok(None);
                }
            };

            let evaluation = self.session.evaluate(&transcript)?;
            let tokens = highlight(unit.text(), &transcript);
            self.report_unit(&tokens, &evaluation)?;

            if let Some(stats_db) = self.stats_db.as_mut() {
                if let Err(e) = stats_db.record_unit(unit.text(), &evaluation.result) {
                    warn!(error = %e, "failed to record word stats");
                }
            }

            if evaluation.is_complete {
                break;
            }
        }

        let summary = self.session.summary()?;
        self.report_summary(&summary)?;

        if let Some(history) = &self.history {
            if let Err(e) = history.append(&HistoryEntry::from_summary(name, &summary)) {
                warn!(path = %history.path().display(), error = %e, "failed to log session");
            }
        }

        Ok(Some(summary))
    }

    fn report_unit(&mut self, tokens: &[HighlightedToken], evaluation: &Evaluation) -> crate::Result<()> {
        let line = tokens
            .iter()
            .map(|t| self.render_token(t))
            .join(" ");
        writeln!(self.out, "  heard: {line}")?;
        writeln!(
            self.out,
            "  {}/{} words  {}",
            evaluation.result.matched_count,
            evaluation.result.total_count,
            accuracy_label(evaluation.accuracy)
        )?;
        if !evaluation.newly_missing.is_empty() {
            writeln!(
                self.out,
                "  missed: {}",
                evaluation.newly_missing.iter().join(", ")
            )?;
        }
        Ok(())
    }

    fn render_token(&self, token: &HighlightedToken) -> String {
        match (token.matched, self.config.color) {
            (true, _) => token.token.clone(),
            (false, true) => token.token.as_str().red().to_string(),
            (false, false) => format!("*{}*", token.token),
        }
    }

    fn report_summary(&mut self, summary: &SessionSummary) -> crate::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", summary.final_message())?;
        if let Some(medal) = summary.medal {
            writeln!(self.out, "Medal: {medal}")?;
        }
        writeln!(
            self.out,
            "Consistency: {:.2}  Missing words so far: {}",
            summary.consistency, summary.missing
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::ChannelTranscriptSource;
    use std::sync::mpsc;

    fn plain_config() -> Config {
        Config {
            color: false,
            ..Config::default()
        }
    }

    #[test]
    fn render_marks_unmatched_tokens_without_color() {
        let (_tx, rx) = mpsc::channel();
        let practice = Practice::new(plain_config(), ChannelTranscriptSource::new(rx), Vec::new());
        let token = HighlightedToken {
            token: "dog".into(),
            matched: false,
        };
        assert_eq!(practice.render_token(&token), "*dog*");
    }

    #[test]
    fn failed_transcription_counts_every_word_missing() {
        let (tx, rx) = mpsc::channel();
        tx.send(TranscriptEvent::Failed("timeout".into())).unwrap();

        let mut practice = Practice::new(plain_config(), ChannelTranscriptSource::new(rx), Vec::new());
        let summary = practice.run_document("doc", "Good morning").unwrap().unwrap();
        assert_eq!(summary.matched, 0);
        assert_eq!(summary.total, 2);
        assert_eq!(practice.session.cumulative_missing().len(), 2);
    }

    #[test]
    fn records_word_stats_when_enabled() {
        let (tx, rx) = mpsc::channel();
        tx.send(TranscriptEvent::Heard("good".into())).unwrap();

        let mut practice = Practice::new(plain_config(), ChannelTranscriptSource::new(rx), Vec::new())
            .with_stats_db(WordStatsDb::open_in_memory().unwrap());
        practice.run_document("doc", "Good morning").unwrap();

        let db = practice.stats_db().unwrap();
        assert_eq!(db.get_miss_rate("morning").unwrap(), 100.0);
        assert_eq!(db.get_miss_rate("good").unwrap(), 0.0);
    }

    #[test]
    fn empty_document_is_rejected() {
        let (_tx, rx) = mpsc::channel();
        let mut practice = Practice::new(plain_config(), ChannelTranscriptSource::new(rx), Vec::new());
        let err = practice.run_document("empty", "  \n ").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Session(crate::error::SessionError::EmptyDocument)
        ));
    }
}
