use std::io::BufRead;
use std::sync::mpsc::Receiver;

use crate::segmenter::ReadingUnit;

pub const QUIT_COMMAND: &str = ":q";

/// What the speech-to-text side produced for one unit
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranscriptEvent {
    Heard(String),
    /// Recognition failed; scored as an empty transcript
    Failed(String),
    Quit,
}

/// Source of transcripts for the unit currently being read
pub trait TranscriptSource {
    fn next_event(&mut self, unit: &ReadingUnit) -> TranscriptEvent;
}

/// One transcript per input line, e.g. piped from an external recogniser
pub struct LineTranscriptSource<R: BufRead> {
    reader: R,
}

impl<R: BufRead> LineTranscriptSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> TranscriptSource for LineTranscriptSource<R> {
    fn next_event(&mut self, _unit: &ReadingUnit) -> TranscriptEvent {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => TranscriptEvent::Quit,
            Ok(_) => {
                let line = line.trim_end_matches(['\r', '\n']);
                if line.trim() == QUIT_COMMAND {
                    TranscriptEvent::Quit
                } else {
                    TranscriptEvent::Heard(line.to_string())
                }
            }
            Err(e) => TranscriptEvent::Failed(e.to_string()),
        }
    }
}

/// Channel-fed source for headless drivers and tests
pub struct ChannelTranscriptSource {
    rx: Receiver<TranscriptEvent>,
}

impl ChannelTranscriptSource {
    pub fn new(rx: Receiver<TranscriptEvent>) -> Self {
        Self { rx }
    }
}

impl TranscriptSource for ChannelTranscriptSource {
    fn next_event(&mut self, _unit: &ReadingUnit) -> TranscriptEvent {
        self.rx.recv().unwrap_or(TranscriptEvent::Quit)
    }
}
