use thiserror::Error;

use crate::session::SessionStatus;

/// Errors emitted while splitting a document into reading units.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SegmentError {
    #[error("max length must be greater than zero")]
    ZeroMaxLength,
    #[error("separator list contains an empty separator")]
    EmptySeparator,
}

/// Errors emitted by `ReadingSession`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("document produced no reading units")]
    EmptyDocument,
    #[error("cannot {operation} while session is {status}")]
    InvalidState {
        operation: &'static str,
        status: SessionStatus,
    },
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Segment(#[from] SegmentError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Stats(#[from] rusqlite::Error),
    #[error(transparent)]
    History(#[from] csv::Error),
    #[error(transparent)]
    Config(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
