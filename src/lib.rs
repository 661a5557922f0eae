// Library surface for the binary, integration tests and reuse.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod history;
pub mod missing_words;
pub mod practice;
pub mod scorer;
pub mod segmenter;
pub mod session;
pub mod stats;
pub mod summary;
pub mod transcript;
pub mod util;

pub use error::{Error, Result};
pub use scorer::{highlight, normalize, score, HighlightedToken, MatchResult};
pub use segmenter::{segment, split_document, ReadingUnit, SegmentConfig};
pub use session::{Evaluation, ReadingSession, SessionStatus};
