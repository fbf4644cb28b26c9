//! Word-level transcription, the transcript cache, and the local speech model.
//!
//! The `TranscriptCache` is the single source of truth for timing and text consumed
//! by both the Analyzer (via the formatted line-sequence) and the Renderer (via the
//! raw word stream, for subtitle word selection).

mod cache;
mod model;
mod transcriber;

pub use cache::{load_cache, save_cache, CACHE_SUFFIX};
pub use model::{format_timestamp, parse_timestamp_to_seconds, Line, TranscriptCache, Word};
pub use transcriber::{Transcriber, WhisperTranscriber};
