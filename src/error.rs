//! Error types for viralclip.

use thiserror::Error;

/// Library-level error type for the clip-extraction pipeline.
///
/// Variants map to the recovery policy documented in SPEC_FULL.md §7: `MediaUnreadable`,
/// `TranscriptionUnavailable`, `LLMUnreachable`, `LLMTimeout` and `LLMBadResponse` are
/// fatal for the request; `SegmentInvalid`, `ExpansionFailed` and `ClipRenderFailed` are
/// local to a candidate or clip and are logged and skipped rather than propagated.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media file could not be read: {0}")]
    MediaUnreadable(String),

    #[error("Transcription backend unavailable: {0}")]
    TranscriptionUnavailable(String),

    #[error("LLM endpoint unreachable: {0}")]
    LLMUnreachable(String),

    #[error("LLM request timed out: {0}")]
    LLMTimeout(String),

    #[error("Could not recover a JSON object from the LLM response: {0}")]
    LLMBadResponse(String),

    #[error("Candidate segment rejected: {0}")]
    SegmentInvalid(String),

    #[error("Segment expansion failed: {0}")]
    ExpansionFailed(String),

    #[error("Clip render failed: {0}")]
    ClipRenderFailed(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
