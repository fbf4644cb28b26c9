//! Core data model: `Word`, `Line`, `TranscriptCache`, and the `MM:SS` timestamp codec.

use serde::{Deserialize, Serialize};

/// Maximum number of words grouped into one `Line` before it is flushed.
pub const MAX_WORDS_PER_LINE: usize = 8;

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// A single transcribed word with millisecond timing.
///
/// Words belonging to the same media file are ordered by `start_ms` and
/// non-overlapping; this is enforced by the transcriber, not re-validated on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Word {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub confidence: f32,
}

impl Word {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    fn ends_sentence(&self) -> bool {
        self.text
            .trim_end()
            .ends_with(|c| SENTENCE_TERMINATORS.contains(&c))
    }
}

/// A derived group of up to [`MAX_WORDS_PER_LINE`] consecutive words, or fewer if a
/// sentence terminator ends the group early.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Line {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// The word-level transcript cache: one per media file, written once by the
/// transcriber and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptCache {
    /// Cheap "has this media file changed" check: `"{len}-{mtime_secs}"`.
    pub fingerprint: String,
    pub words: Vec<Word>,
    pub text: String,
    /// The word stream grouped into `Line`s (SPEC_FULL.md §4.1), persisted
    /// alongside the raw words so a cache read doesn't need to re-derive them.
    pub segments: Vec<Line>,
    pub language: Option<String>,
}

impl TranscriptCache {
    pub fn new(fingerprint: String, words: Vec<Word>, language: Option<String>) -> Self {
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let segments = group_into_lines(&words);
        Self {
            fingerprint,
            words,
            text,
            segments,
            language,
        }
    }

    /// The word stream grouped into `Line`s per SPEC_FULL.md §4.1: a line is
    /// flushed after 8 words accumulate, or immediately when a word ends in a
    /// sentence terminator. Returns the cached `segments` field rather than
    /// re-deriving it.
    pub fn lines(&self) -> Vec<Line> {
        self.segments.clone()
    }

    /// Render the `"[MM:SS - MM:SS] text"` line-sequence the Analyzer consumes.
    pub fn formatted_lines(&self) -> String {
        self.lines()
            .iter()
            .map(|line| {
                format!(
                    "[{} - {}] {}",
                    format_timestamp(line.start_ms / 1000),
                    format_timestamp(line.end_ms / 1000),
                    line.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Words missing valid timestamps are expected to already have been filtered out
/// by the caller before this is called.
fn group_into_lines(words: &[Word]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current: Vec<&Word> = Vec::new();

    for word in words {
        current.push(word);
        if current.len() >= MAX_WORDS_PER_LINE || word.ends_sentence() {
            lines.push(flush_line(&current));
            current.clear();
        }
    }

    if !current.is_empty() {
        lines.push(flush_line(&current));
    }

    lines
}

fn flush_line(words: &[&Word]) -> Line {
    let start_ms = words.first().map(|w| w.start_ms).unwrap_or(0);
    let end_ms = words.last().map(|w| w.end_ms).unwrap_or(start_ms);
    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Line {
        start_ms,
        end_ms,
        text,
    }
}

/// Format whole seconds as `MM:SS`, or `HH:MM:SS` once the hour mark is reached.
/// Integer-truncates; never rounds.
pub fn format_timestamp(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Parse `[HH:]MM:SS` into whole seconds. All components must be non-negative
/// integers; returns `None` on malformed input.
pub fn parse_timestamp_to_seconds(ts: &str) -> Option<u64> {
    let parts: Vec<&str> = ts.trim().split(':').collect();
    let values: Option<Vec<u64>> = parts.iter().map(|p| p.parse::<u64>().ok()).collect();
    let values = values?;

    match values.as_slice() {
        [m, s] => Some(m * 60 + s),
        [h, m, s] => Some(h * 3600 + m * 60 + s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, start_ms: u64, end_ms: u64) -> Word {
        Word {
            text: text.to_string(),
            start_ms,
            end_ms,
            confidence: 0.95,
        }
    }

    #[test]
    fn test_timestamp_format_and_parse_roundtrip_under_an_hour() {
        for s in [0u64, 1, 59, 60, 61, 599, 3599] {
            let formatted = format_timestamp(s);
            assert_eq!(parse_timestamp_to_seconds(&formatted), Some(s));
        }
    }

    #[test]
    fn test_timestamp_format_over_an_hour() {
        assert_eq!(format_timestamp(3665), "01:01:05");
        assert_eq!(parse_timestamp_to_seconds("01:01:05"), Some(3665));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse_timestamp_to_seconds("not-a-time"), None);
        assert_eq!(parse_timestamp_to_seconds("1:2:3:4"), None);
    }

    #[test]
    fn test_lines_flush_at_eight_words() {
        let words: Vec<Word> = (0..10)
            .map(|i| word("w", i * 100, i * 100 + 50))
            .collect();
        let cache = TranscriptCache::new("fp".into(), words, None);
        let lines = cache.lines();
        assert_eq!(lines[0].text.split_whitespace().count(), 8);
        assert_eq!(lines[1].text.split_whitespace().count(), 2);
    }

    #[test]
    fn test_lines_flush_at_sentence_terminator() {
        let words = vec![word("Hello", 0, 100), word("world.", 100, 200), word("Next", 200, 300)];
        let cache = TranscriptCache::new("fp".into(), words, None);
        let lines = cache.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Hello world.");
        assert_eq!(lines[0].end_ms, 200);
    }
}
