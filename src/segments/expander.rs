//! Deterministic regrowth of under-length candidates (SPEC_FULL.md §4.3).

use tracing::warn;

use crate::transcript::{format_timestamp, Line};

use super::{AcceptedSegment, CandidateSegment, EXPANDER_MAX_DURATION, MAX_SEGMENT_DURATION, MIN_SEGMENT_DURATION};

/// Expands each originally-rejected candidate by stitching adjacent cached `Line`s
/// starting at (or just after) the candidate's start time, continuing until the
/// minimum duration is reached. Candidates that cannot be regrown within
/// `[MIN_SEGMENT_DURATION, MAX_SEGMENT_DURATION + 2]` are discarded.
pub fn expand_rejected(rejected: &[CandidateSegment], lines: &[Line]) -> Vec<AcceptedSegment> {
    rejected
        .iter()
        .filter_map(|candidate| expand_one(candidate, lines))
        .collect()
}

fn expand_one(candidate: &CandidateSegment, lines: &[Line]) -> Option<AcceptedSegment> {
    let start_s = candidate.start_seconds()?;
    // 1-second slack accommodates timestamp drift between the LLM's rounding and the
    // cached line boundaries.
    let anchor_ms = start_s.saturating_sub(1) * 1000;

    let start_idx = lines.iter().position(|line| line.start_ms >= anchor_ms)?;

    let seed = &lines[start_idx];
    let mut end_ms = seed.end_ms;
    let mut text = seed.text.clone();
    let start_ms = seed.start_ms;

    let mut idx = start_idx + 1;
    while duration_s(start_ms, end_ms) < MIN_SEGMENT_DURATION {
        let Some(next) = lines.get(idx) else { break };
        let candidate_end = next.end_ms;
        if duration_s(start_ms, candidate_end) > MAX_SEGMENT_DURATION {
            break;
        }
        end_ms = candidate_end;
        text.push(' ');
        text.push_str(&next.text);
        idx += 1;
    }

    let duration = duration_s(start_ms, end_ms);
    if duration < MIN_SEGMENT_DURATION || duration > EXPANDER_MAX_DURATION {
        warn!(
            "expansion for candidate starting at {} produced {duration}s, outside [{MIN_SEGMENT_DURATION}, {EXPANDER_MAX_DURATION}]; dropping",
            candidate.start_time
        );
        return None;
    }

    let start_s = start_ms / 1000;
    let end_s = end_ms / 1000;

    Some(AcceptedSegment {
        start_time: format_timestamp(start_s),
        end_time: format_timestamp(end_s),
        start_s,
        end_s,
        duration_s: duration,
        text,
        relevance_score: candidate.relevance_score,
        reasoning: candidate.reasoning.clone(),
    })
}

fn duration_s(start_ms: u64, end_ms: u64) -> u64 {
    end_ms.saturating_sub(start_ms) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(start_s: u64, end_s: u64, text: &str) -> Line {
        Line {
            start_ms: start_s * 1000,
            end_ms: end_s * 1000,
            text: text.to_string(),
        }
    }

    fn candidate(start: &str, score: f64) -> CandidateSegment {
        CandidateSegment {
            start_time: start.into(),
            end_time: "00:00".into(),
            text: "short".into(),
            relevance_score: score,
            reasoning: "reason".into(),
        }
    }

    #[test]
    fn test_expansion_reaches_minimum_duration() {
        let lines = vec![
            line(0, 8, "one two three four five six seven eight"),
            line(8, 18, "nine ten eleven twelve thirteen fourteen fifteen sixteen"),
            line(18, 32, "seventeen eighteen nineteen twenty"),
        ];
        let rejected = vec![candidate("00:00", 0.8)];

        let expanded = expand_rejected(&rejected, &lines);
        assert_eq!(expanded.len(), 1);
        assert!(expanded[0].duration_s >= MIN_SEGMENT_DURATION);
        assert!(expanded[0].duration_s <= EXPANDER_MAX_DURATION);
        assert_eq!(expanded[0].relevance_score, 0.8);
    }

    #[test]
    fn test_expansion_stops_before_exceeding_max() {
        let lines = vec![
            line(0, 10, "a"),
            line(10, 70, "this single line alone exceeds max duration"),
        ];
        let rejected = vec![candidate("00:00", 0.8)];

        let expanded = expand_rejected(&rejected, &lines);
        // Appending the second line would blow past MAX_SEGMENT_DURATION, so the
        // expansion never reaches MIN_SEGMENT_DURATION and is discarded.
        assert!(expanded.is_empty());
    }

    #[test]
    fn test_no_matching_line_yields_no_expansion() {
        let lines = vec![line(100, 110, "too late")];
        let rejected = vec![candidate("00:00", 0.8)];
        assert!(expand_rejected(&rejected, &lines).is_empty());
    }
}
