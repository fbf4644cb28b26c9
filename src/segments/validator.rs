//! First-pass candidate validation (SPEC_FULL.md §4.3).

use tracing::warn;

use super::{AcceptedSegment, CandidateSegment, MAX_SEGMENT_DURATION, MIN_SEGMENT_DURATION};

/// Validates one candidate, applying the rejection rules in order. Returns
/// `Ok(accepted)` or `Err(reason)` describing why it was rejected; validation never
/// aborts the pipeline — callers log `Err` and skip the candidate, per §7.
pub fn validate(candidate: &CandidateSegment) -> Result<AcceptedSegment, String> {
    let word_count = candidate.text.split_whitespace().count();
    if candidate.text.trim().is_empty() || word_count < 3 {
        return Err(format!("text has fewer than 3 words: {:?}", candidate.text));
    }

    let start_s = candidate
        .start_seconds()
        .ok_or_else(|| format!("unparseable start_time: {:?}", candidate.start_time))?;
    let end_s = candidate
        .end_seconds()
        .ok_or_else(|| format!("unparseable end_time: {:?}", candidate.end_time))?;

    if end_s <= start_s {
        return Err(format!("end_time {end_s} does not exceed start_time {start_s}"));
    }

    let duration_s = end_s - start_s;
    if duration_s < MIN_SEGMENT_DURATION || duration_s > MAX_SEGMENT_DURATION {
        return Err(format!(
            "duration {duration_s}s outside [{MIN_SEGMENT_DURATION}, {MAX_SEGMENT_DURATION}]"
        ));
    }

    if !(0.0..=1.0).contains(&candidate.relevance_score) {
        return Err(format!("relevance_score {} outside [0,1]", candidate.relevance_score));
    }

    Ok(AcceptedSegment {
        start_time: candidate.start_time.clone(),
        end_time: candidate.end_time.clone(),
        start_s,
        end_s,
        duration_s,
        text: candidate.text.clone(),
        relevance_score: candidate.relevance_score,
        reasoning: candidate.reasoning.clone(),
    })
}

/// Validates all candidates, logging and discarding rejects. Returns only the
/// accepted segments; the rejected candidates (with reasons) are returned alongside
/// for the Expander to consider.
pub fn validate_all(
    candidates: Vec<CandidateSegment>,
) -> (Vec<AcceptedSegment>, Vec<CandidateSegment>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for candidate in candidates {
        match validate(&candidate) {
            Ok(seg) => accepted.push(seg),
            Err(reason) => {
                warn!("rejecting candidate segment: {reason}");
                rejected.push(candidate);
            }
        }
    }

    (accepted, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(start: &str, end: &str, text: &str, score: f64) -> CandidateSegment {
        CandidateSegment {
            start_time: start.into(),
            end_time: end.into(),
            text: text.into(),
            relevance_score: score,
            reasoning: "because".into(),
        }
    }

    #[test]
    fn test_accepts_well_formed_candidate() {
        let c = candidate("00:00", "00:45", "this is a good segment of text", 0.9);
        assert!(validate(&c).is_ok());
    }

    #[test]
    fn test_rejects_short_text() {
        let c = candidate("00:00", "00:45", "hi there", 0.9);
        assert!(validate(&c).is_err());
    }

    #[test]
    fn test_rejects_out_of_bounds_duration() {
        let too_short = candidate("00:00", "00:10", "this is a good segment of text", 0.9);
        assert!(validate(&too_short).is_err());

        let too_long = candidate("00:00", "02:00", "this is a good segment of text", 0.9);
        assert!(validate(&too_long).is_err());
    }

    #[test]
    fn test_rejects_bad_score() {
        let c = candidate("00:00", "00:45", "this is a good segment of text", 1.2);
        assert!(validate(&c).is_err());
    }

    #[test]
    fn test_rejects_unparseable_timestamps() {
        let c = candidate("soon", "00:45", "this is a good segment of text", 0.9);
        assert!(validate(&c).is_err());
    }
}
