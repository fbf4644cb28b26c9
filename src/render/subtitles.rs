//! Time-anchored word-grouped subtitle overlays (SPEC_FULL.md §4.5).

use ab_glyph::{FontRef, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::transcript::Word;

pub const WORDS_PER_SUBTITLE: usize = 3;
const BASE_FONT_SIZE: u32 = 32;

/// A single word translated onto the clip's own timeline, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipWord {
    pub text: String,
    pub start_s: f64,
    pub end_s: f64,
}

/// A burned-in subtitle: grouped text plus the clip-relative window it should be
/// visible for.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub text: String,
    pub start_s: f64,
    pub end_s: f64,
}

/// Selects words whose timing intersects `[clip_start_ms, clip_end_ms]` and
/// translates them to clip-relative seconds, clamped to `[0, clip_duration]`.
pub fn select_words(words: &[Word], clip_start_ms: u64, clip_end_ms: u64) -> Vec<ClipWord> {
    let clip_duration_s = (clip_end_ms - clip_start_ms) as f64 / 1000.0;

    words
        .iter()
        .filter(|w| (w.start_ms as i64) < clip_end_ms as i64 && (w.end_ms as i64) > clip_start_ms as i64)
        .map(|w| {
            let start_s = (w.start_ms as i64 - clip_start_ms as i64) as f64 / 1000.0;
            let end_s = (w.end_ms as i64 - clip_start_ms as i64) as f64 / 1000.0;
            ClipWord {
                text: w.text.clone(),
                start_s: start_s.clamp(0.0, clip_duration_s),
                end_s: end_s.clamp(0.0, clip_duration_s),
            }
        })
        .collect()
}

/// Partitions selected words into contiguous groups of [`WORDS_PER_SUBTITLE`] (the
/// final group may be shorter) and drops any whose duration is `<= 0`.
pub fn group_words(words: &[ClipWord]) -> Vec<SubtitleCue> {
    words
        .chunks(WORDS_PER_SUBTITLE)
        .filter_map(|group| {
            let first = group.first()?;
            let last = group.last()?;
            if last.end_s <= first.start_s {
                return None;
            }
            Some(SubtitleCue {
                text: group.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" "),
                start_s: first.start_s,
                end_s: last.end_s,
            })
        })
        .collect()
}

/// `clamp(round(base * canvas_width / 720 * 1.5), 28, 64)`.
pub fn font_size(canvas_width: u32) -> u32 {
    let scaled = (BASE_FONT_SIZE as f64 * canvas_width as f64 / 720.0 * 1.5).round() as u32;
    scaled.clamp(28, 64)
}

/// Draws one subtitle cue into an RGBA frame. Tries a single centred line first
/// ("label"); on any rendering error (e.g. the glyph advance can't be measured)
/// falls back to a two-line wrapped render ("caption") at the same position.
pub fn draw_cue(
    frame: &mut RgbaImage,
    font: &FontRef,
    cue: &SubtitleCue,
    canvas_width: u32,
    anchor_y: i32,
) {
    let size = font_size(canvas_width);
    if draw_label(frame, font, &cue.text, canvas_width, anchor_y, size).is_err() {
        draw_caption(frame, font, &cue.text, canvas_width, anchor_y, size);
    }
}

fn draw_label(
    frame: &mut RgbaImage,
    font: &FontRef,
    text: &str,
    canvas_width: u32,
    anchor_y: i32,
    size: u32,
) -> Result<(), String> {
    let scale = PxScale::from(size as f32);
    let (text_w, _) = text_size(scale, font, text);
    if text_w == 0 {
        return Err("empty glyph layout".to_string());
    }
    let x = (canvas_width as i32 - text_w as i32) / 2;
    draw_text_mut(frame, Rgba([255, 255, 255, 255]), x, anchor_y, scale, font, text);
    Ok(())
}

fn draw_caption(frame: &mut RgbaImage, font: &FontRef, text: &str, canvas_width: u32, anchor_y: i32, size: u32) {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mid = words.len().div_ceil(2);
    let lines = [words[..mid].join(" "), words[mid..].join(" ")];
    let scale = PxScale::from(size as f32);
    let line_height = size as i32 + 4;

    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let (text_w, _) = text_size(scale, font, line);
        let x = (canvas_width as i32 - text_w as i32) / 2;
        let y = anchor_y + (i as i32) * line_height;
        draw_text_mut(frame, Rgba([255, 255, 255, 255]), x.max(0), y, scale, font, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, start_ms: u64, end_ms: u64) -> Word {
        Word { text: text.into(), start_ms, end_ms, confidence: 0.9 }
    }

    #[test]
    fn test_select_words_intersects_window_and_clamps() {
        let words = vec![
            word("before", 0, 900),
            word("inside", 1000, 2000),
            word("after", 5000, 6000),
        ];
        let selected = select_words(&words, 1000, 3000);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].text, "inside");
        assert_eq!(selected[0].start_s, 0.0);
        assert_eq!(selected[0].end_s, 1.0);
    }

    #[test]
    fn test_group_words_partitions_by_three() {
        let words: Vec<ClipWord> = (0..7)
            .map(|i| ClipWord { text: format!("w{i}"), start_s: i as f64, end_s: i as f64 + 0.5 })
            .collect();
        let groups = group_words(&words);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].text, "w0 w1 w2");
        assert_eq!(groups[2].text, "w6");
    }

    #[test]
    fn test_group_words_drops_zero_duration() {
        let words = vec![ClipWord { text: "a".into(), start_s: 1.0, end_s: 1.0 }];
        assert!(group_words(&words).is_empty());
    }

    #[test]
    fn test_font_size_clamped() {
        assert_eq!(font_size(720), 48);
        assert!(font_size(100) >= 28);
        assert!(font_size(100_000) <= 64);
    }

    #[test]
    fn test_subtitle_containment_within_clip_duration() {
        let words = vec![word("hello", 0, 500), word("there", 500, 1200)];
        let clip_duration_s = 1.0;
        let clip_words = select_words(&words, 0, (clip_duration_s * 1000.0) as u64);
        for w in &clip_words {
            assert!(w.start_s >= 0.0 && w.start_s <= w.end_s && w.end_s <= clip_duration_s);
        }
    }
}
