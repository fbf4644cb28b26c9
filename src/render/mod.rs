//! Per-segment clip rendering: face-centred cropping, blurred-background composition,
//! and burned-in subtitles (SPEC_FULL.md §4.4, §4.5).

mod crop;
mod encode;
mod faces;
mod font;
pub mod subtitles;

use std::path::{Path, PathBuf};

use ab_glyph::FontRef;
use futures::stream::{self, StreamExt};
use image::{Rgba, RgbaImage};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::index::{ClipIndex, ClipRecord};
use crate::segments::AcceptedSegment;
use crate::transcript::TranscriptCache;

pub use encode::{probe, MediaInfo, CANVAS_HEIGHT, CANVAS_WIDTH};

/// Renders every accepted segment into an independent clip file. Per-clip failures
/// are logged and the clip is simply absent from the returned index — renderer
/// failures never abort the remaining clips. A cancelled `cancel` token is the one
/// exception: it propagates as `Err(PipelineError::Cancelled)` once observed, per
/// SPEC_FULL.md §5's "Cancelled | Any | Propagates" row.
#[allow(clippy::too_many_arguments)]
pub async fn render_all(
    source: &Path,
    segments: &[AcceptedSegment],
    cache: &TranscriptCache,
    output_dir: &Path,
    temp_dir: &Path,
    concurrency: usize,
    font_path: Option<&str>,
    cancel: &CancellationToken,
) -> Result<ClipIndex> {
    std::fs::create_dir_all(output_dir)?;
    std::fs::create_dir_all(temp_dir)?;

    let info = encode::probe(source).await?;
    let font = font::load_font(font_path)?;

    let results: Vec<Option<ClipRecord>> = stream::iter(segments.iter().enumerate())
        .map(|(idx, segment)| {
            let clip_id = (idx + 1) as u32;
            let font = &font;
            async move {
                match render_segment(source, &info, segment, cache, clip_id, output_dir, temp_dir, font, cancel).await
                {
                    Ok(record) => Some(record),
                    Err(PipelineError::Cancelled) => {
                        warn!("clip {clip_id} cancelled");
                        None
                    }
                    Err(e) => {
                        warn!("clip {clip_id} failed to render: {e}");
                        None
                    }
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let cancelled = cancel.is_cancelled();

    let mut index: ClipIndex = results.into_iter().flatten().collect();
    index.sort_by_key(|c| c.clip_id);

    if cancelled {
        return Err(PipelineError::Cancelled);
    }
    Ok(index)
}

#[allow(clippy::too_many_arguments)]
async fn render_segment(
    source: &Path,
    info: &MediaInfo,
    segment: &AcceptedSegment,
    cache: &TranscriptCache,
    clip_id: u32,
    output_dir: &Path,
    temp_dir: &Path,
    font: &FontRef<'_>,
    cancel: &CancellationToken,
) -> Result<ClipRecord> {
    if segment.start_s as f64 >= info.duration_s {
        return Err(PipelineError::ClipRenderFailed(format!(
            "segment start {}s is beyond source duration {:.1}s",
            segment.start_s, info.duration_s
        )));
    }
    let clamped_end_s = (segment.end_s as f64).min(info.duration_s);
    let start_s = segment.start_s as f64;

    let (crop_x, crop_y, side) = detect_crop(source, info, start_s, clamped_end_s).await;

    let clip_start_ms = segment.start_s * 1000;
    let clip_end_ms = (clamped_end_s * 1000.0) as u64;
    let clip_words = subtitles::select_words(&cache.words, clip_start_ms, clip_end_ms);
    let cues = subtitles::group_words(&clip_words);

    let subtitle_pngs = render_subtitle_pngs(&cues, font, temp_dir, clip_id)?;

    let filename = format!("clip_{clip_id:03}.mp4");
    let output_path = output_dir.join(&filename);

    encode::render_clip(source, &output_path, start_s, clamped_end_s, crop_x, crop_y, side, &subtitle_pngs, cancel)
        .await?;

    for (path, _) in &subtitle_pngs {
        let _ = std::fs::remove_file(path);
    }

    info!("rendered clip {clip_id} -> {:?}", output_path);

    Ok(ClipRecord {
        clip_id,
        filename,
        path: output_path.to_string_lossy().to_string(),
        start_time: segment.start_time.clone(),
        end_time: segment.end_time.clone(),
        duration_s: clamped_end_s as u64 - segment.start_s,
        text: segment.text.clone(),
        relevance_score: segment.relevance_score,
        reasoning: segment.reasoning.clone(),
    })
}

/// Samples frames across the segment, runs primary/fallback face detection on each,
/// filters by area ratio and outliers, and returns the weighted-centroid crop origin
/// (falling back to frame centre when nothing survives).
async fn detect_crop(source: &Path, info: &MediaInfo, start_s: f64, end_s: f64) -> (i64, i64, i64) {
    let side = crop::square_side(info.width, info.height);
    let frame_area = (info.width * info.height) as f64;

    let mut detections = Vec::new();
    for t in encode::sample_times(start_s, end_s) {
        match encode::sample_frame(source, t).await {
            Ok(frame) => detections.extend(faces::detect(&frame)),
            Err(e) => warn!("could not sample frame at {t:.1}s for crop detection: {e}"),
        }
    }

    let detections = faces::filter_by_area_ratio(detections, frame_area);
    let detections = faces::filter_outliers(detections);

    let (cx, cy) = faces::weighted_centroid(&detections)
        .unwrap_or((info.width as f64 / 2.0, info.height as f64 / 2.0));

    let (x, y) = crop::crop_origin(cx, cy, side, info.width, info.height);
    (x, y, side)
}

fn render_subtitle_pngs(
    cues: &[subtitles::SubtitleCue],
    font: &FontRef<'_>,
    temp_dir: &Path,
    clip_id: u32,
) -> Result<Vec<(PathBuf, subtitles::SubtitleCue)>> {
    // Bottom of the foreground square minus 80px (SPEC_FULL.md §4.4).
    let anchor_y = encode::FOREGROUND_Y as i32 + encode::FOREGROUND_SIDE as i32 - 80;

    let mut rendered = Vec::with_capacity(cues.len());
    for (i, cue) in cues.iter().enumerate() {
        let mut frame = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgba([0, 0, 0, 0]));
        subtitles::draw_cue(&mut frame, font, cue, CANVAS_WIDTH, anchor_y);

        let path = temp_dir.join(format!("clip_{clip_id:03}_sub_{i:03}.png"));
        frame
            .save(&path)
            .map_err(|e| PipelineError::ClipRenderFailed(format!("could not write subtitle overlay: {e}")))?;
        rendered.push((path, cue.clone()));
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Word;

    fn cache_with_words() -> TranscriptCache {
        let words = vec![
            Word { text: "Hello".into(), start_ms: 0, end_ms: 300, confidence: 0.9 },
            Word { text: "there".into(), start_ms: 300, end_ms: 600, confidence: 0.9 },
        ];
        TranscriptCache::new("fp".into(), words, Some("en".into()))
    }

    #[test]
    fn test_subtitle_pngs_are_emitted_per_cue() {
        let cache = cache_with_words();
        let words = subtitles::select_words(&cache.words, 0, 1000);
        let cues = subtitles::group_words(&words);
        assert_eq!(cues.len(), 1);
    }
}
