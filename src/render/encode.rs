//! ffprobe/ffmpeg subprocess orchestration: probing, frame sampling, and the final
//! composited encode. Mirrors the teacher's `audio::downloader` subprocess idiom —
//! distinguish "tool not on PATH" from "tool failed" via the spawn error kind, and
//! surface stderr verbatim on failure.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use image::RgbImage;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};

use super::subtitles::SubtitleCue;

pub const CANVAS_WIDTH: u32 = 1080;
pub const CANVAS_HEIGHT: u32 = 1920;
pub const FOREGROUND_SIDE: u32 = 1080;
pub const FOREGROUND_Y: i64 = (CANVAS_HEIGHT as i64 - FOREGROUND_SIDE as i64) / 2; // 420
const BLUR_KERNEL: u32 = 35;
/// Grace period between SIGTERM and a hard kill on cancellation (SPEC_FULL.md §5).
const CANCEL_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    pub duration_s: f64,
}

/// Probes dimensions and duration with `ffprobe`, matching the teacher's JSON
/// `-show_format`/`-show_streams` pattern.
pub async fn probe(path: &Path) -> Result<MediaInfo> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg("-show_streams")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => return Err(PipelineError::MediaUnreadable(format!("ffprobe spawn failed: {e}"))),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::MediaUnreadable(format!("ffprobe failed: {stderr}")));
    }

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|_| PipelineError::MediaUnreadable("invalid ffprobe output".into()))?;

    let duration_s = json["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| PipelineError::MediaUnreadable("ffprobe: no duration".into()))?;

    let video_stream = json["streams"]
        .as_array()
        .and_then(|streams| streams.iter().find(|s| s["codec_type"] == "video"))
        .ok_or_else(|| PipelineError::MediaUnreadable("ffprobe: no video stream".into()))?;

    let width = video_stream["width"].as_u64().unwrap_or(0) as u32;
    let height = video_stream["height"].as_u64().unwrap_or(0) as u32;
    if width == 0 || height == 0 {
        return Err(PipelineError::MediaUnreadable("ffprobe: missing dimensions".into()));
    }

    Ok(MediaInfo { width, height, duration_s })
}

/// Extracts a single frame at timestamp `t` (seconds), decoded in-memory via PNG over
/// a pipe — no intermediate files.
pub async fn sample_frame(path: &Path, t: f64) -> Result<RgbImage> {
    let output = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", t))
        .arg("-i").arg(path)
        .arg("-frames:v").arg("1")
        .arg("-f").arg("image2pipe")
        .arg("-vcodec").arg("png")
        .arg("-loglevel").arg("error")
        .arg("-")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::ToolNotFound("ffmpeg".into()),
            _ => PipelineError::MediaUnreadable(format!("ffmpeg frame sample failed: {e}")),
        })?;

    if !output.status.success() || output.stdout.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::MediaUnreadable(format!("could not sample frame at {t:.1}s: {stderr}")));
    }

    let image = image::load_from_memory(&output.stdout)
        .map_err(|e| PipelineError::MediaUnreadable(format!("could not decode sampled frame: {e}")))?;

    Ok(image.to_rgb8())
}

/// `ceil(duration / 0.5)` evenly spaced samples plus the midpoint, per SPEC_FULL.md §4.4.
pub fn sample_times(start_s: f64, end_s: f64) -> Vec<f64> {
    let duration = (end_s - start_s).max(0.0);
    let count = (duration / 0.5).ceil().max(1.0) as usize;

    let mut times: Vec<f64> = (0..=count)
        .map(|i| start_s + duration * (i as f64 / count as f64))
        .collect();
    times.push(start_s + duration / 2.0);
    times
}

/// Builds and runs the final composited encode: blurred 1080x1920 background, a
/// face-centred 1080x1080 foreground square, and one overlay input per burned-in
/// subtitle cue. Encoding parameters match SPEC_FULL.md §4.4 exactly.
#[allow(clippy::too_many_arguments)]
pub async fn render_clip(
    source: &Path,
    output: &Path,
    start_s: f64,
    end_s: f64,
    crop_x: i64,
    crop_y: i64,
    crop_side: i64,
    subtitle_pngs: &[(PathBuf, SubtitleCue)],
    cancel: &CancellationToken,
) -> Result<()> {
    let duration = end_s - start_s;
    let sigma = BLUR_KERNEL as f64 / 6.0;

    let mut filter = String::new();
    filter.push_str(&format!(
        "[0:v]trim=start={start_s:.3}:end={end_s:.3},setpts=PTS-STARTPTS,scale={CANVAS_WIDTH}:{CANVAS_HEIGHT},gblur=sigma={sigma:.3}[bg];"
    ));
    filter.push_str(&format!(
        "[0:v]trim=start={start_s:.3}:end={end_s:.3},setpts=PTS-STARTPTS,crop={crop_side}:{crop_side}:{crop_x}:{crop_y},scale={FOREGROUND_SIDE}:{FOREGROUND_SIDE}[fg];"
    ));
    filter.push_str(&format!(
        "[0:a]atrim=start={start_s:.3}:end={end_s:.3},asetpts=PTS-STARTPTS[aout];"
    ));
    filter.push_str(&format!("[bg][fg]overlay=0:{FOREGROUND_Y}[v0];"));

    let mut last_label = "v0".to_string();
    for (i, (_, cue)) in subtitle_pngs.iter().enumerate() {
        let next_label = format!("v{}", i + 1);
        filter.push_str(&format!(
            "[{last_label}][{input}:v]overlay=0:0:enable='between(t,{start:.3},{end:.3})'[{next_label}];",
            input = i + 1,
            start = cue.start_s,
            end = cue.end_s,
        ));
        last_label = next_label;
    }
    // Drop the trailing semicolon ffmpeg's filter parser doesn't require but tolerates poorly.
    filter.pop();

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y")
        .arg("-i").arg(source);
    for (path, _) in subtitle_pngs {
        cmd.arg("-i").arg(path);
    }
    cmd.arg("-filter_complex").arg(&filter)
        .arg("-map").arg(format!("[{last_label}]"))
        .arg("-map").arg("[aout]")
        .arg("-t").arg(format!("{duration:.3}"))
        .arg("-c:v").arg("libx264")
        .arg("-preset").arg("medium")
        .arg("-crf").arg("20")
        .arg("-pix_fmt").arg("yuv420p")
        .arg("-profile:v").arg("main")
        .arg("-level").arg("4.1")
        .arg("-c:a").arg("aac")
        .arg("-b:a").arg("256k")
        .arg("-movflags").arg("+faststart")
        .arg("-loglevel").arg("error")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("encoding clip {:?} [{start_s:.1}-{end_s:.1}]", output);

    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::ToolNotFound("ffmpeg".into()));
        }
        Err(e) => return Err(PipelineError::ClipRenderFailed(format!("ffmpeg spawn failed: {e}"))),
    };
    let mut stderr_pipe = child.stderr.take();

    let status = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            terminate(&mut child).await;
            let _ = tokio::fs::remove_file(output).await;
            return Err(PipelineError::Cancelled);
        }
        status = child.wait() => status,
    };
    let status = status.map_err(|e| PipelineError::ClipRenderFailed(format!("ffmpeg wait failed: {e}")))?;

    let mut stderr_buf = Vec::new();
    if let Some(mut pipe) = stderr_pipe.take() {
        let _ = pipe.read_to_end(&mut stderr_buf).await;
    }

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr_buf);
        warn!("ffmpeg encode failed: {stderr}");
        return Err(PipelineError::ClipRenderFailed(format!("ffmpeg encode failed: {stderr}")));
    }

    if !output.exists() {
        return Err(PipelineError::ClipRenderFailed("encoder produced no output file".into()));
    }

    Ok(())
}

/// Sends SIGTERM (unix) and gives the child [`CANCEL_GRACE`] to exit before a hard
/// kill, per SPEC_FULL.md §5's cancellation mechanics.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            unsafe {
                libc::kill(pid as i32, libc::SIGTERM);
            }
        }
    }

    if tokio::time::timeout(CANCEL_GRACE, child.wait()).await.is_err() {
        let _ = child.kill().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_times_covers_interval_and_midpoint() {
        let times = sample_times(10.0, 40.0);
        assert!(times.first().copied().unwrap() >= 10.0);
        assert!(times.last().copied().unwrap() <= 40.0 || *times.last().unwrap() == 25.0);
        assert!(times.contains(&25.0));
    }

    #[test]
    fn test_foreground_y_matches_spec_constant() {
        assert_eq!(FOREGROUND_Y, 420);
    }
}
