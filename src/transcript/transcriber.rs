//! Local speech-to-text transcription.
//!
//! Unlike the cloud Whisper API the teacher crate called through `async-openai`, this
//! transcriber loads a local `whisper.cpp` model once per process (guarded by a
//! one-shot lock, per SPEC_FULL.md §9's "do not share the handle between concurrent
//! transcriptions... serialise calls instead") and reuses it for every request.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::error::{PipelineError, Result};

use super::model::{TranscriptCache, Word};
use super::cache;

/// Converts a media file into a word-level `TranscriptCache`.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, media_path: &Path) -> Result<TranscriptCache>;
}

/// Local whisper.cpp-backed transcriber. The model is loaded lazily on first use and
/// kept for the lifetime of the process.
pub struct WhisperTranscriber {
    model_path: PathBuf,
    context: OnceCell<Mutex<WhisperContext>>,
}

impl WhisperTranscriber {
    pub fn new(model_selector: &str) -> Self {
        Self {
            model_path: PathBuf::from(model_selector),
            context: OnceCell::new(),
        }
    }

    fn context(&self) -> Result<&Mutex<WhisperContext>> {
        self.context.get_or_try_init(|| {
            info!("Loading speech model from {:?}", self.model_path);
            WhisperContext::new_with_params(
                self.model_path.to_string_lossy().as_ref(),
                WhisperContextParameters::default(),
            )
            .map(Mutex::new)
            .map_err(|e| {
                PipelineError::TranscriptionUnavailable(format!(
                    "failed to load speech model {:?}: {e}",
                    self.model_path
                ))
            })
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(media = ?media_path))]
    async fn transcribe(&self, media_path: &Path) -> Result<TranscriptCache> {
        if let Some(cached) = cache::load_cache(media_path)? {
            info!("Using cached transcript");
            return Ok(cached);
        }

        if !media_path.exists() {
            return Err(PipelineError::MediaUnreadable(format!(
                "{:?} does not exist",
                media_path
            )));
        }

        let samples = extract_pcm16k(media_path).await?;

        let context = self.context()?;
        let words = {
            let ctx = context.lock().expect("speech model mutex poisoned");
            run_whisper(&ctx, &samples)?
        };

        let valid_words: Vec<Word> = words.into_iter().filter(|w| w.end_ms > w.start_ms).collect();

        let fingerprint = cache::fingerprint(media_path)?;
        let transcript = TranscriptCache::new(fingerprint, valid_words, Some("en".to_string()));
        cache::save_cache(media_path, &transcript)?;

        Ok(transcript)
    }
}

/// Extracts mono 16 kHz PCM f32 samples from the media file via `ffmpeg`, the format
/// `whisper-rs` requires. Mirrors the teacher's `audio::downloader` subprocess idiom:
/// distinguish "tool missing" from "tool failed" by inspecting the spawn error kind.
async fn extract_pcm16k(media_path: &Path) -> Result<Vec<f32>> {
    let result = Command::new("ffmpeg")
        .arg("-i").arg(media_path)
        .arg("-f").arg("f32le")
        .arg("-ac").arg("1")
        .arg("-ar").arg("16000")
        .arg("-loglevel").arg("error")
        .arg("-")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::ToolNotFound("ffmpeg".into()));
        }
        Err(e) => return Err(PipelineError::MediaUnreadable(format!("ffmpeg spawn failed: {e}"))),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::MediaUnreadable(format!(
            "ffmpeg could not decode audio: {stderr}"
        )));
    }

    let samples: Vec<f32> = output
        .stdout
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    if samples.is_empty() {
        return Err(PipelineError::MediaUnreadable(
            "media file contains no decodable audio".into(),
        ));
    }

    Ok(samples)
}

/// Runs whisper.cpp inference and collects per-token word-level timings.
fn run_whisper(ctx: &WhisperContext, samples: &[f32]) -> Result<Vec<Word>> {
    let mut state = ctx.create_state().map_err(|e| {
        PipelineError::TranscriptionUnavailable(format!("failed to create inference state: {e}"))
    })?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_token_timestamps(true);
    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);

    state.full(params, samples).map_err(|e| {
        PipelineError::TranscriptionUnavailable(format!("inference failed: {e}"))
    })?;

    let num_segments = state.full_n_segments().map_err(|e| {
        PipelineError::TranscriptionUnavailable(format!("failed to read segments: {e}"))
    })?;

    let mut words = Vec::new();
    for i in 0..num_segments {
        let num_tokens = state.full_n_tokens(i).unwrap_or(0);
        for t in 0..num_tokens {
            let text = state.full_get_token_text(i, t).unwrap_or_default();
            let text = text.trim();
            if text.is_empty() || text.starts_with("[_") {
                continue;
            }
            let data = match state.full_get_token_data(i, t) {
                Ok(d) => d,
                Err(_) => {
                    warn!("dropping token with no timing data: {text:?}");
                    continue;
                }
            };
            let start_ms = (data.t0.max(0) as u64) * 10;
            let end_ms = (data.t1.max(0) as u64) * 10;
            if end_ms <= start_ms {
                debug!("dropping zero-duration token: {text:?}");
                continue;
            }
            words.push(Word {
                text: text.to_string(),
                start_ms,
                end_ms,
                confidence: data.p.clamp(0.0, 1.0),
            });
        }
    }

    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcriber_trait_is_object_safe() {
        fn assert_object_safe(_: &dyn Transcriber) {}
        let t = WhisperTranscriber::new("base.en");
        assert_object_safe(&t);
    }
}
