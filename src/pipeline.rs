//! Top-level driver: transcribe → analyze → validate/expand → render, wired together
//! behind a single entry point with stage-progress reporting and cooperative
//! cancellation (SPEC_FULL.md §5).

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::analyzer::Analyzer;
use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::index::ClipIndex;
use crate::render;
use crate::segments;
use crate::transcript::{Transcriber, WhisperTranscriber};

/// Coarse-grained stage the pipeline is currently in, published over the status
/// channel for progress UIs (SPEC_FULL.md §5's `downloading → transcribing →
/// AI analyzing → creating clips → completed|error` sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preparing,
    Transcribing,
    Analyzing,
    RenderingClips,
    Completed,
    Error,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Preparing => "preparing",
            Stage::Transcribing => "transcribing",
            Stage::Analyzing => "AI analyzing",
            Stage::RenderingClips => "creating clips",
            Stage::Completed => "completed",
            Stage::Error => "error",
        }
    }
}

/// A single status update: the current stage plus a short human-readable message.
#[derive(Debug, Clone)]
pub struct StatusRecord {
    pub stage: Stage,
    pub message: String,
}

impl StatusRecord {
    fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self { stage, message: message.into() }
    }
}

/// Orchestrates one run of the clip-extraction pipeline against a fixed
/// configuration. Cheap to construct; the transcriber lazily loads its model on
/// first use.
pub struct Pipeline {
    settings: Settings,
    transcriber: Arc<dyn Transcriber>,
    analyzer: Analyzer,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Self {
        let transcriber = Arc::new(WhisperTranscriber::new(&settings.whisper_model));
        let analyzer = Analyzer::with_config(
            settings.llm_base_url.clone(),
            settings.llm_model.clone(),
            crate::config::AnalyzerPrompt::default(),
            settings.llm_test_timeout,
            settings.llm_timeout,
            settings.llm_max_retries,
            settings.llm_retry_delay,
        );
        Self { settings, transcriber, analyzer }
    }

    /// Runs the full pipeline against `media_path`, publishing [`StatusRecord`]
    /// updates on `status_tx` as each stage begins. `cancel` is checked between
    /// stages; an already-cancelled token short-circuits before any work starts.
    #[instrument(skip(self, status_tx, cancel), fields(media = ?media_path))]
    pub async fn run(
        &self,
        media_path: &Path,
        status_tx: &watch::Sender<StatusRecord>,
        cancel: &CancellationToken,
    ) -> Result<ClipIndex> {
        let publish = |stage: Stage, message: &str| {
            let _ = status_tx.send(StatusRecord::new(stage, message));
        };

        publish(Stage::Preparing, "probing source media");
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let info = render::probe(media_path).await?;
        if info.duration_s > self.settings.max_video_duration as f64 {
            return Err(PipelineError::InvalidInput(format!(
                "media duration {:.0}s exceeds configured max_video_duration {}s",
                info.duration_s, self.settings.max_video_duration
            )));
        }

        publish(Stage::Transcribing, "transcribing audio");
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let cache = self.transcriber.transcribe(media_path).await?;
        info!("transcribed {} words", cache.words.len());

        publish(Stage::Analyzing, "asking the local model for viral segments");
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        self.analyzer.preflight().await?;
        let lines = cache.lines();
        let transcript_text = cache.formatted_lines();
        let output = self.analyzer.analyze(&transcript_text).await?;

        let analysis = segments::build_analysis(output.candidates, &lines, output.summary, output.key_topics);
        if analysis.segments.is_empty() {
            warn!("no segments survived validation or expansion");
            publish(Stage::Completed, "no qualifying segments found");
            return Ok(Vec::new());
        }
        let accepted: Vec<_> = analysis.segments.into_iter().take(self.settings.max_clips).collect();
        info!("{} segments accepted for rendering", accepted.len());

        publish(Stage::RenderingClips, "rendering clips");
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let output_dir = self.settings.output_dir();
        let temp_dir = self.settings.temp_dir();
        let index = render::render_all(
            media_path,
            &accepted,
            &cache,
            &output_dir,
            &temp_dir,
            self.settings.render_concurrency,
            self.settings.subtitle_font.as_deref(),
            cancel,
        )
        .await?;

        publish(Stage::Completed, format!("rendered {} clips", index.len()));
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels_match_spec_sequence() {
        assert_eq!(Stage::Preparing.label(), "preparing");
        assert_eq!(Stage::Transcribing.label(), "transcribing");
        assert_eq!(Stage::Analyzing.label(), "AI analyzing");
        assert_eq!(Stage::RenderingClips.label(), "creating clips");
        assert_eq!(Stage::Completed.label(), "completed");
    }

    #[tokio::test]
    async fn test_run_rejects_media_past_configured_duration_cap() {
        let mut settings = Settings::default();
        settings.max_video_duration = 1;
        let pipeline = Pipeline::new(settings);
        let (tx, _rx) = watch::channel(StatusRecord::new(Stage::Preparing, "start"));
        let cancel = CancellationToken::new();

        let result = pipeline.run(Path::new("/nonexistent/media.mp4"), &tx, &cancel).await;
        assert!(result.is_err());
    }
}
