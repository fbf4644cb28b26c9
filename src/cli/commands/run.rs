//! `viralclip run` - extract clips from a single media file.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::{Pipeline, Stage, StatusRecord};

/// Runs the full clip-extraction pipeline against `input`, reporting stage
/// progress on a spinner and printing the resulting clip index on success.
///
/// A `Ctrl-C` during the run flips the shared [`CancellationToken`], which the
/// pipeline observes between stages (SPEC_FULL.md §5's cooperative cancellation).
pub async fn run_pipeline(
    input: &str,
    output: Option<String>,
    max_clips: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Run)?;

    if let Some(output) = output {
        settings.output_dir = output;
    }
    if let Some(max_clips) = max_clips {
        settings.max_clips = max_clips.min(crate::segments::MAX_SEGMENTS);
    }

    let media_path = PathBuf::from(input);
    if !media_path.exists() {
        return Err(anyhow!("input media file not found: {}", media_path.display()));
    }

    let pipeline = Pipeline::new(settings);
    let cancel = CancellationToken::new();
    let (tx, mut rx) = watch::channel(StatusRecord {
        stage: Stage::Preparing,
        message: String::new(),
    });

    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            Output::warning("cancelling - waiting for the current stage to stop");
            ctrl_c_cancel.cancel();
        }
    });

    let spinner = Output::spinner("starting");
    let progress_spinner = spinner.clone();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let status = rx.borrow().clone();
            progress_spinner.set_message(format!("{}: {}", status.stage.label(), status.message));
        }
    });

    let result = pipeline.run(&media_path, &tx, &cancel).await;
    spinner.finish_and_clear();

    match result {
        Ok(clips) => {
            if clips.is_empty() {
                Output::warning("no clips were rendered");
            } else {
                Output::success(&format!("rendered {} clip(s)", clips.len()));
                for clip in &clips {
                    Output::list_item(&format!(
                        "[{}] {} - {} ({}s, score {:.2}) -> {}",
                        clip.clip_id, clip.start_time, clip.end_time, clip.duration_s, clip.relevance_score, clip.path
                    ));
                }
            }
            Ok(())
        }
        Err(crate::error::PipelineError::Cancelled) => {
            Output::warning("run cancelled");
            Err(anyhow!("cancelled"))
        }
        Err(e) => Err(anyhow!(e)),
    }
}
