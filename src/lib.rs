//! viralclip - automatic vertical clip extraction
//!
//! A local-first CLI tool that turns a long-form video into a handful of
//! vertically-cropped, subtitled short clips, using a local speech model for
//! transcription and a local LLM endpoint to pick the moments worth clipping.
//!
//! # Architecture
//!
//! - `config` - settings and the analyzer prompt template
//! - `transcript` - local transcription, the word-level transcript cache, and its disk cache
//! - `analyzer` - talks to the local LLM endpoint and recovers a validated JSON record
//! - `segments` - candidate validation, expansion, and final segment selection
//! - `render` - face-centred cropping, subtitle burn-in, and the ffmpeg encode
//! - `pipeline` - wires the stages together behind one entry point
//! - `index` - the structured descriptors returned to the caller
//! - `cli` - the command-line surface
//!
//! # Example
//!
//! ```rust,no_run
//! use viralclip::config::Settings;
//! use viralclip::pipeline::{Pipeline, Stage, StatusRecord};
//! use tokio::sync::watch;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings);
//!     let (tx, _rx) = watch::channel(StatusRecord { stage: Stage::Preparing, message: String::new() });
//!     let cancel = CancellationToken::new();
//!
//!     let clips = pipeline.run("input.mp4".as_ref(), &tx, &cancel).await?;
//!     println!("rendered {} clips", clips.len());
//!
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod render;
pub mod segments;
pub mod transcript;

pub use error::{PipelineError, Result};
