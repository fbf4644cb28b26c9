//! Configuration settings for viralclip.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

/// Root configuration structure.
///
/// Loaded from a TOML file at [`Settings::default_config_path`] and merged under
/// [`Settings::default`]; every field may also be supplied as a CLI flag (see
/// `crate::cli`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Local speech model selector passed to the transcriber (e.g. a whisper.cpp
    /// model file name such as "base.en" or "small").
    pub whisper_model: String,
    /// Reject media longer than this many seconds before transcribing.
    pub max_video_duration: u32,
    /// Directory rendered clips are written to.
    pub output_dir: String,
    /// Upper bound on the number of clips returned (mirrors `MAX_SEGMENTS`; never
    /// raised above it, may be lowered).
    pub max_clips: usize,
    /// Target clip duration hint forwarded into the Analyzer prompt (seconds).
    pub clip_duration: u32,
    /// Scratch directory for extracted audio, sampled frames and partial renders.
    pub temp_dir: String,
    /// Base URL of the local LLM completion endpoint (e.g. `http://localhost:11434`).
    pub llm_base_url: String,
    /// Model name passed to `/api/generate`.
    pub llm_model: String,
    /// Analysis request timeout in seconds (default 7200s / 2h).
    pub llm_timeout: u64,
    /// Preflight "say hi" test-request timeout in seconds (default 300s).
    pub llm_test_timeout: u64,
    /// Additional retry attempts after the first failed analysis request.
    pub llm_max_retries: u32,
    /// Fixed delay between analysis retries, in seconds.
    pub llm_retry_delay: u64,
    /// Number of clips rendered concurrently (1 = sequential).
    pub render_concurrency: usize,
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Optional path to a TrueType/OpenType font for burned-in subtitles. Falls back
    /// to system font discovery (see `render::font`) when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_font: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            whisper_model: "base.en".to_string(),
            max_video_duration: 3600,
            output_dir: "~/viralclip/clips".to_string(),
            max_clips: 5,
            clip_duration: 45,
            temp_dir: "/tmp/viralclip".to_string(),
            llm_base_url: "http://localhost:11434".to_string(),
            llm_model: "llama3.1".to_string(),
            llm_timeout: 7200,
            llm_test_timeout: 300,
            llm_max_retries: 3,
            llm_retry_delay: 300,
            render_concurrency: 1,
            log_level: "info".to_string(),
            subtitle_font: None,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if `None`.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PipelineError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("viralclip")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., `~`).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.output_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_within_spec_bounds() {
        let settings = Settings::default();
        assert!(settings.max_clips <= crate::segments::MAX_SEGMENTS);
        assert_eq!(settings.llm_test_timeout, 300);
        assert_eq!(settings.llm_timeout, 7200);
    }

    #[test]
    fn test_expand_path_handles_tilde() {
        let expanded = Settings::expand_path("~/viralclip");
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
