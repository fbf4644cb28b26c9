//! Configuration module for viralclip.
//!
//! Handles loading and managing application settings and the Analyzer's prompt template.

mod prompt;
mod settings;

pub use prompt::AnalyzerPrompt;
pub use settings::Settings;
