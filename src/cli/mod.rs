//! CLI surface for viralclip.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// viralclip - turn a long-form video into a handful of subtitled vertical clips.
#[derive(Parser, Debug)]
#[command(name = "viralclip")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract clips from a video or audio file
    Run {
        /// Path to the source media file
        input: String,

        /// Directory clips are written to (overrides the configured output_dir)
        #[arg(short, long)]
        output: Option<String>,

        /// Cap the number of clips returned (overrides the configured max_clips)
        #[arg(long)]
        max_clips: Option<usize>,
    },

    /// Check system requirements (ffmpeg/ffprobe on PATH, LLM endpoint reachable)
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file if one does not already exist
    Init,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "llm_model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Show configuration file path
    Path,
}
