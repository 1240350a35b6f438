use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::subtitle::SubtitleFormat;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a subtitle file and print its entries as JSON
    Decode {
        /// Input subtitle file (.srt or .vtt)
        #[arg(short, long)]
        input: PathBuf,

        /// Force a format instead of detecting it (srt, vtt)
        #[arg(short, long)]
        format: Option<SubtitleFormat>,

        /// Write the entries as SRT to this file instead of printing JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze a subtitle file for language learners
    Analyze {
        /// Input subtitle file (.srt or .vtt)
        #[arg(short, long)]
        input: PathBuf,

        /// Force a format instead of detecting it (srt, vtt)
        #[arg(short, long)]
        format: Option<SubtitleFormat>,

        /// Silence (ms) that separates dialogues, overriding the configuration
        #[arg(long)]
        gap_ms: Option<u64>,

        /// Print only the headline summary
        #[arg(long)]
        summary: bool,
    },

    /// Analyze all subtitle files in a directory
    Batch {
        /// Input directory containing subtitle files
        #[arg(short, long)]
        input_dir: PathBuf,
    },

    /// Load subtitles for a movie from the subtitle directory into the store
    Fetch {
        /// Movie identifier, e.g. an IMDb ID
        id: String,

        /// Subtitle language (defaults to the configured language)
        #[arg(short, long)]
        language: Option<String>,

        /// Reload even when entries are already stored
        #[arg(long)]
        force: bool,
    },

    /// Comprehensive analysis of a stored movie, cached after the first run
    Report {
        /// Movie identifier
        id: String,

        /// Print entry statistics of the stored subtitles instead
        #[arg(long)]
        stats: bool,
    },

    /// Manage cached analyses
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// List cached analyses
    List,

    /// Clear all cached analyses
    Clear,
}
