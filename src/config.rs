use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, SublingoError};

fn default_dialogue_gap_ms() -> u64 {
    2000
}

fn default_word_frequency_limit() -> usize {
    50
}

fn default_common_words_limit() -> usize {
    20
}

fn default_rare_words_limit() -> usize {
    20
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Silence (ms) between two cues above which a new dialogue starts
    #[serde(default = "default_dialogue_gap_ms")]
    pub dialogue_gap_ms: u64,
    /// Number of words kept in the word frequency table
    #[serde(default = "default_word_frequency_limit")]
    pub word_frequency_limit: usize,
    /// Number of words reported as common
    #[serde(default = "default_common_words_limit")]
    pub common_words_limit: usize,
    /// Number of words reported as rare
    #[serde(default = "default_rare_words_limit")]
    pub rare_words_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding raw subtitle files named `<id>.<lang>.srt` or `<id>.srt`
    pub subtitle_dir: PathBuf,
    /// Language used when a fetch request does not name one
    pub default_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory for stored entries and cached analyses
    pub data_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dialogue_gap_ms: default_dialogue_gap_ms(),
            word_frequency_limit: default_word_frequency_limit(),
            common_words_limit: default_common_words_limit(),
            rare_words_limit: default_rare_words_limit(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            subtitle_dir: PathBuf::from("subtitles"),
            default_language: "en".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".sublingo/data"),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SublingoError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SublingoError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SublingoError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SublingoError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
