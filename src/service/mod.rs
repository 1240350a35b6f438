// Service layer around the pure analysis core
//
// - SubtitleSource: where raw subtitle bytes come from
// - EntryStore: decoded entries per movie identifier
// - AnalysisCache: cached comprehensive analyses
// - AnalysisService: fetch/analyze flows wired over the three collaborators

pub mod fs;
pub mod memory;
pub mod pipeline;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use fs::{DirectorySource, JsonFileStore};
pub use memory::MemoryStore;
pub use pipeline::{AnalysisService, MovieAnalysis, SubtitleFetch};

use crate::analysis::AnalysisReport;
use crate::config::Config;
use crate::error::{Result, SublingoError};
use crate::subtitle::SubtitleEntry;

/// Provides raw subtitle files for a movie
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubtitleSource: Send + Sync {
    /// Raw bytes of the subtitle file, or `None` when the source has nothing
    async fn fetch_raw(&self, identifier: &str, language: &str) -> Result<Option<Vec<u8>>>;
}

/// Persists decoded entries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Stored entries in index order; empty when nothing is stored
    async fn get_entries(&self, identifier: &str) -> Result<Vec<SubtitleEntry>>;

    /// Replace the stored entries for an identifier
    async fn save_entries(&self, identifier: &str, entries: &[SubtitleEntry]) -> Result<()>;
}

/// Persists analysis results keyed by `(movie_id, analysis_type)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisCache: Send + Sync {
    async fn get(&self, identifier: &str, kind: AnalysisKind) -> Result<Option<CachedAnalysis>>;

    /// Insert or replace the record for its key
    async fn put(&self, record: &CachedAnalysis) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Comprehensive,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comprehensive => "comprehensive",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = SublingoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "comprehensive" => Ok(Self::Comprehensive),
            other => Err(SublingoError::Config(format!("Unknown analysis type: {}", other))),
        }
    }
}

/// One cached analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAnalysis {
    pub movie_id: String,
    pub analysis_type: AnalysisKind,
    pub report: AnalysisReport,
    pub created_at: DateTime<Utc>,
}

/// Build the file-backed service described by a configuration
pub fn create_service(config: &Config) -> (AnalysisService, Arc<JsonFileStore>) {
    let store = Arc::new(JsonFileStore::new(&config.store.data_dir));
    let source = Arc::new(DirectorySource::new(&config.source.subtitle_dir));
    let service = AnalysisService::new(
        source,
        store.clone(),
        store.clone(),
        config.analysis.clone(),
    );
    (service, store)
}
