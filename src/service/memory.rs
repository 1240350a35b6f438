use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::subtitle::SubtitleEntry;
use super::{AnalysisCache, AnalysisKind, CachedAnalysis, EntryStore};

/// In-process entry store and analysis cache
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<SubtitleEntry>>>,
    analyses: RwLock<HashMap<(String, AnalysisKind), CachedAnalysis>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn analysis_count(&self) -> usize {
        self.analyses.read().await.len()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn get_entries(&self, identifier: &str) -> Result<Vec<SubtitleEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .get(identifier)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_entries(&self, identifier: &str, entries: &[SubtitleEntry]) -> Result<()> {
        debug!("Storing {} entries for {}", entries.len(), identifier);
        self.entries
            .write()
            .await
            .insert(identifier.to_string(), entries.to_vec());
        Ok(())
    }
}

#[async_trait]
impl AnalysisCache for MemoryStore {
    async fn get(&self, identifier: &str, kind: AnalysisKind) -> Result<Option<CachedAnalysis>> {
        Ok(self
            .analyses
            .read()
            .await
            .get(&(identifier.to_string(), kind))
            .cloned())
    }

    async fn put(&self, record: &CachedAnalysis) -> Result<()> {
        self.analyses
            .write()
            .await
            .insert((record.movie_id.clone(), record.analysis_type), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;
    use chrono::Utc;

    fn entry(index: u32, text: &str) -> SubtitleEntry {
        SubtitleEntry {
            index,
            start_time: "00:00:01,000".to_string(),
            end_time: "00:00:02,000".to_string(),
            start_ms: 1_000,
            end_ms: 2_000,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_entries_round_trip_and_replace() {
        let store = MemoryStore::new();
        assert!(store.get_entries("movie").await.unwrap().is_empty());

        store.save_entries("movie", &[entry(1, "a"), entry(2, "b")]).await.unwrap();
        assert_eq!(store.get_entries("movie").await.unwrap().len(), 2);

        store.save_entries("movie", &[entry(1, "c")]).await.unwrap();
        let entries = store.get_entries("movie").await.unwrap();
        assert_eq!(entries, vec![entry(1, "c")]);
    }

    #[tokio::test]
    async fn test_put_is_an_upsert() {
        let store = MemoryStore::new();
        let mut record = CachedAnalysis {
            movie_id: "movie".to_string(),
            analysis_type: AnalysisKind::Comprehensive,
            report: Analyzer::default().analyze(&[]),
            created_at: Utc::now(),
        };

        store.put(&record).await.unwrap();
        record.report = Analyzer::default().analyze(&[entry(1, "hello")]);
        store.put(&record).await.unwrap();

        assert_eq!(store.analysis_count().await, 1);
        let cached = store.get("movie", AnalysisKind::Comprehensive).await.unwrap().unwrap();
        assert_eq!(cached.report.subtitle_statistics.total_entries, 1);
        assert!(store.get("other", AnalysisKind::Comprehensive).await.unwrap().is_none());
    }
}
