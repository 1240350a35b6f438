use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisReport, AnalysisSummary, Analyzer, summarize};
use crate::config::AnalysisConfig;
use crate::error::{Result, SublingoError};
use crate::subtitle::{SubtitleEntry, SubtitleFormat, decode_bytes_with_report};
use super::{AnalysisCache, AnalysisKind, CachedAnalysis, EntryStore, SubtitleSource};

type FlightKey = (String, AnalysisKind);
type FlightMap = std::sync::Mutex<HashMap<FlightKey, Arc<Mutex<()>>>>;

/// Outcome of a subtitle fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleFetch {
    pub movie_id: String,
    pub language: String,
    /// `None` when the entries came from the store
    pub format: Option<SubtitleFormat>,
    pub entries: Vec<SubtitleEntry>,
    pub cached: bool,
    pub skipped_blocks: usize,
}

/// Outcome of a comprehensive analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieAnalysis {
    pub movie_id: String,
    pub report: AnalysisReport,
    pub cached: bool,
    pub created_at: DateTime<Utc>,
}

/// Fetch, store and analyze subtitles through injected collaborators
pub struct AnalysisService {
    source: Arc<dyn SubtitleSource>,
    entries: Arc<dyn EntryStore>,
    cache: Arc<dyn AnalysisCache>,
    analyzer: Analyzer,
    in_flight: FlightMap,
}

impl AnalysisService {
    pub fn new(
        source: Arc<dyn SubtitleSource>,
        entries: Arc<dyn EntryStore>,
        cache: Arc<dyn AnalysisCache>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            source,
            entries,
            cache,
            analyzer: Analyzer::new(config),
            in_flight: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Stored entries for `movie_id`, or freshly decoded ones from the source.
    ///
    /// With `force_refresh` the store is bypassed and overwritten.
    pub async fn fetch_subtitles(&self, movie_id: &str, language: &str, force_refresh: bool) -> Result<SubtitleFetch> {
        if movie_id.trim().is_empty() {
            return Err(SublingoError::Source("Movie identifier must not be empty".to_string()));
        }

        info!("Fetching subtitles: {} ({})", movie_id, language);

        if !force_refresh {
            let stored = self.entries.get_entries(movie_id).await?;
            if !stored.is_empty() {
                info!("Using {} stored entries for {}", stored.len(), movie_id);
                return Ok(SubtitleFetch {
                    movie_id: movie_id.to_string(),
                    language: language.to_string(),
                    format: None,
                    entries: stored,
                    cached: true,
                    skipped_blocks: 0,
                });
            }
        }

        let raw = self
            .source
            .fetch_raw(movie_id, language)
            .await?
            .ok_or_else(|| SublingoError::NotFound(format!("No subtitles for {} ({})", movie_id, language)))?;

        let decoded = decode_bytes_with_report(&raw, None)?;
        self.entries.save_entries(movie_id, &decoded.entries).await?;

        info!(
            "Stored {} entries for {} ({} blocks skipped)",
            decoded.entries.len(),
            movie_id,
            decoded.skipped.len()
        );

        Ok(SubtitleFetch {
            movie_id: movie_id.to_string(),
            language: language.to_string(),
            format: Some(decoded.format),
            skipped_blocks: decoded.skipped.len(),
            entries: decoded.entries,
            cached: false,
        })
    }

    /// Comprehensive analysis of the stored entries, served from the cache when present.
    ///
    /// Concurrent requests for the same movie compute the report once.
    pub async fn analyze(&self, movie_id: &str) -> Result<MovieAnalysis> {
        let kind = AnalysisKind::Comprehensive;
        let flight = Flight::join(&self.in_flight, (movie_id.to_string(), kind));

        let _guard = flight.gate.lock().await;
        self.analyze_locked(movie_id, kind).await
    }

    async fn analyze_locked(&self, movie_id: &str, kind: AnalysisKind) -> Result<MovieAnalysis> {
        if let Some(record) = self.cache.get(movie_id, kind).await? {
            info!("Using cached {} analysis for {}", kind, movie_id);
            return Ok(MovieAnalysis {
                movie_id: record.movie_id,
                report: record.report,
                cached: true,
                created_at: record.created_at,
            });
        }

        debug!("No cached {} analysis for {}", kind, movie_id);

        let entries = self.entries.get_entries(movie_id).await?;
        if entries.is_empty() {
            return Err(SublingoError::NotFound(format!(
                "No subtitles stored for {}; fetch them first",
                movie_id
            )));
        }

        let record = CachedAnalysis {
            movie_id: movie_id.to_string(),
            analysis_type: kind,
            report: self.analyzer.analyze(&entries),
            created_at: Utc::now(),
        };

        if let Err(e) = self.cache.put(&record).await {
            warn!("Failed to cache analysis for {}: {}", movie_id, e);
        }

        Ok(MovieAnalysis {
            movie_id: record.movie_id,
            report: record.report,
            cached: false,
            created_at: record.created_at,
        })
    }

    /// Statistics over the stored entries, including dialogue statistics
    pub async fn statistics(&self, movie_id: &str) -> Result<AnalysisSummary> {
        let entries = self.entries.get_entries(movie_id).await?;
        if entries.is_empty() {
            return Err(SublingoError::NotFound(format!("No subtitles stored for {}", movie_id)));
        }

        let dialogues = self.analyzer.segment(&entries);
        Ok(summarize(&entries, Some(dialogues.as_slice())))
    }
}

/// Membership in the single-flight gate for one key.
///
/// Dropping it (on completion or cancellation) removes the key once no other caller holds the gate.
struct Flight<'a> {
    map: &'a FlightMap,
    key: FlightKey,
    gate: Arc<Mutex<()>>,
}

impl<'a> Flight<'a> {
    fn join(map: &'a FlightMap, key: FlightKey) -> Self {
        let gate = map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_default()
            .clone();
        Self { map, key, gate }
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        // the map holds one reference and this flight the other: nobody else is waiting
        if Arc::strong_count(&self.gate) <= 2 {
            in_flight.remove(&self.key);
        }
    }
}
