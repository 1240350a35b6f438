use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::error::{Result, SublingoError};
use crate::subtitle::{SubtitleEntry, SubtitleFormat};
use super::{AnalysisCache, AnalysisKind, CachedAnalysis, EntryStore, SubtitleSource};

const ENTRIES_DIR: &str = "entries";
const ANALYSIS_DIR: &str = "analysis";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Subtitle files in a local directory, named `<id>.<lang>.<ext>` or `<id>.<ext>`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn candidates(&self, identifier: &str, language: &str) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for format in [SubtitleFormat::Srt, SubtitleFormat::WebVtt] {
            if !language.is_empty() {
                paths.push(self.root.join(format!("{}.{}.{}", identifier, language, format.extension())));
            }
        }
        for format in [SubtitleFormat::Srt, SubtitleFormat::WebVtt] {
            paths.push(self.root.join(format!("{}.{}", identifier, format.extension())));
        }
        paths
    }
}

#[async_trait]
impl SubtitleSource for DirectorySource {
    async fn fetch_raw(&self, identifier: &str, language: &str) -> Result<Option<Vec<u8>>> {
        if identifier.is_empty()
            || identifier.contains(['/', '\\'])
            || identifier.starts_with('.')
            || language.contains(['/', '\\'])
        {
            return Err(SublingoError::Source(format!("Invalid subtitle identifier: {}", identifier)));
        }

        for path in self.candidates(identifier, language) {
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    info!("Loaded subtitle file: {}", path.display());
                    return Ok(Some(bytes));
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(SublingoError::Source(format!(
                        "Failed to read {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }

        debug!("No subtitle file for {} ({}) in {}", identifier, language, self.root.display());
        Ok(None)
    }
}

/// Entries and cached analyses persisted as JSON files under a data directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entries_path(&self, identifier: &str) -> PathBuf {
        self.root
            .join(ENTRIES_DIR)
            .join(format!("{}.json", file_stem(identifier)))
    }

    fn analysis_path(&self, identifier: &str, kind: AnalysisKind) -> PathBuf {
        self.root
            .join(ANALYSIS_DIR)
            .join(format!("{}__{}.json", file_stem(identifier), kind))
    }

    /// All cached analyses, newest first
    pub async fn list_analyses(&self) -> Result<Vec<CachedAnalysis>> {
        let mut records = Vec::new();
        let dir = self.root.join(ANALYSIS_DIR);

        let mut dir_entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(records),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir_entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match read_json::<CachedAnalysis>(&path).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable analysis {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Remove every cached analysis, returning how many were removed
    pub async fn clear_analyses(&self) -> Result<u64> {
        let mut count = 0;
        if let Ok(mut entries) = tokio::fs::read_dir(self.root.join(ANALYSIS_DIR)).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json")
                    && tokio::fs::remove_file(&path).await.is_ok()
                {
                    count += 1;
                }
            }
        }
        info!("Cleared {} cached analyses", count);
        Ok(count)
    }
}

#[async_trait]
impl EntryStore for JsonFileStore {
    async fn get_entries(&self, identifier: &str) -> Result<Vec<SubtitleEntry>> {
        Ok(read_json(&self.entries_path(identifier)).await?.unwrap_or_default())
    }

    async fn save_entries(&self, identifier: &str, entries: &[SubtitleEntry]) -> Result<()> {
        let path = self.entries_path(identifier);
        write_json_atomic(&path, entries).await?;
        debug!("Saved {} entries to {}", entries.len(), path.display());
        Ok(())
    }
}

#[async_trait]
impl AnalysisCache for JsonFileStore {
    async fn get(&self, identifier: &str, kind: AnalysisKind) -> Result<Option<CachedAnalysis>> {
        let path = self.analysis_path(identifier, kind);
        match read_json::<CachedAnalysis>(&path).await {
            Ok(Some(record)) if record.movie_id != identifier || record.analysis_type != kind => {
                warn!(
                    "Ignoring cached analysis {} stored for '{}'",
                    path.display(),
                    record.movie_id
                );
                Ok(None)
            }
            Ok(record) => Ok(record),
            Err(SublingoError::Json(e)) => {
                warn!("Ignoring corrupt cached analysis {}: {}", path.display(), e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn put(&self, record: &CachedAnalysis) -> Result<()> {
        let path = self.analysis_path(&record.movie_id, record.analysis_type);
        write_json_atomic(&path, record).await?;
        debug!("Cached {} analysis for {}", record.analysis_type, record.movie_id);
        Ok(())
    }
}

/// Identifier escaped into a file name: ASCII letters, digits and `-` are kept,
/// every other byte (including `_`) becomes `_XX`, so distinct ids never share a file
fn file_stem(identifier: &str) -> String {
    let mut stem = String::with_capacity(identifier.len());
    for byte in identifier.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("_{:02X}", byte));
        }
    }
    stem
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write to a sibling temp file, then rename over the target
async fn write_json_atomic<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| SublingoError::Store(format!("No parent directory for {}", path.display())))?;
    tokio::fs::create_dir_all(parent).await?;

    let content = serde_json::to_string_pretty(value)?;
    let temp_path = path.with_extension(format!(
        "json.{}.{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    tokio::fs::write(&temp_path, content).await?;
    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(SublingoError::Store(format!(
            "Failed to replace {}: {}",
            path.display(),
            e
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;
    use assert_fs::prelude::*;
    use chrono::{Duration, Utc};

    const SRT: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello\n";
    const VTT: &str = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nBonjour\n";

    fn record(movie_id: &str, age_minutes: i64) -> CachedAnalysis {
        CachedAnalysis {
            movie_id: movie_id.to_string(),
            analysis_type: AnalysisKind::Comprehensive,
            report: Analyzer::default().analyze(&[]),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn test_directory_source_prefers_language_file() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("movie.en.srt").write_str(SRT).unwrap();
        dir.child("movie.srt").write_str("ignored").unwrap();

        let source = DirectorySource::new(dir.path());
        let bytes = source.fetch_raw("movie", "en").await.unwrap().unwrap();
        assert_eq!(bytes, SRT.as_bytes());
    }

    #[tokio::test]
    async fn test_directory_source_falls_back_to_plain_name() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("movie.vtt").write_str(VTT).unwrap();

        let source = DirectorySource::new(dir.path());
        let bytes = source.fetch_raw("movie", "fr").await.unwrap().unwrap();
        assert_eq!(bytes, VTT.as_bytes());
        assert!(source.fetch_raw("missing", "en").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_directory_source_rejects_paths() {
        let dir = assert_fs::TempDir::new().unwrap();
        let source = DirectorySource::new(dir.path());

        assert!(source.fetch_raw("../secret", "en").await.is_err());
        assert!(source.fetch_raw("", "en").await.is_err());
    }

    #[tokio::test]
    async fn test_entries_persist_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let entries = crate::subtitle::decode(SRT, None).unwrap();

        assert!(store.get_entries("tt01").await.unwrap().is_empty());
        store.save_entries("tt01", &entries).await.unwrap();

        assert!(dir.path().join("entries/tt01.json").exists());
        assert_eq!(store.get_entries("tt01").await.unwrap(), entries);

        // reopening the directory sees the same data
        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.get_entries("tt01").await.unwrap(), entries);
    }

    #[tokio::test]
    async fn test_analysis_upsert_list_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.put(&record("old", 10)).await.unwrap();
        store.put(&record("new", 0)).await.unwrap();
        store.put(&record("new", 1)).await.unwrap();

        let listed = store.list_analyses().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].movie_id, "new");
        assert_eq!(listed[1].movie_id, "old");

        assert!(store.get("old", AnalysisKind::Comprehensive).await.unwrap().is_some());
        assert_eq!(store.clear_analyses().await.unwrap(), 2);
        assert!(store.get("old", AnalysisKind::Comprehensive).await.unwrap().is_none());
        assert!(store.list_analyses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_analysis_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join(ANALYSIS_DIR)).unwrap();
        std::fs::write(dir.path().join("analysis/broken__comprehensive.json"), "{not json").unwrap();

        assert!(store.get("broken", AnalysisKind::Comprehensive).await.unwrap().is_none());
        assert!(store.list_analyses().await.unwrap().is_empty());
    }

    #[test]
    fn test_file_stem_is_filesystem_safe() {
        assert_eq!(file_stem("tt0111161"), "tt0111161");
        assert_eq!(file_stem("../a b/c"), "_2E_2E_2Fa_20b_2Fc");
        assert_eq!(file_stem("tt_01"), "tt_5F01");
        assert_ne!(file_stem("tt 01"), file_stem("tt_01"));
        assert_ne!(file_stem("a_20b"), file_stem("a b"));
    }

    #[tokio::test]
    async fn test_similar_identifiers_do_not_share_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.put(&record("tt 01", 0)).await.unwrap();
        assert!(store.get("tt_01", AnalysisKind::Comprehensive).await.unwrap().is_none());
        assert_eq!(
            store.get("tt 01", AnalysisKind::Comprehensive).await.unwrap().unwrap().movie_id,
            "tt 01"
        );

        let spaced = crate::subtitle::decode(SRT, None).unwrap();
        let underscored = crate::subtitle::decode(VTT, None).unwrap();
        store.save_entries("tt 01", &spaced).await.unwrap();
        store.save_entries("tt_01", &underscored).await.unwrap();

        assert_eq!(store.get_entries("tt 01").await.unwrap(), spaced);
        assert_eq!(store.get_entries("tt_01").await.unwrap(), underscored);
    }

    #[tokio::test]
    async fn test_record_under_another_identifier_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.put(&record("other", 0)).await.unwrap();
        std::fs::rename(
            dir.path().join("analysis/other__comprehensive.json"),
            dir.path().join("analysis/wanted__comprehensive.json"),
        )
        .unwrap();

        assert!(store.get("wanted", AnalysisKind::Comprehensive).await.unwrap().is_none());
    }
}
