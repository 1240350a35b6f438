use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::analysis::{AnalysisReport, Analyzer};
use crate::config::Config;
use crate::error::{Result, SublingoError};
use crate::subtitle::{Decoded, SubtitleFormat, decode_bytes_with_report, write_srt};

const SUBTITLE_EXTENSIONS: [&str; 2] = ["srt", "vtt"];

/// Decoded and analyzed subtitle file
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub decoded: Decoded,
    pub report: AnalysisReport,
}

/// Result for one file of a directory run
#[derive(Debug)]
pub struct BatchItem {
    pub path: PathBuf,
    pub outcome: Result<FileReport>,
}

/// File-level operations: decode, convert and analyze subtitle files on disk
pub struct Workflow {
    analyzer: Analyzer,
}

impl Workflow {
    pub fn new(config: &Config) -> Self {
        Self {
            analyzer: Analyzer::new(config.analysis.clone()),
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Read and decode a subtitle file
    pub async fn decode_file<P: AsRef<Path>>(&self, input_path: P, format: Option<SubtitleFormat>) -> Result<Decoded> {
        let input_path = input_path.as_ref();
        info!("Decoding subtitle file: {}", input_path.display());

        if !input_path.is_file() {
            return Err(SublingoError::NotFound(input_path.display().to_string()));
        }

        let bytes = fs::read(input_path).await?;
        decode_bytes_with_report(&bytes, format)
    }

    /// Decode a subtitle file and write it back out as SRT
    pub async fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
        format: Option<SubtitleFormat>,
    ) -> Result<Decoded> {
        let output_path = output_path.as_ref();
        let decoded = self.decode_file(input_path, format).await?;

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        write_srt(&decoded.entries, output_path).await?;
        Ok(decoded)
    }

    pub async fn analyze_file<P: AsRef<Path>>(&self, input_path: P, format: Option<SubtitleFormat>) -> Result<FileReport> {
        let input_path = input_path.as_ref();
        let decoded = self.decode_file(input_path, format).await?;
        let report = self.analyzer.analyze(&decoded.entries);

        Ok(FileReport {
            path: input_path.to_path_buf(),
            decoded,
            report,
        })
    }

    /// Analyze every `.srt` and `.vtt` file below a directory
    pub async fn process_directory<P: AsRef<Path>>(&self, input_dir: P) -> Result<Vec<BatchItem>> {
        let input_dir = input_dir.as_ref();
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(SublingoError::Config(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        let mut subtitle_files: Vec<PathBuf> = WalkDir::new(input_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_subtitle_file(path))
            .collect();
        subtitle_files.sort();

        info!("Found {} subtitle files to analyze", subtitle_files.len());

        let mut items = Vec::with_capacity(subtitle_files.len());
        for path in subtitle_files {
            let outcome = self.analyze_file(&path, None).await;
            match &outcome {
                Ok(_) => info!("Analyzed: {}", path.display()),
                Err(e) => warn!("Failed to analyze {}: {}", path.display(), e),
            }
            items.push(BatchItem { path, outcome });
        }

        Ok(items)
    }
}

fn is_subtitle_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUBTITLE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
