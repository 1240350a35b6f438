use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::subtitle::SubtitleEntry;
use super::dialogue::{Dialogue, DialogueProfile, profile_dialogues, segment};
use super::difficulty::{DifficultyAssessment, DifficultyLevel, assess};
use super::recommendation::{RecommendationSet, recommend_from};
use super::statistics::{AnalysisSummary, summarize};
use super::vocabulary::{VocabularyProfile, analyze_vocabulary_with};

/// Comprehensive analysis of one subtitle track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub subtitle_statistics: AnalysisSummary,
    pub dialogue_analysis: DialogueProfile,
    pub vocabulary_analysis: VocabularyProfile,
    pub difficulty_assessment: Option<DifficultyAssessment>,
    pub learning_recommendations: Option<RecommendationSet>,
}

/// Headline figures of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_subtitles: usize,
    pub duration: String,
    pub difficulty_level: Option<DifficultyLevel>,
    pub estimated_vocabulary_size: usize,
}

impl AnalysisReport {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            total_subtitles: self.subtitle_statistics.total_entries,
            duration: self.subtitle_statistics.total_duration_formatted.clone(),
            difficulty_level: self
                .difficulty_assessment
                .as_ref()
                .map(|assessment| assessment.overall_level),
            estimated_vocabulary_size: self.vocabulary_analysis.unique_words_count,
        }
    }
}

/// Runs every analysis stage over a decoded track with one configuration
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn segment(&self, entries: &[SubtitleEntry]) -> Vec<Dialogue> {
        segment(entries, self.config.dialogue_gap_ms)
    }

    pub fn analyze(&self, entries: &[SubtitleEntry]) -> AnalysisReport {
        debug!("Analyzing {} entries", entries.len());

        let vocabulary = analyze_vocabulary_with(entries, &self.config);

        // difficulty and recommendations need at least one entry
        let (difficulty, recommendations) = if entries.is_empty() {
            (None, None)
        } else {
            let assessment = assess(&vocabulary);
            let recommendations = recommend_from(&assessment, &vocabulary);
            (Some(assessment), Some(recommendations))
        };

        let dialogues = self.segment(entries);
        let report = AnalysisReport {
            subtitle_statistics: summarize(entries, Some(dialogues.as_slice())),
            dialogue_analysis: profile_dialogues(&dialogues),
            vocabulary_analysis: vocabulary,
            difficulty_assessment: difficulty,
            learning_recommendations: recommendations,
        };

        if let Some(level) = report.summary().difficulty_level {
            info!(
                "Analysis complete: {} entries, {} dialogues, level {}",
                entries.len(),
                dialogues.len(),
                level
            );
        }

        report
    }
}
