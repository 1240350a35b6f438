use serde::{Deserialize, Serialize};
use std::fmt;

use crate::subtitle::SubtitleEntry;
use super::vocabulary::{VocabularyProfile, analyze_vocabulary};

/// Clip length the pacing estimate assumes, whatever the real duration is
const ASSUMED_CLIP_MINUTES: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DifficultyLevel {
    Beginner,
    #[serde(rename = "Beginner-High")]
    BeginnerHigh,
    Intermediate,
    #[serde(rename = "Intermediate-High")]
    IntermediateHigh,
    Advanced,
}

impl DifficultyLevel {
    /// Map a 0-100 score to its tier, lower bounds inclusive
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Self::Advanced,
            60..=79 => Self::IntermediateHigh,
            40..=59 => Self::Intermediate,
            20..=39 => Self::BeginnerHigh,
            _ => Self::Beginner,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::BeginnerHigh => "Beginner-High",
            Self::Intermediate => "Intermediate",
            Self::IntermediateHigh => "Intermediate-High",
            Self::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocabularyComplexity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakingSpeed {
    Slow,
    Medium,
    Fast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentComplexity {
    Simple,
    Moderate,
    Complex,
}

/// Points awarded by each factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub word_length: u32,
    pub diversity: u32,
    pub pacing: u32,
    pub rare_words: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.word_length + self.diversity + self.pacing + self.rare_words
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyAssessment {
    pub overall_score: u32,
    pub overall_level: DifficultyLevel,
    pub vocabulary_complexity: VocabularyComplexity,
    pub speaking_speed: SpeakingSpeed,
    pub content_complexity: ContentComplexity,
    pub words_per_minute: f64,
    pub rare_word_ratio: f64,
    pub breakdown: ScoreBreakdown,
}

/// Estimated words per minute.
///
/// Treats every clip as exactly ten minutes long; swap in the real duration here to
/// get a true speaking rate.
pub fn pacing_words_per_minute(total_words: usize) -> f64 {
    total_words as f64 / ASSUMED_CLIP_MINUTES
}

/// Score the difficulty of a set of entries. `None` when there is nothing to score.
pub fn score_difficulty(entries: &[SubtitleEntry]) -> Option<DifficultyAssessment> {
    if entries.is_empty() {
        return None;
    }
    Some(assess(&analyze_vocabulary(entries)))
}

/// Combine vocabulary signals into a 0-100 score and its tier
pub fn assess(profile: &VocabularyProfile) -> DifficultyAssessment {
    let words_per_minute = pacing_words_per_minute(profile.total_words);
    let rare_word_ratio = if profile.unique_words_count > 0 {
        profile.rare_words.len() as f64 / profile.unique_words_count as f64
    } else {
        0.0
    };

    let vocabulary_complexity = match profile.average_word_length {
        len if len > 5.0 => VocabularyComplexity::High,
        len if len > 4.0 => VocabularyComplexity::Medium,
        _ => VocabularyComplexity::Low,
    };

    let speaking_speed = match words_per_minute {
        wpm if wpm > 15.0 => SpeakingSpeed::Fast,
        wpm if wpm > 10.0 => SpeakingSpeed::Medium,
        _ => SpeakingSpeed::Slow,
    };

    let content_complexity = match rare_word_ratio {
        ratio if ratio > 0.3 => ContentComplexity::Complex,
        ratio if ratio > 0.2 => ContentComplexity::Moderate,
        _ => ContentComplexity::Simple,
    };

    let diversity = match profile.vocabulary_diversity {
        d if d > 0.7 => 25,
        d if d > 0.5 => 15,
        _ => 5,
    };

    let breakdown = ScoreBreakdown {
        word_length: match vocabulary_complexity {
            VocabularyComplexity::High => 30,
            VocabularyComplexity::Medium => 20,
            VocabularyComplexity::Low => 10,
        },
        diversity,
        pacing: match speaking_speed {
            SpeakingSpeed::Fast => 25,
            SpeakingSpeed::Medium => 15,
            SpeakingSpeed::Slow => 5,
        },
        rare_words: match content_complexity {
            ContentComplexity::Complex => 20,
            ContentComplexity::Moderate => 15,
            ContentComplexity::Simple => 10,
        },
    };

    let overall_score = breakdown.total();

    DifficultyAssessment {
        overall_score,
        overall_level: DifficultyLevel::from_score(overall_score),
        vocabulary_complexity,
        speaking_speed,
        content_complexity,
        words_per_minute,
        rare_word_ratio,
        breakdown,
    }
}
