use serde::{Deserialize, Serialize};

use crate::subtitle::SubtitleEntry;
use super::difficulty::{DifficultyAssessment, DifficultyLevel, assess};
use super::vocabulary::{VocabularyProfile, analyze_vocabulary};

const LARGE_RARE_VOCABULARY: usize = 50;
const HIGH_DIVERSITY: f64 = 0.8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub suitable_for: Vec<String>,
    pub learning_focus: Vec<String>,
    pub study_tips: Vec<String>,
    pub estimated_study_time: String,
    pub prerequisite_level: String,
}

struct Template {
    suitable_for: &'static [&'static str],
    learning_focus: &'static [&'static str],
    study_tips: &'static [&'static str],
    estimated_study_time: &'static str,
    prerequisite_level: &'static str,
}

static BEGINNER: Template = Template {
    suitable_for: &["Beginners", "Learners building basic English"],
    learning_focus: &["Basic vocabulary", "Simple sentence patterns", "Everyday conversation"],
    study_tips: &[
        "Watch once with native-language subtitles to follow the story",
        "Rewatch and note the most frequent words",
        "Shadow the simple dialogues out loud",
    ],
    estimated_study_time: "2-3 weeks",
    prerequisite_level: "A1-A2",
};

static INTERMEDIATE: Template = Template {
    suitable_for: &["Intermediate learners", "Learners moving past the basics"],
    learning_focus: &["Spoken expression", "Slang and idioms", "Connected speech"],
    study_tips: &[
        "Pay attention to tone and emotion",
        "Follow the natural rhythm of conversation",
        "Practice understanding different accents",
    ],
    estimated_study_time: "3-4 weeks",
    prerequisite_level: "B1-B2",
};

static ADVANCED: Template = Template {
    suitable_for: &["Advanced learners", "Near-native speakers"],
    learning_focus: &["Cultural background", "Specialized vocabulary", "Subtle shades of meaning"],
    study_tips: &[
        "Research the cultural references",
        "Analyze the subtleties of word choice",
        "Practice interpreting scenes in real time",
    ],
    estimated_study_time: "4-6 weeks",
    prerequisite_level: "C1-C2",
};

impl Template {
    fn for_level(level: DifficultyLevel) -> &'static Template {
        match level {
            DifficultyLevel::Beginner | DifficultyLevel::BeginnerHigh => &BEGINNER,
            DifficultyLevel::Intermediate | DifficultyLevel::IntermediateHigh => &INTERMEDIATE,
            DifficultyLevel::Advanced => &ADVANCED,
        }
    }

    fn to_set(&self) -> RecommendationSet {
        RecommendationSet {
            suitable_for: owned(self.suitable_for),
            learning_focus: owned(self.learning_focus),
            study_tips: owned(self.study_tips),
            estimated_study_time: self.estimated_study_time.to_string(),
            prerequisite_level: self.prerequisite_level.to_string(),
        }
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Learner guidance for a set of entries. `None` when there is nothing to analyze.
pub fn recommend(entries: &[SubtitleEntry]) -> Option<RecommendationSet> {
    if entries.is_empty() {
        return None;
    }
    let profile = analyze_vocabulary(entries);
    let assessment = assess(&profile);
    Some(recommend_from(&assessment, &profile))
}

pub fn recommend_from(assessment: &DifficultyAssessment, profile: &VocabularyProfile) -> RecommendationSet {
    let mut recommendations = Template::for_level(assessment.overall_level).to_set();

    // counts the reported list, which rare_words_limit truncates
    if profile.rare_words.len() > LARGE_RARE_VOCABULARY {
        recommendations
            .learning_focus
            .push("Large volume of new vocabulary".to_string());
        recommendations
            .study_tips
            .push("Use flashcards to memorize new words".to_string());
    }

    if profile.vocabulary_diversity > HIGH_DIVERSITY {
        recommendations
            .learning_focus
            .push("Vocabulary variation".to_string());
    }

    recommendations
}
