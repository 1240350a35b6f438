// Analysis of decoded subtitle entries
//
// Every stage is a pure function over `&[SubtitleEntry]`; `Analyzer` wires them
// together with an `AnalysisConfig` and produces the full `AnalysisReport`.

pub mod dialogue;
pub mod difficulty;
pub mod recommendation;
pub mod report;
pub mod statistics;
pub mod vocabulary;

pub use dialogue::{DEFAULT_DIALOGUE_GAP_MS, Dialogue, DialogueEntry, DialogueProfile, profile_dialogues, segment};
pub use difficulty::{
    ContentComplexity, DifficultyAssessment, DifficultyLevel, ScoreBreakdown, SpeakingSpeed,
    VocabularyComplexity, assess, pacing_words_per_minute, score_difficulty,
};
pub use recommendation::{RecommendationSet, recommend, recommend_from};
pub use report::{AnalysisReport, Analyzer, ReportSummary};
pub use statistics::{AnalysisSummary, DialogueStatistics, format_duration, summarize};
pub use vocabulary::{RARE_WORD_MAX_FREQUENCY, VocabularyProfile, WordCount, analyze_vocabulary, analyze_vocabulary_with};
