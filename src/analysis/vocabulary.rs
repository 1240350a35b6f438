use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::AnalysisConfig;
use crate::subtitle::SubtitleEntry;

/// Words seen at most this many times count as rare
pub const RARE_WORD_MAX_FREQUENCY: usize = 2;

// ASCII letters only: numerals and non-Latin scripts are not counted as words
static WORD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[a-z]+\b").expect("word pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabularyProfile {
    pub total_words: usize,
    pub unique_words_count: usize,
    /// Most frequent words, most frequent first
    pub word_frequency: Vec<WordCount>,
    pub common_words: Vec<WordCount>,
    /// Words with frequency <= 2, in frequency order, truncated
    pub rare_words: Vec<String>,
    /// Number of rare words before truncation
    pub rare_words_total: usize,
    pub vocabulary_diversity: f64,
    pub average_word_length: f64,
}

pub fn analyze_vocabulary(entries: &[SubtitleEntry]) -> VocabularyProfile {
    analyze_vocabulary_with(entries, &AnalysisConfig::default())
}

pub fn analyze_vocabulary_with(entries: &[SubtitleEntry], config: &AnalysisConfig) -> VocabularyProfile {
    let all_text = entries
        .iter()
        .map(|entry| entry.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let words: Vec<&str> = WORD_REGEX.find_iter(&all_text).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return VocabularyProfile::default();
    }

    let ranked = rank_words(&words);

    let rare: Vec<&WordCount> = ranked
        .iter()
        .filter(|wc| wc.count <= RARE_WORD_MAX_FREQUENCY)
        .collect();

    let total_words = words.len();
    let total_length: usize = words.iter().map(|word| word.len()).sum();

    VocabularyProfile {
        total_words,
        unique_words_count: ranked.len(),
        word_frequency: ranked.iter().take(config.word_frequency_limit).cloned().collect(),
        common_words: ranked.iter().take(config.common_words_limit).cloned().collect(),
        rare_words: rare
            .iter()
            .take(config.rare_words_limit)
            .map(|wc| wc.word.clone())
            .collect(),
        rare_words_total: rare.len(),
        vocabulary_diversity: ranked.len() as f64 / total_words as f64,
        average_word_length: total_length as f64 / total_words as f64,
    }
}

/// Count words and order them by descending frequency, ties by first appearance
fn rank_words(words: &[&str]) -> Vec<WordCount> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut ranked: Vec<WordCount> = Vec::new();

    for &word in words {
        match first_seen.get(word) {
            Some(&position) => ranked[position].count += 1,
            None => {
                first_seen.insert(word, ranked.len());
                ranked.push(WordCount {
                    word: word.to_string(),
                    count: 1,
                });
            }
        }
    }

    // stable: equal counts keep first-seen order
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}
