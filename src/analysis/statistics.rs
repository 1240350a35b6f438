use serde::{Deserialize, Serialize};

use crate::subtitle::SubtitleEntry;
use super::dialogue::Dialogue;

const MS_PER_MINUTE: f64 = 60_000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueStatistics {
    pub dialogue_count: usize,
    pub average_dialogue_duration_ms: f64,
    /// Dialogue with the longest text; the first one wins a tie
    pub longest_dialogue: Option<Dialogue>,
    pub dialogues_per_minute: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_entries: usize,
    pub total_duration_ms: u64,
    pub average_duration_ms: f64,
    pub total_words: usize,
    pub average_words_per_entry: f64,
    pub total_duration_formatted: String,
    pub entries_per_minute: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialogues: Option<DialogueStatistics>,
}

/// Aggregate entry statistics, plus dialogue statistics when dialogues are given
pub fn summarize(entries: &[SubtitleEntry], dialogues: Option<&[Dialogue]>) -> AnalysisSummary {
    let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
        return AnalysisSummary {
            total_duration_formatted: format_duration(0),
            ..AnalysisSummary::default()
        };
    };

    let count = entries.len() as f64;
    let total_duration_ms = last.end_ms.saturating_sub(first.start_ms);
    let summed_durations: u64 = entries.iter().map(SubtitleEntry::duration_ms).sum();
    let total_words: usize = entries
        .iter()
        .map(|entry| entry.text.split_whitespace().count())
        .sum();

    AnalysisSummary {
        total_entries: entries.len(),
        total_duration_ms,
        average_duration_ms: summed_durations as f64 / count,
        total_words,
        average_words_per_entry: total_words as f64 / count,
        total_duration_formatted: format_duration(total_duration_ms),
        entries_per_minute: per_minute(entries.len(), total_duration_ms),
        dialogues: dialogues.map(|dialogues| dialogue_statistics(dialogues, total_duration_ms)),
    }
}

fn dialogue_statistics(dialogues: &[Dialogue], total_duration_ms: u64) -> DialogueStatistics {
    if dialogues.is_empty() {
        return DialogueStatistics::default();
    }

    let summed: u64 = dialogues.iter().map(|d| d.duration_ms).sum();

    let mut longest: Option<&Dialogue> = None;
    for dialogue in dialogues {
        let is_longer = longest
            .map(|best| dialogue.text.chars().count() > best.text.chars().count())
            .unwrap_or(true);
        if is_longer {
            longest = Some(dialogue);
        }
    }

    DialogueStatistics {
        dialogue_count: dialogues.len(),
        average_dialogue_duration_ms: summed as f64 / dialogues.len() as f64,
        longest_dialogue: longest.cloned(),
        dialogues_per_minute: per_minute(dialogues.len(), total_duration_ms),
    }
}

/// Rate per minute, flooring a zero duration to 1 ms
fn per_minute(count: usize, duration_ms: u64) -> f64 {
    count as f64 / (duration_ms.max(1) as f64 / MS_PER_MINUTE)
}

/// Human-readable duration, leading zero units omitted: `1h 2m 3s`, `2m 3s`, `3s`
pub fn format_duration(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
