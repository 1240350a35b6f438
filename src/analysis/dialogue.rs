use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::subtitle::SubtitleEntry;

/// Default silence (ms) that separates two dialogues
pub const DEFAULT_DIALOGUE_GAP_MS: u64 = 2000;

/// Summary of one entry inside a dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueEntry {
    pub index: u32,
    pub start_time: String,
    pub end_time: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// A run of entries with no silence longer than the gap threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialogue {
    pub start_index: u32,
    pub end_index: u32,
    pub start_time: String,
    pub end_time: String,
    pub duration_ms: u64,
    pub text: String,
    pub entries: Vec<DialogueEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueProfile {
    pub total_dialogues: usize,
    /// Mean number of words per dialogue
    pub average_dialogue_length: f64,
    pub average_dialogue_duration_ms: f64,
    /// Word count of the shortest dialogue
    pub shortest_dialogue: usize,
    /// Word count of the longest dialogue
    pub longest_dialogue: usize,
    /// Dialogues per minute of spoken time (summed dialogue durations)
    pub dialogues_per_minute: f64,
}

impl From<&SubtitleEntry> for DialogueEntry {
    fn from(entry: &SubtitleEntry) -> Self {
        Self {
            index: entry.index,
            start_time: entry.start_time.clone(),
            end_time: entry.end_time.clone(),
            start_ms: entry.start_ms,
            end_ms: entry.end_ms,
            text: entry.text.clone(),
        }
    }
}

impl Dialogue {
    /// Close a non-empty cluster of entries into a dialogue
    fn from_cluster(cluster: Vec<DialogueEntry>) -> Option<Self> {
        let first = cluster.first()?;
        let last = cluster.last()?;

        Some(Self {
            start_index: first.index,
            end_index: last.index,
            start_time: first.start_time.clone(),
            end_time: last.end_time.clone(),
            duration_ms: last.end_ms.saturating_sub(first.start_ms),
            text: cluster
                .iter()
                .map(|entry| entry.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            entries: cluster,
        })
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Group entries into dialogues, starting a new one whenever the silence between
/// two consecutive entries is strictly greater than `min_gap_ms`.
pub fn segment(entries: &[SubtitleEntry], min_gap_ms: u64) -> Vec<Dialogue> {
    let mut dialogues = Vec::new();
    let mut current: Vec<DialogueEntry> = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            // overlapping cues give a negative gap
            let gap = entry.start_ms as i64 - entries[i - 1].end_ms as i64;
            if gap > min_gap_ms as i64 && !current.is_empty() {
                dialogues.extend(Dialogue::from_cluster(std::mem::take(&mut current)));
            }
        }

        current.push(DialogueEntry::from(entry));
    }

    dialogues.extend(Dialogue::from_cluster(current));

    debug!("Segmented {} entries into {} dialogues", entries.len(), dialogues.len());
    dialogues
}

pub fn profile_dialogues(dialogues: &[Dialogue]) -> DialogueProfile {
    if dialogues.is_empty() {
        return DialogueProfile::default();
    }

    let count = dialogues.len() as f64;
    let lengths: Vec<usize> = dialogues.iter().map(Dialogue::word_count).collect();
    let total_duration_ms: u64 = dialogues.iter().map(|d| d.duration_ms).sum();

    let dialogues_per_minute = if total_duration_ms > 0 {
        count / (total_duration_ms as f64 / 60_000.0)
    } else {
        0.0
    };

    DialogueProfile {
        total_dialogues: dialogues.len(),
        average_dialogue_length: lengths.iter().sum::<usize>() as f64 / count,
        average_dialogue_duration_ms: total_duration_ms as f64 / count,
        shortest_dialogue: lengths.iter().copied().min().unwrap_or(0),
        longest_dialogue: lengths.iter().copied().max().unwrap_or(0),
        dialogues_per_minute,
    }
}
