// Subtitle decoding
//
// - timecode: single timestamp tokens to milliseconds and back
// - sanitize: markup and whitespace cleanup for cue text
// - decoder: format/encoding detection and block parsing
// - writer: SRT serialization of decoded entries

pub mod decoder;
pub mod sanitize;
pub mod timecode;
pub mod writer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use decoder::{Decoded, SkippedBlock, decode, decode_bytes, decode_bytes_with_report, decode_with_report, detect_format};
pub use sanitize::clean;
pub use timecode::{format_timecode, parse_time};
pub use writer::{to_srt, write_srt};

use crate::error::SublingoError;

/// One timed cue, produced by the decoder and never mutated afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    pub index: u32,
    pub start_time: String,
    pub end_time: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl SubtitleEntry {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Srt,
    #[serde(rename = "vtt")]
    WebVtt,
}

impl SubtitleFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::WebVtt => "vtt",
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SubtitleFormat {
    type Err = SublingoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" | "webvtt" => Ok(Self::WebVtt),
            other => Err(SublingoError::UnsupportedFormat(format!(
                "unknown subtitle format '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("SRT".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Srt);
        assert_eq!("vtt".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::WebVtt);
        assert_eq!("WebVTT".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::WebVtt);
        assert!(matches!(
            "ass".parse::<SubtitleFormat>(),
            Err(SublingoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_entry_duration() {
        let entry = SubtitleEntry {
            index: 1,
            start_time: "00:00:01,000".to_string(),
            end_time: "00:00:03,500".to_string(),
            start_ms: 1_000,
            end_ms: 3_500,
            text: "Hi".to_string(),
        };
        assert_eq!(entry.duration_ms(), 2_500);
    }
}
