use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{Result, SublingoError};
use super::sanitize::clean;
use super::timecode::parse_time;
use super::{SubtitleEntry, SubtitleFormat};

const ARROW: &str = "-->";
const VTT_MAGIC: &str = "WEBVTT";
const SNIFF_CHARS: usize = 100;

static SRT_CUE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\n\d{2}:\d{2}:\d{2},\d{3}").expect("srt detection pattern is valid")
});

static BLOCK_SEPARATOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\s*\n").expect("block separator pattern is valid")
});

/// A block or cue dropped during decoding, with the reason it was rejected
#[derive(Debug)]
pub struct SkippedBlock {
    /// 1-based block number for SRT, 1-based line number for WebVTT
    pub position: usize,
    pub reason: SublingoError,
}

/// Decoding result with the per-block failures that were recovered from
#[derive(Debug)]
pub struct Decoded {
    pub format: SubtitleFormat,
    /// Character encoding the bytes were decoded with, when decoding from bytes
    pub encoding: Option<String>,
    pub entries: Vec<SubtitleEntry>,
    pub skipped: Vec<SkippedBlock>,
}

/// Guess the subtitle format from its content. Falls back to SRT.
pub fn detect_format(content: &str) -> SubtitleFormat {
    let head: String = content.chars().take(SNIFF_CHARS).collect();
    if head.contains(VTT_MAGIC) {
        return SubtitleFormat::WebVtt;
    }

    let normalized = normalize_line_endings(content);
    if normalized.contains(ARROW) && SRT_CUE_REGEX.is_match(&normalized) {
        return SubtitleFormat::Srt;
    }

    warn!("Could not detect subtitle format, trying SRT");
    SubtitleFormat::Srt
}

/// Decode subtitle text into entries, in file order
pub fn decode(content: &str, format: Option<SubtitleFormat>) -> Result<Vec<SubtitleEntry>> {
    decode_with_report(content, format).map(|decoded| decoded.entries)
}

/// Decode raw subtitle bytes of unknown encoding into entries
pub fn decode_bytes(bytes: &[u8], format: Option<SubtitleFormat>) -> Result<Vec<SubtitleEntry>> {
    decode_bytes_with_report(bytes, format).map(|decoded| decoded.entries)
}

pub fn decode_bytes_with_report(bytes: &[u8], format: Option<SubtitleFormat>) -> Result<Decoded> {
    let (text, encoding) = decode_text(bytes);
    let mut decoded = decode_with_report(&text, format)?;
    decoded.encoding = Some(encoding.to_string());
    Ok(decoded)
}

/// Decode subtitle text, keeping track of every block that had to be skipped.
///
/// Only fails with `UnsupportedFormat` when non-blank input carries no timed cue at all.
pub fn decode_with_report(content: &str, format: Option<SubtitleFormat>) -> Result<Decoded> {
    let content = normalize_line_endings(content);

    if content.trim().is_empty() {
        debug!("Empty subtitle content");
        return Ok(Decoded {
            format: format.unwrap_or(SubtitleFormat::Srt),
            encoding: None,
            entries: Vec::new(),
            skipped: Vec::new(),
        });
    }

    if !content.contains(ARROW) {
        return Err(SublingoError::UnsupportedFormat(
            "no timed cues found in subtitle content".to_string(),
        ));
    }

    let format = format.unwrap_or_else(|| detect_format(&content));
    info!("Parsing {} subtitles", format);

    let (entries, skipped) = match format {
        SubtitleFormat::Srt => parse_srt(&content),
        SubtitleFormat::WebVtt => parse_vtt(&content),
    };

    if !skipped.is_empty() {
        warn!("Skipped {} malformed subtitle blocks", skipped.len());
    }
    info!("Parsed {} subtitle entries", entries.len());

    Ok(Decoded {
        format,
        encoding: None,
        entries,
        skipped,
    })
}

fn normalize_line_endings(content: &str) -> String {
    content
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Take the encoding from a byte order mark, else sniff it, and decode.
///
/// Invalid sequences are replaced with U+FFFD rather than failing the decode.
fn decode_text(bytes: &[u8]) -> (String, &'static str) {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_length)) => {
            debug!("Encoding taken from byte order mark: {}", encoding.name());
            (encoding, &bytes[bom_length..])
        }
        None => {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            let (encoding, confident) = detector.guess_assess(None, true);
            info!(
                "Detected encoding: {} (high confidence: {})",
                encoding.name(),
                confident
            );
            (encoding, bytes)
        }
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        let failure = SublingoError::EncodingDetection(format!(
            "{} input contains invalid sequences",
            encoding.name()
        ));
        warn!("{}, decoding lossily", failure);
    }

    (text.into_owned(), encoding.name())
}

fn parse_srt(content: &str) -> (Vec<SubtitleEntry>, Vec<SkippedBlock>) {
    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    let blocks = BLOCK_SEPARATOR_REGEX
        .split(content.trim())
        .filter(|block| !block.trim().is_empty());

    for (offset, block) in blocks.enumerate() {
        let position = offset + 1;
        match parse_srt_block(block, position) {
            Ok(entry) => entries.push(entry),
            Err(reason) => {
                let preview: String = block.chars().take(50).collect();
                warn!("Skipping subtitle block {}: {} ({:?})", position, reason, preview);
                skipped.push(SkippedBlock { position, reason });
            }
        }
    }

    (entries, skipped)
}

fn parse_srt_block(block: &str, position: usize) -> Result<SubtitleEntry> {
    let lines: Vec<&str> = block.trim().lines().collect();
    if lines.len() < 3 {
        return Err(malformed(
            position,
            format!("expected at least 3 lines, found {}", lines.len()),
        ));
    }

    let index = lines[0].trim().parse::<u32>().map_err(|e| {
        malformed(position, format!("bad sequence number '{}': {}", lines[0].trim(), e))
    })?;

    let (start, end) = parse_timing_line(lines[1], position)?;
    let text = clean(&lines[2..].join("\n"));

    build_entry(index, start, end, text, position)
}

fn parse_vtt(content: &str) -> (Vec<SubtitleEntry>, Vec<SkippedBlock>) {
    let lines: Vec<&str> = content.lines().collect();
    let mut entries = Vec::new();
    let mut skipped = Vec::new();
    let mut i = skip_vtt_header(&lines);

    while i < lines.len() {
        let line = lines[i].trim();
        // cue identifiers, NOTE and STYLE blocks carry no timing
        if line.is_empty() || !line.contains(ARROW) {
            i += 1;
            continue;
        }

        let position = i + 1;
        let timing = parse_timing_line(line, position);

        i += 1;
        let text_start = i;
        while i < lines.len() && !lines[i].trim().is_empty() {
            i += 1;
        }

        let (start, end) = match timing {
            Ok(timing) => timing,
            Err(reason) => {
                warn!("Skipping cue at line {}: {}", position, reason);
                skipped.push(SkippedBlock { position, reason });
                continue;
            }
        };

        if text_start == i {
            debug!("Dropping cue without text at line {}", position);
            continue;
        }

        let text = clean(&lines[text_start..i].join("\n"));
        let index = entries.len() as u32 + 1;
        match build_entry(index, start, end, text, position) {
            Ok(entry) => entries.push(entry),
            Err(reason) => {
                warn!("Skipping cue at line {}: {}", position, reason);
                skipped.push(SkippedBlock { position, reason });
            }
        }
    }

    (entries, skipped)
}

/// Index of the first line after the `WEBVTT` header region
fn skip_vtt_header(lines: &[&str]) -> usize {
    let first = lines.iter().position(|line| !line.trim().is_empty());
    let Some(first) = first else {
        return lines.len();
    };

    if !lines[first].trim_start().starts_with(VTT_MAGIC) {
        return 0;
    }

    let mut i = first + 1;
    while i < lines.len() && !lines[i].trim().is_empty() && !lines[i].contains(ARROW) {
        i += 1;
    }
    i
}

type Timing = ((String, u64), (String, u64));

fn parse_timing_line(line: &str, position: usize) -> Result<Timing> {
    let (start, rest) = line
        .split_once(ARROW)
        .ok_or_else(|| malformed(position, format!("missing '{}' in '{}'", ARROW, line.trim())))?;

    // WebVTT cue settings may follow the end timestamp
    let end = rest.split_whitespace().next().unwrap_or("");

    Ok((parse_time(start)?, parse_time(end)?))
}

fn build_entry(
    index: u32,
    (start_time, start_ms): (String, u64),
    (end_time, end_ms): (String, u64),
    text: String,
    position: usize,
) -> Result<SubtitleEntry> {
    if end_ms < start_ms {
        return Err(malformed(
            position,
            format!("cue ends ({}) before it starts ({})", end_time, start_time),
        ));
    }

    Ok(SubtitleEntry {
        index,
        start_time,
        end_time,
        start_ms,
        end_ms,
        text,
    })
}

fn malformed(position: usize, reason: String) -> SublingoError {
    SublingoError::MalformedBlock { position, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SRT: &str = "1\n00:00:01,000 --> 00:00:03,000\nHello world\n\n2\n00:00:03,500 --> 00:00:05,000\n<i>Goodbye</i> friend\n";

    const SAMPLE_VTT: &str = "WEBVTT\nKind: captions\nLanguage: en\n\nNOTE written by hand\n\nintro\n00:01.000 --> 00:03.000 align:start\n<v Anna>Hello there</v>\n\n00:00:04.5 --> 00:00:06.000\nSecond line\nwraps here\n";

    #[test]
    fn test_decode_srt_sample() {
        let entries = decode(SAMPLE_SRT, None).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].index, 1);
        assert_eq!(entries[0].text, "Hello world");
        assert_eq!(entries[0].duration_ms(), 2_000);
        assert_eq!(entries[1].text, "Goodbye friend");
        assert_eq!(entries[1].start_time, "00:00:03,500");
        assert_eq!(entries[1].duration_ms(), 1_500);
    }

    #[test]
    fn test_decode_vtt_sample() {
        let decoded = decode_with_report(SAMPLE_VTT, None).unwrap();

        assert_eq!(decoded.format, SubtitleFormat::WebVtt);
        assert_eq!(decoded.entries.len(), 2);
        assert_eq!(decoded.entries[0].index, 1);
        assert_eq!(decoded.entries[0].text, "Hello there");
        assert_eq!(decoded.entries[0].start_ms, 1_000);
        assert_eq!(decoded.entries[0].end_ms, 3_000);
        assert_eq!(decoded.entries[1].index, 2);
        assert_eq!(decoded.entries[1].start_time, "00:00:04.500");
        assert_eq!(decoded.entries[1].text, "Second line wraps here");
        assert!(decoded.skipped.is_empty());
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(SAMPLE_VTT), SubtitleFormat::WebVtt);
        assert_eq!(detect_format(SAMPLE_SRT), SubtitleFormat::Srt);
        assert_eq!(detect_format("some text --> more"), SubtitleFormat::Srt);
        assert_eq!(
            detect_format("1\r\n00:00:01,000 --> 00:00:02,000\r\nHi\r\n"),
            SubtitleFormat::Srt
        );
    }

    #[test]
    fn test_malformed_block_is_skipped() {
        let content = "1\n00:00:01,000 --> 00:00:02,000\nFirst\n\n2\n00:00:03,000 00:00:04,000\nNo arrow\n\n3\n00:00:05,000 --> 00:00:06,000\nThird\n";
        let decoded = decode_with_report(content, Some(SubtitleFormat::Srt)).unwrap();

        let texts: Vec<&str> = decoded.entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["First", "Third"]);
        assert_eq!(decoded.skipped.len(), 1);
        assert_eq!(decoded.skipped[0].position, 2);
        assert!(matches!(
            decoded.skipped[0].reason,
            SublingoError::MalformedBlock { .. }
        ));
    }

    #[test]
    fn test_oversized_timecode_block_is_skipped() {
        let content = "1\n00:00:01,000 --> 00:00:02,000\nFirst\n\n\
                       2\n99999999999999:00:00,000 --> 99999999999999:00:01,000\nHuge\n\n\
                       3\n00:00:05,000 --> 00:00:06,000\nThird\n";
        let decoded = decode_with_report(content, Some(SubtitleFormat::Srt)).unwrap();

        let texts: Vec<&str> = decoded.entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["First", "Third"]);
        assert_eq!(decoded.skipped.len(), 1);
        assert_eq!(decoded.skipped[0].position, 2);
        assert!(matches!(
            decoded.skipped[0].reason,
            SublingoError::InvalidTimecode(_)
        ));
    }

    #[test]
    fn test_bad_blocks_of_every_kind_are_recovered() {
        let content = "x\n00:00:01,000 --> 00:00:02,000\nBad number\n\n\
                       2\n00:00:0a,000 --> 00:00:02,000\nBad timecode\n\n\
                       3\n00:00:01,000 --> 00:00:02,000\n\n\
                       4\n00:00:09,000 --> 00:00:08,000\nBackwards\n\n\
                       5\n00:00:10,000 --> 00:00:11,000\nSurvivor\n";
        let decoded = decode_with_report(content, None).unwrap();

        assert_eq!(decoded.entries.len(), 1);
        assert_eq!(decoded.entries[0].index, 5);
        assert!(decoded
            .skipped
            .iter()
            .any(|s| matches!(s.reason, SublingoError::InvalidTimecode(_))));
        assert!(decoded.skipped.len() >= 3);
    }

    #[test]
    fn test_srt_preserves_input_order() {
        let content = "2\n00:00:05,000 --> 00:00:06,000\nLater\n\n1\n00:00:01,000 --> 00:00:02,000\nEarlier\n";
        let entries = decode(content, None).unwrap();

        assert_eq!(entries[0].index, 2);
        assert_eq!(entries[1].index, 1);
        assert!(entries.iter().all(|e| e.start_ms <= e.end_ms));
    }

    #[test]
    fn test_vtt_bad_timing_is_skipped() {
        let content = "WEBVTT\n\n00:00:xx.000 --> 00:00:02.000\nBroken\n\n00:00:03.000 --> 00:00:04.000\nFine\n";
        let decoded = decode_with_report(content, None).unwrap();

        assert_eq!(decoded.entries.len(), 1);
        assert_eq!(decoded.entries[0].index, 1);
        assert_eq!(decoded.entries[0].text, "Fine");
        assert_eq!(decoded.skipped.len(), 1);
        assert_eq!(decoded.skipped[0].position, 3);
    }

    #[test]
    fn test_crlf_and_bom_are_handled() {
        let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nWindows\r\nline\r\n\r\n";
        let entries = decode(content, None).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "Windows line");
    }

    #[test]
    fn test_unstructured_input_is_unsupported() {
        assert!(matches!(
            decode("just some prose\nwith lines", None),
            Err(SublingoError::UnsupportedFormat(_))
        ));
        assert!(decode("   \n\n", None).unwrap().is_empty());
    }

    #[test]
    fn test_decode_utf8_bytes() {
        let decoded = decode_bytes_with_report(SAMPLE_SRT.as_bytes(), None).unwrap();
        assert_eq!(decoded.entries.len(), 2);
        assert!(decoded.encoding.is_some());
    }

    #[test]
    fn test_decode_legacy_encoded_bytes() {
        let (bytes, _, _) = encoding_rs::WINDOWS_1252
            .encode("1\n00:00:01,000 --> 00:00:02,000\nCaf\u{e9} cr\u{e8}me br\u{fb}l\u{e9}e, s'il vous pla\u{ee}t\n");
        let entries = decode_bytes(&bytes, None).unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].text.starts_with("Caf"));
        assert!(!entries[0].text.contains('\u{fffd}'));
    }

    #[test]
    fn test_malformed_utf16_after_bom_decodes_lossily() {
        let mut bytes = vec![0xff, 0xfe];
        for unit in "1\n00:00:01,000 --> 00:00:02,000\nBad".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        // unpaired high surrogate
        bytes.extend_from_slice(&0xd800u16.to_le_bytes());
        for unit in " pair\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        // dangling odd byte
        bytes.push(0x41);

        let decoded = decode_bytes_with_report(&bytes, None).unwrap();
        assert_eq!(decoded.encoding.as_deref(), Some("UTF-16LE"));
        assert_eq!(decoded.entries.len(), 1);
        assert!(decoded.entries[0].text.starts_with("Bad"));
        assert!(decoded.entries[0].text.contains('\u{fffd}'));
        assert!(decoded.entries[0].text.contains("pair"));
    }

    #[test]
    fn test_invalid_bytes_never_fail() {
        let mut bytes = b"1\n00:00:01,000 --> 00:00:02,000\nok ".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, 0xfd]);
        bytes.extend_from_slice(b"\n");

        let entries = decode_bytes(&bytes, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].text.starts_with("ok"));
    }
}
