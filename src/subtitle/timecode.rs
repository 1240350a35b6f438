use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SublingoError};
use super::SubtitleFormat;

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>").expect("timecode tag pattern is valid")
});

const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

/// Parse a single timestamp token into its normalized display form and milliseconds.
///
/// Accepted forms:
/// - `HH:MM:SS,mmm` (SRT)
/// - `HH:MM:SS.mmm` and `MM:SS.mmm` (WebVTT); the fraction is right-padded to 3 digits
/// - `MM:SS` and `HH:MM:SS` with no fraction
pub fn parse_time(token: &str) -> Result<(String, u64)> {
    let clean = TAG_REGEX.replace_all(token, "");
    let clean = clean.trim();

    if let Some((clock, millis)) = clean.split_once(',') {
        let (hours, minutes, seconds) = split_clock(clock, clean, false)?;
        let millis = parse_component(millis, clean)?;
        let total = to_millis(hours, minutes, seconds, millis, clean)?;
        return Ok((clean.to_string(), total));
    }

    if let Some((clock, fraction)) = clean.split_once('.') {
        let (hours, minutes, seconds) = split_clock(clock, clean, true)?;
        let padded = format!("{:0<3}", fraction);
        let millis = parse_component(&padded, clean)?;
        let total = to_millis(hours, minutes, seconds, millis, clean)?;
        return Ok((format!("{}.{}", clock, padded), total));
    }

    if clean.contains(':') {
        let (hours, minutes, seconds) = split_clock(clean, clean, true)?;
        let total = to_millis(hours, minutes, seconds, 0, clean)?;
        return Ok((clean.to_string(), total));
    }

    Err(SublingoError::InvalidTimecode(format!("unrecognized timestamp '{}'", clean)))
}

/// Render milliseconds as `HH:MM:SS,mmm` (SRT) or `HH:MM:SS.mmm` (WebVTT)
pub fn format_timecode(ms: u64, format: SubtitleFormat) -> String {
    let hours = ms / MS_PER_HOUR;
    let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let secs = (ms % MS_PER_MINUTE) / MS_PER_SECOND;
    let millis = ms % MS_PER_SECOND;

    let separator = match format {
        SubtitleFormat::Srt => ',',
        SubtitleFormat::WebVtt => '.',
    };

    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, separator, millis)
}

/// Split `H:M:S` (or `M:S` when `allow_short`) into its numeric parts
fn split_clock(clock: &str, token: &str, allow_short: bool) -> Result<(u64, u64, u64)> {
    let parts: Vec<&str> = clock.split(':').collect();
    match parts.as_slice() {
        [h, m, s] => Ok((
            parse_component(h, token)?,
            parse_component(m, token)?,
            parse_component(s, token)?,
        )),
        [m, s] if allow_short => Ok((0, parse_component(m, token)?, parse_component(s, token)?)),
        _ => Err(SublingoError::InvalidTimecode(format!(
            "expected hours, minutes and seconds in '{}'",
            token
        ))),
    }
}

fn parse_component(value: &str, token: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|e| {
        SublingoError::InvalidTimecode(format!("bad component '{}' in '{}': {}", value, token, e))
    })
}

fn to_millis(hours: u64, minutes: u64, seconds: u64, millis: u64, token: &str) -> Result<u64> {
    hours
        .checked_mul(MS_PER_HOUR)
        .and_then(|total| total.checked_add(minutes.checked_mul(MS_PER_MINUTE)?))
        .and_then(|total| total.checked_add(seconds.checked_mul(MS_PER_SECOND)?))
        .and_then(|total| total.checked_add(millis))
        .ok_or_else(|| SublingoError::InvalidTimecode(format!("timestamp '{}' is out of range", token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_srt_timecode() {
        assert_eq!(
            parse_time("00:01:02,500").unwrap(),
            ("00:01:02,500".to_string(), 62_500)
        );
        assert_eq!(parse_time("01:23:45,678").unwrap().1, 5_025_678);
    }

    #[test]
    fn test_parse_vtt_timecode_pads_fraction() {
        assert_eq!(
            parse_time("00:01:02.5").unwrap(),
            ("00:01:02.500".to_string(), 62_500)
        );
        assert_eq!(
            parse_time("00:00:00.05").unwrap(),
            ("00:00:00.050".to_string(), 50)
        );
    }

    #[test]
    fn test_parse_vtt_short_form() {
        assert_eq!(
            parse_time("01:02.250").unwrap(),
            ("01:02.250".to_string(), 62_250)
        );
    }

    #[test]
    fn test_parse_clock_without_fraction() {
        assert_eq!(parse_time("01:30").unwrap(), ("01:30".to_string(), 90_000));
        assert_eq!(parse_time("01:00:30").unwrap().1, 3_630_000);
    }

    #[test]
    fn test_parse_strips_tags_and_whitespace() {
        assert_eq!(
            parse_time("  <c.yellow>00:00:01,000</c> ").unwrap(),
            ("00:00:01,000".to_string(), 1_000)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for token in ["", "abc", "12", "1:2:3:4", "00:xx:01,000", "00:00:01,abc", "-1:00:00"] {
            assert!(
                matches!(parse_time(token), Err(SublingoError::InvalidTimecode(_))),
                "expected failure for {:?}",
                token
            );
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range_hours() {
        assert!(matches!(
            parse_time("99999999999999:00:00,000"),
            Err(SublingoError::InvalidTimecode(_))
        ));
        assert!(matches!(
            parse_time("5124095577:00:00,000"),
            Err(SublingoError::InvalidTimecode(_))
        ));
        assert_eq!(parse_time("1000:00:00,000").unwrap().1, 3_600_000_000);
    }

    #[test]
    fn test_format_timecode() {
        assert_eq!(format_timecode(0, SubtitleFormat::Srt), "00:00:00,000");
        assert_eq!(format_timecode(65_123, SubtitleFormat::Srt), "00:01:05,123");
        assert_eq!(format_timecode(3_661_500, SubtitleFormat::WebVtt), "01:01:01.500");
    }
}
