use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::error::Result;
use super::timecode::format_timecode;
use super::{SubtitleEntry, SubtitleFormat};

/// Serialize entries as SRT with timecodes re-rendered from milliseconds
pub fn to_srt(entries: &[SubtitleEntry]) -> String {
    let mut srt_content = String::new();

    for entry in entries {
        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            entry.index,
            format_timecode(entry.start_ms, SubtitleFormat::Srt),
            format_timecode(entry.end_ms, SubtitleFormat::Srt),
            entry.text.trim()
        ));
    }

    srt_content
}

/// Write entries to an SRT file
pub async fn write_srt<P: AsRef<Path>>(entries: &[SubtitleEntry], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Writing SRT file: {}", output_path.display());

    fs::write(output_path, to_srt(entries)).await?;

    info!("SRT file written with {} entries", entries.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::decode;

    #[test]
    fn test_vtt_converts_to_srt() {
        let vtt = "WEBVTT\n\n00:01.5 --> 00:03.000\nHello\n\n00:00:04.000 --> 00:00:05.250\nWorld\n";
        let entries = decode(vtt, None).unwrap();

        assert_eq!(
            to_srt(&entries),
            "1\n00:00:01,500 --> 00:00:03,000\nHello\n\n2\n00:00:04,000 --> 00:00:05,250\nWorld\n\n"
        );
    }

    #[test]
    fn test_written_srt_decodes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.srt");
        let entries = decode(
            "1\n00:00:01,000 --> 00:00:02,000\nOne\n\n2\n00:00:02,500 --> 00:00:04,000\nTwo\n",
            None,
        )
        .unwrap();

        tokio_test::block_on(write_srt(&entries, &path)).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(decode(&written, None).unwrap(), entries);
    }
}
