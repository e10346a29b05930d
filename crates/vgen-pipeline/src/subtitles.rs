//! SRT subtitle parsing.
//!
//! Used to validate that a generated subtitle file actually contains
//! lines before it is attached to the render.

use std::path::Path;

use tokio::fs;

use crate::error::PipelineResult;

/// One parsed subtitle cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleLine {
    pub seq: u32,
    /// Timing as written, e.g. `00:00:01,000`
    pub start: String,
    pub end: String,
    pub text: String,
}

/// Parse SRT content into cues. Malformed blocks are skipped.
pub fn parse_srt(content: &str) -> Vec<SubtitleLine> {
    let normalized = content.replace("\r\n", "\n");
    let mut lines = Vec::new();

    for block in normalized.split("\n\n") {
        let mut rows = block.lines().filter(|l| !l.trim().is_empty());

        let seq = match rows.next().and_then(|r| r.trim().parse::<u32>().ok()) {
            Some(seq) => seq,
            None => continue,
        };
        let timing = match rows.next() {
            Some(t) if t.contains("-->") => t,
            _ => continue,
        };
        let (start, end) = match timing.split_once("-->") {
            Some((s, e)) => (s.trim().to_string(), e.trim().to_string()),
            None => continue,
        };
        let text = rows.collect::<Vec<_>>().join("\n");
        if text.is_empty() {
            continue;
        }

        lines.push(SubtitleLine {
            seq,
            start,
            end,
            text,
        });
    }

    lines
}

/// Read and parse an SRT file.
pub async fn parse_srt_file(path: impl AsRef<Path>) -> PipelineResult<Vec<SubtitleLine>> {
    let content = fs::read_to_string(path.as_ref()).await?;
    Ok(parse_srt(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:00,000 --> 00:00:02,500\n金钱的作用\n\n2\n00:00:02,500 --> 00:00:05,000\nsecond line\nwrapped\n";

    #[test]
    fn test_parse_basic_srt() {
        let lines = parse_srt(SAMPLE);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].seq, 1);
        assert_eq!(lines[0].start, "00:00:00,000");
        assert_eq!(lines[0].text, "金钱的作用");
        assert_eq!(lines[1].text, "second line\nwrapped");
    }

    #[test]
    fn test_parse_crlf_srt() {
        let crlf = SAMPLE.replace('\n', "\r\n");
        assert_eq!(parse_srt(&crlf).len(), 2);
    }

    #[test]
    fn test_parse_skips_malformed_blocks() {
        let content = "garbage\n\n1\n00:00:00,000 --> 00:00:01,000\nok\n\n2\nno timing here\n";
        let lines = parse_srt(content);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "ok");
    }

    #[test]
    fn test_parse_empty_content() {
        assert!(parse_srt("").is_empty());
        assert!(parse_srt("\n\n\n").is_empty());
    }

    #[tokio::test]
    async fn test_parse_srt_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("subtitle.srt");
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let lines = parse_srt_file(&path).await.unwrap();
        assert_eq!(lines.len(), 2);
    }
}
