use std::path::Path;
use std::sync::LazyLock;
use regex::Regex;
use tokio::fs;
use tracing::info;

use crate::caption::CaptionLine;
use crate::error::{LivecapError, Result};

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup tag pattern is valid"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Strip `<...>` markup, collapse whitespace runs to a single space and trim.
///
/// Idempotent: `clean_text(&clean_text(x)) == clean_text(x)`.
pub fn clean_text(text: &str) -> String {
    let without_tags = MARKUP_TAG.replace_all(text, "");
    WHITESPACE_RUN
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

/// Render captions and their translations as a bilingual SRT document
pub fn render_srt(lines: &[CaptionLine], translations: &[String]) -> Result<String> {
    if lines.len() != translations.len() {
        return Err(LivecapError::InvalidInput(format!(
            "{} captions but {} translations",
            lines.len(),
            translations.len()
        )));
    }

    let mut srt_content = String::new();

    for (index, (line, translation)) in lines.iter().zip(translations).enumerate() {
        let start_time = format_srt_time(line.start);
        let end_time = format_srt_time(line.end());

        srt_content.push_str(&format!("{}\n{} --> {}\n", index + 1, start_time, end_time));
        srt_content.push_str(line.text.trim());
        srt_content.push('\n');
        if !translation.trim().is_empty() {
            srt_content.push_str(translation.trim());
            srt_content.push('\n');
        }
        srt_content.push('\n');
    }

    Ok(srt_content)
}

/// Generate a bilingual SRT subtitle file
pub async fn generate_srt<P: AsRef<Path>>(
    lines: &[CaptionLine],
    translations: &[String],
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    let srt_content = render_srt(lines, translations)?;
    fs::write(output_path, srt_content).await?;

    info!("SRT file generated successfully ({} entries)", lines.len());
    Ok(())
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm)
fn format_srt_time(seconds: f64) -> String {
    let total_milliseconds = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn line(start: f64, duration: f64, text: &str) -> CaptionLine {
        CaptionLine::new(start, duration, text)
    }

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(65.123), "00:01:05,123");
        assert_eq!(format_srt_time(3661.500), "01:01:01,500");
    }

    #[test]
    fn test_clean_text_strips_markup_and_whitespace() {
        assert_eq!(clean_text("<i>Hello</i>  world"), "Hello world");
        assert_eq!(clean_text("  <font color=\"#fff\">a\n\tb</font> "), "a b");
        assert_eq!(clean_text("<>empty tag"), "empty tag");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        let samples = [
            "<i>Hello</i>  world",
            "<<b>>nested<</b>>",
            "a < b and c > d",
            "<x<y>z>",
            "unclosed <tag",
            "[Music]\n\n  ♪ la la ♪",
            "\u{00a0}wide\u{3000}space ",
        ];
        for sample in samples {
            let once = clean_text(sample);
            assert_eq!(clean_text(&once), once, "not idempotent for {:?}", sample);
            assert!(!MARKUP_TAG.is_match(&once), "markup left in {:?}", once);
        }
    }

    #[test]
    fn test_render_srt_bilingual() {
        let lines = vec![line(0.0, 2.0, "Hello world"), line(3.0, 1.5, "Bye")];
        let translations = vec!["你好 世界".to_string(), "".to_string()];

        let srt = render_srt(&lines, &translations).unwrap();
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:02,000\nHello world\n你好 世界\n\n\
             2\n00:00:03,000 --> 00:00:04,500\nBye\n\n"
        );
    }

    #[test]
    fn test_render_srt_length_mismatch() {
        let lines = vec![line(0.0, 1.0, "a")];
        assert!(matches!(render_srt(&lines, &[]), Err(LivecapError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_generate_srt_writes_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let output = temp.child("video_zh.srt");

        let lines = vec![line(1.0, 1.0, "One")];
        generate_srt(&lines, &["一".to_string()], output.path()).await.unwrap();

        let content = std::fs::read_to_string(output.path()).unwrap();
        assert!(content.starts_with("1\n00:00:01,000 --> 00:00:02,000\nOne\n一\n"));
    }
}
