// Caption acquisition
//
// - CaptionProvider: narrow seam over the upstream caption source
// - CaptionFetcher: manual-first, auto-second fallback over a provider
// - youtube: provider that reads caption tracks from watch pages

pub mod youtube;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use youtube::YoutubeCaptionProvider;

use crate::error::{LivecapError, Result};
use crate::subtitle::clean_text;
use crate::video_id::VideoId;

/// One timed unit of caption text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionLine {
    /// Seconds from the start of the video
    pub start: f64,
    /// Seconds the line stays on screen
    #[serde(rename = "dur", alias = "duration")]
    pub duration: f64,
    /// Raw text, possibly with markup
    pub text: String,
}

impl CaptionLine {
    pub fn new(start: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            text: text.into(),
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether `time` falls inside `[start, start + duration]`, both ends inclusive
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time <= self.end()
    }
}

/// Provenance of a caption track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionSource {
    /// Authored by the uploader
    Manual,
    /// Generated by speech recognition
    Auto,
}

impl CaptionSource {
    /// Order in which sources are tried
    pub const FALLBACK_ORDER: [CaptionSource; 2] = [CaptionSource::Manual, CaptionSource::Auto];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for CaptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered caption lines for one video and language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    pub video_id: VideoId,
    pub lang: String,
    pub source: CaptionSource,
    pub lines: Vec<CaptionLine>,
}

impl CaptionTrack {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.text.clone()).collect()
    }

    /// Copy of the track with every line's text run through [`clean_text`]
    pub fn cleaned(&self) -> Self {
        Self {
            lines: self
                .lines
                .iter()
                .map(|line| CaptionLine::new(line.start, line.duration, clean_text(&line.text)))
                .collect(),
            ..self.clone()
        }
    }

    /// True when no line starts before its predecessor
    pub fn is_monotonic(&self) -> bool {
        self.lines.windows(2).all(|pair| pair[0].start <= pair[1].start)
    }

    /// End time of the last line, or zero for an empty track
    pub fn end_time(&self) -> f64 {
        self.lines.iter().map(CaptionLine::end).fold(0.0, f64::max)
    }
}

/// Upstream source of timed captions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Fetch the track of the given kind; an empty vector means the track has no lines
    async fn get_track(
        &self,
        video_id: &str,
        lang: &str,
        source: CaptionSource,
    ) -> Result<Vec<CaptionLine>>;
}

/// Result of asking the provider for one kind of track
#[derive(Debug)]
pub enum FetchOutcome {
    Found(Vec<CaptionLine>),
    Empty,
    Failed(LivecapError),
}

impl From<Result<Vec<CaptionLine>>> for FetchOutcome {
    fn from(result: Result<Vec<CaptionLine>>) -> Self {
        match result {
            Ok(lines) if lines.is_empty() => Self::Empty,
            Ok(lines) => Self::Found(lines),
            Err(e) => Self::Failed(e),
        }
    }
}

/// Fetches caption tracks, preferring manual captions over auto-generated ones
#[derive(Clone)]
pub struct CaptionFetcher {
    provider: Arc<dyn CaptionProvider>,
}

impl CaptionFetcher {
    pub fn new(provider: Arc<dyn CaptionProvider>) -> Self {
        Self { provider }
    }

    pub async fn attempt(&self, video_id: &VideoId, lang: &str, source: CaptionSource) -> FetchOutcome {
        self.provider
            .get_track(video_id.as_str(), lang, source)
            .await
            .into()
    }

    /// Fetch the best available track for `video_id` in `lang`
    pub async fn fetch(&self, video_id: &VideoId, lang: &str) -> Result<CaptionTrack> {
        for source in CaptionSource::FALLBACK_ORDER {
            match self.attempt(video_id, lang, source).await {
                FetchOutcome::Found(lines) => {
                    info!("Found {} {} caption lines for {} ({})", lines.len(), source, video_id, lang);
                    return Ok(CaptionTrack {
                        video_id: video_id.clone(),
                        lang: lang.to_string(),
                        source,
                        lines,
                    });
                }
                FetchOutcome::Empty => {
                    debug!("No {} captions for {} ({})", source, video_id, lang);
                }
                FetchOutcome::Failed(e) => {
                    warn!("Fetching {} captions for {} ({}) failed: {}", source, video_id, lang, e);
                }
            }
        }

        Err(LivecapError::NotFound(
            "No captions found for this video and language.".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn video() -> VideoId {
        crate::video_id::resolve("https://youtu.be/abc123").unwrap()
    }

    fn lines(texts: &[&str]) -> Vec<CaptionLine> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| CaptionLine::new(i as f64 * 2.0, 2.0, *text))
            .collect()
    }

    #[tokio::test]
    async fn test_manual_preferred_when_present() {
        let mut provider = MockCaptionProvider::new();
        provider
            .expect_get_track()
            .with(eq("abc123"), eq("en"), eq(CaptionSource::Manual))
            .times(1)
            .returning(|_, _, _| Ok(lines(&["manual"])));
        provider
            .expect_get_track()
            .with(eq("abc123"), eq("en"), eq(CaptionSource::Auto))
            .never();

        let fetcher = CaptionFetcher::new(Arc::new(provider));
        let track = fetcher.fetch(&video(), "en").await.unwrap();

        assert_eq!(track.source, CaptionSource::Manual);
        assert_eq!(track.lang, "en");
        assert_eq!(track.video_id.as_str(), "abc123");
        assert_eq!(track.texts(), vec!["manual"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_auto_when_manual_empty() {
        let mut provider = MockCaptionProvider::new();
        provider
            .expect_get_track()
            .with(eq("abc123"), eq("en"), eq(CaptionSource::Manual))
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));
        provider
            .expect_get_track()
            .with(eq("abc123"), eq("en"), eq(CaptionSource::Auto))
            .times(1)
            .returning(|_, _, _| Ok(lines(&["auto one", "auto two"])));

        let fetcher = CaptionFetcher::new(Arc::new(provider));
        let track = fetcher.fetch(&video(), "en").await.unwrap();

        assert_eq!(track.source, CaptionSource::Auto);
        assert_eq!(track.len(), 2);
    }

    #[tokio::test]
    async fn test_manual_failure_is_swallowed() {
        let mut provider = MockCaptionProvider::new();
        provider
            .expect_get_track()
            .with(eq("abc123"), eq("ja"), eq(CaptionSource::Manual))
            .returning(|_, _, _| Err(LivecapError::Caption("manual outage".to_string())));
        provider
            .expect_get_track()
            .with(eq("abc123"), eq("ja"), eq(CaptionSource::Auto))
            .returning(|_, _, _| Ok(lines(&["自動"])));

        let fetcher = CaptionFetcher::new(Arc::new(provider));
        let track = fetcher.fetch(&video(), "ja").await.unwrap();

        assert_eq!(track.source, CaptionSource::Auto);
        assert_eq!(track.lang, "ja");
    }

    #[tokio::test]
    async fn test_not_found_when_both_fail_or_empty() {
        let mut provider = MockCaptionProvider::new();
        provider
            .expect_get_track()
            .with(eq("abc123"), eq("en"), eq(CaptionSource::Manual))
            .returning(|_, _, _| Err(LivecapError::Caption("boom".to_string())));
        provider
            .expect_get_track()
            .with(eq("abc123"), eq("en"), eq(CaptionSource::Auto))
            .returning(|_, _, _| Ok(Vec::new()));

        let fetcher = CaptionFetcher::new(Arc::new(provider));
        let err = fetcher.fetch(&video(), "en").await.unwrap_err();

        assert!(matches!(err, LivecapError::NotFound(_)));
        assert_eq!(err.to_string(), "No captions found for this video and language.");
    }

    #[test]
    fn test_fetch_outcome_from_result() {
        assert!(matches!(FetchOutcome::from(Ok(Vec::new())), FetchOutcome::Empty));
        assert!(matches!(FetchOutcome::from(Ok(lines(&["x"]))), FetchOutcome::Found(l) if l.len() == 1));
        assert!(matches!(
            FetchOutcome::from(Err(LivecapError::Caption("x".into()))),
            FetchOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_track_helpers() {
        let track = CaptionTrack {
            video_id: video(),
            lang: "en".to_string(),
            source: CaptionSource::Manual,
            lines: vec![
                CaptionLine::new(0.0, 2.0, "<i>Hello</i>  world"),
                CaptionLine::new(3.0, 2.5, "again"),
            ],
        };

        assert!(track.is_monotonic());
        assert_eq!(track.end_time(), 5.5);
        assert_eq!(track.cleaned().texts(), vec!["Hello world", "again"]);
        assert_eq!(track.texts()[0], "<i>Hello</i>  world");

        let mut reversed = track.clone();
        reversed.lines.reverse();
        assert!(!reversed.is_monotonic());
    }

    #[test]
    fn test_line_wire_format() {
        let line: CaptionLine = serde_json::from_str(r#"{"start":1.5,"dur":2.0,"text":"hi"}"#).unwrap();
        assert_eq!(line, CaptionLine::new(1.5, 2.0, "hi"));

        let aliased: CaptionLine =
            serde_json::from_str(r#"{"start":1.5,"duration":2.0,"text":"hi"}"#).unwrap();
        assert_eq!(aliased, line);

        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["dur"], 2.0);
        assert_eq!(serde_json::to_value(CaptionSource::Auto).unwrap(), "auto");
    }
}
