use std::sync::Arc;

use tracing::info;

use crate::caption::{CaptionFetcher, CaptionProvider, CaptionTrack, YoutubeCaptionProvider};
use crate::config::Config;
use crate::error::{LivecapError, Result};
use crate::sync::PlaybackSynchronizer;
use crate::translate::{BatchTranslator, CachePolicy, TranslationCache, TranslationProvider, TranslatorFactory};
use crate::video_id::{self, VideoId};

/// Caption pipeline: resolve id, fetch captions, clean, translate, synchronize
#[derive(Clone)]
pub struct Workflow {
    fetcher: CaptionFetcher,
    translator: BatchTranslator,
}

impl Workflow {
    /// Build the workflow with the providers described by `config`
    pub fn new(config: &Config) -> Result<Self> {
        let captions: Arc<dyn CaptionProvider> = Arc::new(YoutubeCaptionProvider::new(&config.captions)?);
        let translation = TranslatorFactory::create_provider(&config.translate)?;
        let cache = Arc::new(TranslationCache::new(CachePolicy::from(&config.cache)));

        Ok(Self::with_providers(captions, translation, cache))
    }

    pub fn with_providers(
        captions: Arc<dyn CaptionProvider>,
        translation: Arc<dyn TranslationProvider>,
        cache: Arc<TranslationCache>,
    ) -> Self {
        Self {
            fetcher: CaptionFetcher::new(captions),
            translator: BatchTranslator::new(translation, cache),
        }
    }

    pub fn resolve(&self, video_url: &str) -> Result<VideoId> {
        video_id::resolve(video_url)
            .ok_or_else(|| LivecapError::InvalidInput("Invalid YouTube URL".to_string()))
    }

    /// Fetch the raw caption track for the video behind `video_url`
    pub async fn fetch_captions(&self, video_url: &str, lang: &str) -> Result<CaptionTrack> {
        let video_id = self.resolve(video_url)?;
        info!("Fetching {} captions for video {}", lang, video_id);
        self.fetcher.fetch(&video_id, lang).await
    }

    pub async fn translate<S: AsRef<str>>(
        &self,
        texts: &[S],
        target_lang: &str,
        source_lang: &str,
    ) -> Result<Vec<String>> {
        self.translator.translate_batch(texts, target_lang, source_lang).await
    }

    /// Run the whole pipeline and return a synchronizer over the cleaned, translated track
    pub async fn prepare_session(
        &self,
        video_url: &str,
        lang: &str,
        target_lang: &str,
    ) -> Result<PlaybackSynchronizer> {
        let track = self.fetch_captions(video_url, lang).await?.cleaned();

        if track.lines.iter().all(|line| line.text.is_empty()) {
            return Err(LivecapError::NotFound("No captions available".to_string()));
        }

        info!(
            "Translating {} {} caption lines for {} ({} -> {})",
            track.len(),
            track.source,
            track.video_id,
            lang,
            target_lang
        );
        let translations = self.translate(&track.texts(), target_lang, lang).await?;

        PlaybackSynchronizer::new(track, translations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::{CaptionLine, CaptionSource, MockCaptionProvider};
    use crate::translate::MockTranslationProvider;
    use mockall::predicate::eq;

    fn workflow(captions: MockCaptionProvider, translation: MockTranslationProvider) -> Workflow {
        Workflow::with_providers(
            Arc::new(captions),
            Arc::new(translation),
            Arc::new(TranslationCache::default()),
        )
    }

    #[tokio::test]
    async fn test_end_to_end_translates_cleaned_text() {
        let mut captions = MockCaptionProvider::new();
        captions
            .expect_get_track()
            .with(eq("abc123"), eq("en"), eq(CaptionSource::Manual))
            .times(1)
            .returning(|_, _, _| Ok(vec![CaptionLine::new(0.0, 2.0, "<i>Hello</i>  world")]));

        let mut translation = MockTranslationProvider::new();
        translation
            .expect_translate()
            .with(eq("Hello world"), eq("en"), eq("zh"))
            .times(1)
            .returning(|_, _, _| Ok("你好 世界".to_string()));

        let workflow = workflow(captions, translation);
        assert_eq!(workflow.resolve("https://www.youtube.com/watch?v=abc123").unwrap().as_str(), "abc123");

        let session = workflow
            .prepare_session("https://www.youtube.com/watch?v=abc123", "en", "zh")
            .await
            .unwrap();

        assert_eq!(session.track().source, CaptionSource::Manual);
        assert_eq!(session.track().lines[0].text, "Hello world");
        assert_eq!(session.translations(), &["你好 世界".to_string()]);

        let state = session.sync(1.0);
        assert_eq!(session.active(&state).unwrap().translation, "你好 世界");
    }

    #[tokio::test]
    async fn test_fetch_captions_keeps_raw_text() {
        let mut captions = MockCaptionProvider::new();
        captions
            .expect_get_track()
            .returning(|_, _, _| Ok(vec![CaptionLine::new(0.0, 2.0, "<b>raw</b>")]));

        let workflow = workflow(captions, MockTranslationProvider::new());
        let track = workflow.fetch_captions("https://youtu.be/abc123", "en").await.unwrap();

        assert_eq!(track.lines[0].text, "<b>raw</b>");
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_fetching() {
        let mut captions = MockCaptionProvider::new();
        captions.expect_get_track().never();

        let workflow = workflow(captions, MockTranslationProvider::new());
        let err = workflow.fetch_captions("https://example.com/video", "en").await.unwrap_err();

        assert!(matches!(err, LivecapError::InvalidInput(ref msg) if msg == "Invalid YouTube URL"));
    }

    #[tokio::test]
    async fn test_blank_track_skips_translation() {
        let mut captions = MockCaptionProvider::new();
        captions
            .expect_get_track()
            .with(eq("abc123"), eq("en"), eq(CaptionSource::Manual))
            .returning(|_, _, _| Ok(vec![CaptionLine::new(0.0, 1.0, "<i> </i>"), CaptionLine::new(1.0, 1.0, "  ")]));

        let mut translation = MockTranslationProvider::new();
        translation.expect_translate().never();

        let workflow = workflow(captions, translation);
        let err = workflow
            .prepare_session("https://youtu.be/abc123", "en", "zh")
            .await
            .unwrap_err();

        assert!(matches!(err, LivecapError::NotFound(ref msg) if msg == "No captions available"));
    }

    #[tokio::test]
    async fn test_translation_failure_propagates() {
        let mut captions = MockCaptionProvider::new();
        captions
            .expect_get_track()
            .returning(|_, _, _| Ok(vec![CaptionLine::new(0.0, 1.0, "Hi")]));

        let mut translation = MockTranslationProvider::new();
        translation
            .expect_translate()
            .returning(|_, _, _| Err(LivecapError::Translation("unreachable".to_string())));

        let workflow = workflow(captions, translation);
        let err = workflow
            .prepare_session("https://youtu.be/abc123", "en", "zh")
            .await
            .unwrap_err();

        assert!(matches!(err, LivecapError::Translation(_)));
    }
}
