use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use super::{AUTO_DETECT, CacheKey, TranslationCache, TranslationProvider};

/// Translates ordered caption texts one by one, consulting the shared cache
#[derive(Clone)]
pub struct BatchTranslator {
    provider: Arc<dyn TranslationProvider>,
    cache: Arc<TranslationCache>,
}

impl BatchTranslator {
    pub fn new(provider: Arc<dyn TranslationProvider>, cache: Arc<TranslationCache>) -> Self {
        Self { provider, cache }
    }

    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    /// Translate `texts` into `target_lang`.
    ///
    /// The output has one entry per input, in input order. Blank inputs map to
    /// empty strings without touching the cache or the provider. Provider calls
    /// are issued sequentially; the first failure aborts the whole batch.
    pub async fn translate_batch<S: AsRef<str>>(
        &self,
        texts: &[S],
        target_lang: &str,
        source_lang: &str,
    ) -> Result<Vec<String>> {
        // The cache is keyed on the caller's value; only the upstream request defaults to auto-detect
        let request_source = match source_lang.trim() {
            "" => AUTO_DETECT,
            lang => lang,
        };
        info!("Translating {} texts ({} -> {})", texts.len(), request_source, target_lang);

        let mut results = Vec::with_capacity(texts.len());
        let mut upstream_calls = 0usize;

        for (idx, text) in texts.iter().enumerate() {
            let trimmed = text.as_ref().trim();
            if trimmed.is_empty() {
                results.push(String::new());
                continue;
            }

            let key = CacheKey::new(source_lang, target_lang, trimmed);
            if let Some(cached) = self.cache.get(&key) {
                debug!("Cache hit for text {}/{}", idx + 1, texts.len());
                results.push(cached);
                continue;
            }

            let translated = self
                .provider
                .translate(trimmed, request_source, target_lang)
                .await
                .inspect_err(|e| warn!("Translation of text {}/{} failed: {}", idx + 1, texts.len(), e))?;
            upstream_calls += 1;

            self.cache.put(key, translated.clone());
            results.push(translated);
        }

        let stats = self.cache.stats();
        debug!(
            "Batch done: {} texts, {} upstream calls, cache {} entries ({:.0}% hit rate)",
            texts.len(),
            upstream_calls,
            stats.entries,
            stats.hit_rate() * 100.0
        );
        Ok(results)
    }
}
