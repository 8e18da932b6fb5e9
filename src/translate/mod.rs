// Caption translation
//
// - TranslationProvider: narrow seam over the upstream translation service
// - cache: shared (source, target, text) memo with capacity and TTL limits
// - batch: ordered, sequential batch translation through the cache
// - libre: LibreTranslate HTTP client

pub mod batch;
pub mod cache;
pub mod libre;

use std::sync::Arc;

use async_trait::async_trait;

pub use batch::BatchTranslator;
pub use cache::{CacheKey, CachePolicy, CacheStats, TranslationCache};
pub use libre::LibreTranslateClient;

use crate::config::TranslateConfig;
use crate::error::Result;

/// Source language value that asks the provider to detect the language
pub const AUTO_DETECT: &str = "auto";

/// Upstream service translating a single piece of text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;
}

/// Factory for creating translation provider instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the provider described by the configuration
    pub fn create_provider(config: &TranslateConfig) -> Result<Arc<dyn TranslationProvider>> {
        Ok(Arc::new(LibreTranslateClient::new(config)?))
    }
}
