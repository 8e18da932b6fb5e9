use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{LivecapError, Result};
use super::TranslationProvider;

#[derive(Debug, Clone, Serialize)]
pub struct LibreTranslateRequest<'a> {
    pub q: &'a str,
    pub source: &'a str,
    pub target: &'a str,
    pub format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibreTranslateResponse {
    pub translated_text: String,
}

/// Client for a LibreTranslate-compatible `/translate` endpoint
pub struct LibreTranslateClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl LibreTranslateClient {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
        })
    }
}

#[async_trait]
impl TranslationProvider for LibreTranslateClient {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let request = LibreTranslateRequest {
            q: text,
            source: source_lang,
            target: target_lang,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        debug!("Sending translation request to: {} ({} -> {})", self.endpoint, source_lang, target_lang);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LivecapError::Translation("Translation request timed out".to_string())
                } else {
                    LivecapError::Translation(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LivecapError::Translation(format!(
                "Translation API error {}: {}",
                status, error_text
            )));
        }

        let body: LibreTranslateResponse = response
            .json()
            .await
            .map_err(|e| LivecapError::Translation(format!("Failed to parse response: {}", e)))?;

        Ok(body.translated_text)
    }
}
