use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use crate::error::{LivecapError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub captions: CaptionConfig,
    pub translate: TranslateConfig,
    pub cache: CacheConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP API on
    pub host: String,
    /// Port to bind the HTTP API on
    pub port: u16,
    /// Allowed CORS origin, `*` for any
    pub cors_origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Base URL of the video site whose watch pages list caption tracks
    pub base_url: String,
    /// Caption language used when a request does not name one
    pub default_lang: String,
    /// Timeout for each request to the caption provider
    pub timeout_secs: u64,
    /// User agent sent with caption requests
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// LibreTranslate-compatible `/translate` endpoint
    pub endpoint: String,
    /// Optional API key forwarded as `api_key`
    pub api_key: Option<String>,
    /// Target language used when a request does not name one
    pub default_target: String,
    /// Source language used when a request does not name one
    pub default_source: String,
    /// Timeout for each translation request
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Disable to always go to the translation provider
    pub enabled: bool,
    /// Maximum number of cached translations
    pub capacity: usize,
    /// Entries older than this are treated as misses
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How often the playback clock is sampled
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5174,
            cors_origin: "*".to_string(),
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            default_lang: "en".to_string(),
            timeout_secs: 15,
            user_agent: "Mozilla/5.0 (livecap)".to_string(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://libretranslate.de/translate".to_string(),
            api_key: None,
            default_target: "zh".to_string(),
            default_source: "auto".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 10_000,
            ttl_secs: Some(24 * 60 * 60),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { poll_interval_ms: 200 }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl CaptionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl TranslateConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LivecapError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| LivecapError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LivecapError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| LivecapError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Apply `PORT`, `CORS_ORIGIN`, `LIBRETRANSLATE_URL` and `LIBRETRANSLATE_API_KEY`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| LivecapError::Config(format!("Invalid PORT value: {}", port)))?;
        }
        if let Some(origin) = lookup("CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }
        if let Some(endpoint) = lookup("LIBRETRANSLATE_URL") {
            self.translate.endpoint = endpoint;
        }
        if let Some(key) = lookup("LIBRETRANSLATE_API_KEY") {
            // An empty key means "no key", same as leaving it unset
            self.translate.api_key = Some(key).filter(|k| !k.is_empty());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(LivecapError::Config("server.port must be non-zero".to_string()));
        }
        if self.captions.timeout_secs == 0 || self.translate.timeout_secs == 0 {
            return Err(LivecapError::Config("Upstream timeouts must be non-zero".to_string()));
        }
        if self.cache.capacity == 0 {
            return Err(LivecapError::Config("cache.capacity must be non-zero".to_string()));
        }
        if self.sync.poll_interval_ms == 0 {
            return Err(LivecapError::Config("sync.poll_interval_ms must be non-zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080

            [translate]
            endpoint = "http://localhost:5000/translate"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.translate.endpoint, "http://localhost:5000/translate");
        assert_eq!(config.translate.default_target, "zh");
        assert_eq!(config.cache.capacity, 10_000);
        assert_eq!(config.sync.poll_interval_ms, 200);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.translate.api_key = Some("secret".to_string());
        config.cache.ttl_secs = Some(60);
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.translate.api_key.as_deref(), Some("secret"));
        assert_eq!(loaded.cache.ttl_secs, Some(60));
        assert_eq!(loaded.server.addr(), "0.0.0.0:5174");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "9000"),
            ("CORS_ORIGIN", "http://localhost:5173"),
            ("LIBRETRANSLATE_URL", "http://lt:5000/translate"),
            ("LIBRETRANSLATE_API_KEY", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.translate.api_key = Some("old".to_string());
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.cors_origin, "http://localhost:5173");
        assert_eq!(config.translate.endpoint, "http://lt:5000/translate");
        assert_eq!(config.translate.api_key, None);
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| (key == "PORT").then(|| "eighty".to_string()));
        assert!(matches!(result, Err(LivecapError::Config(_))));
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.translate.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cache.capacity = 0;
        assert!(config.validate().is_err());
    }
}
