use thiserror::Error;

#[derive(Error, Debug)]
pub enum LivecapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The caller supplied something unusable (bad URL, malformed request body)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No caption track exists for the requested video and language
    #[error("{0}")]
    NotFound(String),

    #[error("Caption provider error: {0}")]
    Caption(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LivecapError>;
