use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Captures, Regex};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::CaptionConfig;
use crate::error::{LivecapError, Result};
use super::{CaptionLine, CaptionProvider, CaptionSource};

const CAPTION_TRACKS_KEY: &str = "\"captionTracks\":";

static TEXT_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<text\s+start="([0-9.]+)"(?:\s+dur="([0-9.]+)")?[^>]*>(.*?)</text>"#)
        .expect("timed text pattern is valid")
});
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("entity pattern is valid")
});

/// Caption track advertised by a watch page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrackInfo {
    pub base_url: String,
    pub language_code: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub vss_id: Option<String>,
}

impl CaptionTrackInfo {
    fn is_asr(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn matches(&self, lang: &str, source: CaptionSource) -> bool {
        let vss_id = match source {
            CaptionSource::Manual => format!(".{}", lang),
            CaptionSource::Auto => format!("a.{}", lang),
        };
        if self.vss_id.as_deref() == Some(vss_id.as_str()) {
            return true;
        }
        self.language_code == lang && self.is_asr() == (source == CaptionSource::Auto)
    }
}

/// Reads caption tracks from YouTube watch pages and their timed-text XML
pub struct YoutubeCaptionProvider {
    client: Client,
    base_url: Url,
}

impl YoutubeCaptionProvider {
    pub fn new(config: &CaptionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| LivecapError::Config(format!("Invalid captions.base_url: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn watch_url(&self, video_id: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join("watch")
            .map_err(|e| LivecapError::Caption(format!("Cannot build watch URL: {}", e)))?;
        url.query_pairs_mut().append_pair("v", video_id);
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        debug!("Requesting {}", url);

        let response = self
            .client
            .get(url.clone())
            .header("Accept-Language", "en")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LivecapError::Caption(format!("Request to {} timed out", url))
                } else {
                    LivecapError::Caption(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LivecapError::Caption(format!(
                "Caption provider returned {} for {}",
                status, url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| LivecapError::Caption(format!("Failed to read response body: {}", e)))
    }
}

#[async_trait]
impl CaptionProvider for YoutubeCaptionProvider {
    async fn get_track(
        &self,
        video_id: &str,
        lang: &str,
        source: CaptionSource,
    ) -> Result<Vec<CaptionLine>> {
        let page = self.get_text(self.watch_url(video_id)?).await?;
        let tracks = parse_caption_tracks(&page).ok_or_else(|| {
            LivecapError::Caption(format!("Could not find captions for video: {}", video_id))
        })??;

        let Some(track) = select_track(&tracks, lang, source) else {
            debug!("Video {} has no {} track for {}", video_id, source, lang);
            return Ok(Vec::new());
        };

        let transcript_url = self
            .base_url
            .join(&track.base_url)
            .map_err(|e| LivecapError::Caption(format!("Invalid caption track URL: {}", e)))?;
        let xml = self.get_text(transcript_url).await?;

        Ok(parse_transcript(&xml))
    }
}

/// Extract the `captionTracks` array from a watch page.
///
/// `None` when the page advertises no captions at all.
pub fn parse_caption_tracks(page: &str) -> Option<Result<Vec<CaptionTrackInfo>>> {
    let start = page.find(CAPTION_TRACKS_KEY)? + CAPTION_TRACKS_KEY.len();
    let rest = &page[start..];
    let array = match balanced_json_array(rest) {
        Some(array) => array,
        None => {
            return Some(Err(LivecapError::Caption(
                "Unterminated captionTracks array".to_string(),
            )))
        }
    };

    Some(serde_json::from_str(array).map_err(|e| {
        LivecapError::Caption(format!("Failed to parse captionTracks: {}", e))
    }))
}

/// Slice of `input` holding the JSON array it starts with
fn balanced_json_array(input: &str) -> Option<&str> {
    if !input.starts_with('[') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in input.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&input[..=offset]);
                }
            }
            _ => {}
        }
    }

    None
}

pub fn select_track<'a>(
    tracks: &'a [CaptionTrackInfo],
    lang: &str,
    source: CaptionSource,
) -> Option<&'a CaptionTrackInfo> {
    tracks.iter().find(|track| track.matches(lang, source))
}

/// Parse timed-text XML (`<text start=".." dur="..">..</text>`) into caption lines
pub fn parse_transcript(xml: &str) -> Vec<CaptionLine> {
    TEXT_ELEMENT
        .captures_iter(xml)
        .filter_map(|caps| {
            let start = caps.get(1)?.as_str().parse().ok()?;
            let duration = caps
                .get(2)
                .and_then(|d| d.as_str().parse().ok())
                .unwrap_or(0.0);
            // Timed text is escaped twice: `&amp;#39;` decodes to `&#39;` decodes to `'`
            let text = decode_entities(&caps[3].replace("&amp;", "&"));
            Some(CaptionLine::new(start, duration, text))
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{00a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
