//! Video identifier extraction from user-supplied URLs.

use std::fmt;
use serde::{Deserialize, Serialize};
use url::Url;

const SHORT_LINK_HOST: &str = "youtu.be";
const MAIN_HOST: &str = "youtube.com";
const PATH_PREFIXES: [&str; 2] = ["shorts", "embed"];

/// Opaque identifier of a video in the caption provider's namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn non_empty(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract the video identifier from a short link, watch URL, shorts URL or embed URL.
///
/// Returns `None` for anything unrecognized, including input that is not a URL at all.
pub fn resolve(input: &str) -> Option<VideoId> {
    let parsed = Url::parse(input.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();

    if host == SHORT_LINK_HOST {
        let id = parsed.path_segments()?.next()?;
        return VideoId::non_empty(id);
    }

    if host == MAIN_HOST || host.ends_with(".youtube.com") {
        if let Some((_, v)) = parsed.query_pairs().find(|(key, _)| key == "v") {
            if let Some(id) = VideoId::non_empty(&v) {
                return Some(id);
            }
        }

        let mut segments = parsed.path_segments()?;
        let prefix = segments.next()?;
        if PATH_PREFIXES.contains(&prefix) {
            return VideoId::non_empty(segments.next()?);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(url: &str) -> Option<String> {
        resolve(url).map(|v| v.to_string())
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(id("https://www.youtube.com/watch?v=abc123"), Some("abc123".into()));
        assert_eq!(id("https://youtube.com/watch?feature=share&v=abc123&t=10"), Some("abc123".into()));
        assert_eq!(id("https://m.youtube.com/watch?v=xyz"), Some("xyz".into()));
    }

    #[test]
    fn test_short_link() {
        assert_eq!(id("https://youtu.be/abc123"), Some("abc123".into()));
        assert_eq!(id("https://youtu.be/abc123?t=42"), Some("abc123".into()));
        assert_eq!(id("https://youtu.be/"), None);
    }

    #[test]
    fn test_shorts_and_embed() {
        assert_eq!(id("https://www.youtube.com/shorts/shortid"), Some("shortid".into()));
        assert_eq!(id("https://www.youtube.com/embed/embedid?autoplay=1"), Some("embedid".into()));
        assert_eq!(id("https://www.youtube.com/shorts/"), None);
    }

    #[test]
    fn test_query_param_wins_over_path() {
        assert_eq!(id("https://www.youtube.com/embed/fromPath?v=fromQuery"), Some("fromQuery".into()));
    }

    #[test]
    fn test_unrecognized_input() {
        assert_eq!(id("not a url"), None);
        assert_eq!(id(""), None);
        assert_eq!(id("https://vimeo.com/watch?v=abc123"), None);
        assert_eq!(id("https://notyoutube.com/watch?v=abc123"), None);
        assert_eq!(id("https://www.youtube.com/channel/UC123"), None);
        assert_eq!(id("https://www.youtube.com/watch?v="), None);
    }
}
