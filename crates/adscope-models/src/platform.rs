//! Recognized video platforms: URL signatures, video IDs, and the
//! deterministic endpoints built from them.
//!
//! URLs are treated as untrusted input. Video IDs are strictly validated
//! per platform before they are used to build probe URLs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// File extensions treated as direct video files.
const DIRECT_FILE_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".webm", ".m4v", ".mkv", ".avi"];

/// A recognized video-hosting platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    Vimeo,
    Dailymotion,
    Tiktok,
}

impl Platform {
    /// All recognized platforms.
    pub const ALL: &'static [Platform] = &[
        Platform::Youtube,
        Platform::Vimeo,
        Platform::Dailymotion,
        Platform::Tiktok,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Vimeo => "vimeo",
            Platform::Dailymotion => "dailymotion",
            Platform::Tiktok => "tiktok",
        }
    }

    /// Match a URL against this platform's domain signatures.
    pub fn matches_url(&self, url: &str) -> bool {
        let url = url.to_ascii_lowercase();
        match self {
            Platform::Youtube => url.contains("youtube.com") || url.contains("youtu.be"),
            Platform::Vimeo => url.contains("vimeo.com"),
            Platform::Dailymotion => url.contains("dailymotion.com") || url.contains("dai.ly"),
            Platform::Tiktok => url.contains("tiktok.com"),
        }
    }

    /// Classify a URL against all known platform signatures.
    pub fn detect(url: &str) -> Option<Platform> {
        Platform::ALL.iter().copied().find(|p| p.matches_url(url))
    }

    /// Extract and validate the platform-specific video identifier.
    pub fn extract_video_id(&self, url: &str) -> Option<String> {
        let url = url.trim();
        match self {
            Platform::Youtube => extract_youtube_id(url),
            Platform::Vimeo => {
                // vimeo.com/{digits}, possibly with extra path segments
                let id = segment_after(url, "vimeo.com/")?;
                let id: String = id.chars().take_while(|c| c.is_ascii_digit()).collect();
                (!id.is_empty()).then_some(id)
            }
            Platform::Dailymotion => {
                let id = segment_after(url, "/video/").or_else(|| segment_after(url, "dai.ly/"))?;
                is_token(&id).then_some(id)
            }
            Platform::Tiktok => {
                let id = segment_after(url, "/video/")?;
                let id: String = id.chars().take_while(|c| c.is_ascii_digit()).collect();
                (!id.is_empty()).then_some(id)
            }
        }
    }

    /// Build the platform's oEmbed endpoint URL for a watch URL.
    pub fn oembed_url(&self, watch_url: &str) -> String {
        let encoded = urlencoding::encode(watch_url);
        match self {
            Platform::Youtube => format!(
                "https://www.youtube.com/oembed?url={}&format=json",
                encoded
            ),
            Platform::Vimeo => format!("https://vimeo.com/api/oembed.json?url={}", encoded),
            Platform::Dailymotion => format!(
                "https://www.dailymotion.com/services/oembed?url={}&format=json",
                encoded
            ),
            Platform::Tiktok => format!("https://www.tiktok.com/oembed?url={}", encoded),
        }
    }

    /// Candidate thumbnail URLs, highest resolution first.
    ///
    /// Empty when the platform has no deterministic thumbnail template
    /// (TikTok); those sources rely on oEmbed metadata instead.
    pub fn thumbnail_candidates(&self, video_id: &str) -> Vec<String> {
        match self {
            Platform::Youtube => ["maxresdefault", "sddefault", "hqdefault", "mqdefault", "default"]
                .iter()
                .map(|name| format!("https://img.youtube.com/vi/{}/{}.jpg", video_id, name))
                .collect(),
            Platform::Vimeo => vec![
                format!("https://vumbnail.com/{}_large.jpg", video_id),
                format!("https://vumbnail.com/{}.jpg", video_id),
            ],
            Platform::Dailymotion => vec![format!(
                "https://www.dailymotion.com/thumbnail/video/{}",
                video_id
            )],
            Platform::Tiktok => Vec::new(),
        }
    }

    /// Candidate storyboard frame URLs (near-fixed-interval stills), best
    /// effort. These are never equivalent to true frame sampling.
    pub fn storyboard_candidates(&self, video_id: &str) -> Vec<String> {
        match self {
            Platform::Youtube => (1..=3)
                .map(|n| format!("https://img.youtube.com/vi/{}/{}.jpg", video_id, n))
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "youtube" => Ok(Platform::Youtube),
            "vimeo" => Ok(Platform::Vimeo),
            "dailymotion" => Ok(Platform::Dailymotion),
            "tiktok" => Ok(Platform::Tiktok),
            _ => Err(PlatformParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown platform: {0}")]
pub struct PlatformParseError(String);

/// Returns true if the URL path ends in a known raw video file extension.
pub fn is_direct_file_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let path = parsed.path().to_ascii_lowercase();
    DIRECT_FILE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Extract the path/query segment following `marker`, stopping at the next
/// delimiter.
fn segment_after(url: &str, marker: &str) -> Option<String> {
    let start = url.find(marker)? + marker.len();
    if start >= url.len() {
        return None;
    }
    let rest = &url[start..];
    let end = rest.find(['&', '#', '?', '/']).unwrap_or(rest.len());
    let segment = rest[..end].trim();
    (!segment.is_empty()).then(|| segment.to_string())
}

/// Returns true for a non-empty `[A-Za-z0-9_-]` identifier token.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// YouTube video IDs are exactly 11 characters of `[A-Za-z0-9_-]`.
fn validate_youtube_id(id: String) -> Option<String> {
    let valid = id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(id)
}

/// Extract a YouTube video ID from any supported URL form:
/// `watch?v=`, `youtu.be/`, `/embed/`, `/shorts/`, `/v/`.
fn extract_youtube_id(url: &str) -> Option<String> {
    let from_query = url
        .find("?v=")
        .or_else(|| url.find("&v="))
        .and_then(|pos| segment_after(url, &url[pos..pos + 3]));
    if let Some(id) = from_query {
        return validate_youtube_id(id);
    }

    for marker in ["youtu.be/", "/embed/", "/shorts/", "/v/"] {
        if let Some(id) = segment_after(url, marker) {
            return validate_youtube_id(id);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_platforms() {
        assert_eq!(
            Platform::detect("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some(Platform::Youtube)
        );
        assert_eq!(
            Platform::detect("https://youtu.be/dQw4w9WgXcQ"),
            Some(Platform::Youtube)
        );
        assert_eq!(
            Platform::detect("https://vimeo.com/76979871"),
            Some(Platform::Vimeo)
        );
        assert_eq!(
            Platform::detect("https://dai.ly/x7tgad0"),
            Some(Platform::Dailymotion)
        );
        assert_eq!(
            Platform::detect("https://www.tiktok.com/@user/video/7106594312292453675"),
            Some(Platform::Tiktok)
        );
        assert_eq!(Platform::detect("https://example.com/clip.mp4"), None);
    }

    #[test]
    fn test_youtube_id_extraction() {
        for url in [
            "https://youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123",
            "https://youtu.be/dQw4w9WgXcQ?t=30",
            "https://youtube.com/embed/dQw4w9WgXcQ",
            "https://youtube.com/shorts/dQw4w9WgXcQ",
            "https://youtube.com/v/dQw4w9WgXcQ",
        ] {
            assert_eq!(
                Platform::Youtube.extract_video_id(url).as_deref(),
                Some("dQw4w9WgXcQ"),
                "failed for {url}"
            );
        }

        // Too short, too long, invalid chars, empty
        assert_eq!(
            Platform::Youtube.extract_video_id("https://youtube.com/watch?v=short"),
            None
        );
        assert_eq!(
            Platform::Youtube.extract_video_id("https://youtu.be/waytoolongvideoid"),
            None
        );
        assert_eq!(
            Platform::Youtube.extract_video_id("https://youtube.com/watch?v="),
            None
        );
    }

    #[test]
    fn test_other_platform_ids() {
        assert_eq!(
            Platform::Vimeo
                .extract_video_id("https://vimeo.com/76979871")
                .as_deref(),
            Some("76979871")
        );
        assert_eq!(
            Platform::Dailymotion
                .extract_video_id("https://www.dailymotion.com/video/x7tgad0")
                .as_deref(),
            Some("x7tgad0")
        );
        assert_eq!(
            Platform::Tiktok
                .extract_video_id("https://www.tiktok.com/@user/video/7106594312292453675")
                .as_deref(),
            Some("7106594312292453675")
        );
        assert_eq!(Platform::Vimeo.extract_video_id("https://vimeo.com/"), None);
    }

    #[test]
    fn test_thumbnail_candidates_order() {
        let candidates = Platform::Youtube.thumbnail_candidates("dQw4w9WgXcQ");
        assert_eq!(candidates.len(), 5);
        assert!(candidates[0].contains("maxresdefault"));
        assert!(candidates[4].ends_with("default.jpg"));

        assert!(Platform::Tiktok.thumbnail_candidates("123").is_empty());
    }

    #[test]
    fn test_storyboard_candidates() {
        let frames = Platform::Youtube.storyboard_candidates("dQw4w9WgXcQ");
        assert_eq!(frames.len(), 3);
        assert!(frames[0].ends_with("/1.jpg"));
        assert!(Platform::Vimeo.storyboard_candidates("123").is_empty());
    }

    #[test]
    fn test_oembed_url_encodes_source() {
        let url = Platform::Youtube.oembed_url("https://youtube.com/watch?v=dQw4w9WgXcQ");
        assert!(url.starts_with("https://www.youtube.com/oembed?url="));
        assert!(url.contains("%3A%2F%2F"));
        assert!(url.ends_with("&format=json"));
    }

    #[test]
    fn test_direct_file_detection() {
        assert!(is_direct_file_url("https://cdn.example.com/spot.mp4"));
        assert!(is_direct_file_url("https://cdn.example.com/spot.MOV?sig=abc"));
        assert!(!is_direct_file_url("https://example.com/watch?file=spot.mp4x"));
        assert!(!is_direct_file_url("https://youtube.com/watch?v=dQw4w9WgXcQ"));
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("youtube".parse::<Platform>().unwrap(), Platform::Youtube);
        assert_eq!("TikTok".parse::<Platform>().unwrap(), Platform::Tiktok);
        assert!("myspace".parse::<Platform>().is_err());
    }
}
