use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TranscriptError;

/// Length of every video identifier
pub const VIDEO_ID_LEN: usize = 11;

const SHORT_LINK_MARKER: &str = "youtu.be/";
const EMBED_MARKER: &str = "/embed/";

lazy_static! {
    static ref GENERIC_PATTERN: Regex = Regex::new(
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)"
    )
    .unwrap();
}

/// A validated 11-character video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Validate a bare identifier
    pub fn new(raw: &str) -> Result<Self, TranscriptError> {
        if is_valid_id(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(TranscriptError::InvalidUrl(format!(
                "{} (video ids are exactly {} characters of [A-Za-z0-9_-])",
                raw, VIDEO_ID_LEN
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
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

/// Which URL layout produced the identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UrlShape {
    /// `youtu.be/<id>`
    ShortLink,
    /// `...?v=<id>`
    Watch,
    /// `/embed/<id>`
    Embed,
    /// Matched only by the generic pattern
    Pattern,
}

impl fmt::Display for UrlShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlShape::ShortLink => write!(f, "short-link"),
            UrlShape::Watch => write!(f, "watch"),
            UrlShape::Embed => write!(f, "embed"),
            UrlShape::Pattern => write!(f, "pattern"),
        }
    }
}

/// Extract the video identifier from a URL
pub fn extract(url: &str) -> Result<VideoId, TranscriptError> {
    extract_with_shape(url).map(|(id, _)| id)
}

/// Extract the video identifier and report which URL shape matched
pub fn extract_with_shape(url: &str) -> Result<(VideoId, UrlShape), TranscriptError> {
    let positional = [
        (UrlShape::ShortLink, short_link_candidate(url)),
        (UrlShape::Watch, watch_candidate(url)),
        (UrlShape::Embed, embed_candidate(url)),
    ];

    for (shape, candidate) in positional {
        if let Some(candidate) = candidate {
            if is_valid_id(candidate) {
                tracing::debug!("Extracted video id {} from {} URL", candidate, shape);
                return Ok((VideoId(candidate.to_string()), shape));
            }
            tracing::debug!(
                "Rejected {} candidate {:?} ({} chars)",
                shape,
                candidate,
                candidate.chars().count()
            );
        }
    }

    if let Some(captures) = GENERIC_PATTERN.captures(url) {
        let candidate = &captures[1];
        tracing::debug!("Extracted video id {} via generic pattern", candidate);
        return Ok((VideoId(candidate.to_string()), UrlShape::Pattern));
    }

    Err(TranscriptError::InvalidUrl(url.to_string()))
}

fn short_link_candidate(url: &str) -> Option<&str> {
    let start = url.find(SHORT_LINK_MARKER)? + SHORT_LINK_MARKER.len();
    Some(take_until(&url[start..], '?'))
}

fn watch_candidate(url: &str) -> Option<&str> {
    let query_start = url.find('?')?;
    url[query_start + 1..]
        .split('&')
        .find_map(|param| param.strip_prefix("v="))
}

fn embed_candidate(url: &str) -> Option<&str> {
    let start = url.find(EMBED_MARKER)? + EMBED_MARKER.len();
    Some(take_until(&url[start..], '?'))
}

fn take_until(s: &str, delimiter: char) -> &str {
    match s.find(delimiter) {
        Some(end) => &s[..end],
        None => s,
    }
}

fn is_valid_id(candidate: &str) -> bool {
    candidate.len() == VIDEO_ID_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_link() {
        let (id, shape) = extract_with_shape("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(shape, UrlShape::ShortLink);
    }

    #[test]
    fn test_short_link_with_query() {
        let id = extract("https://youtu.be/dQw4w9WgXcQ?t=42").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_watch_url() {
        let (id, shape) =
            extract_with_shape("https://www.youtube.com/watch?v=8S0FDjFBj8o").unwrap();
        assert_eq!(id.as_str(), "8S0FDjFBj8o");
        assert_eq!(shape, UrlShape::Watch);
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        let id = extract("https://www.youtube.com/watch?feature=share&v=yZYQpge1W5s&t=10s").unwrap();
        assert_eq!(id.as_str(), "yZYQpge1W5s");
    }

    #[test]
    fn test_embed_url() {
        let (id, shape) =
            extract_with_shape("https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(shape, UrlShape::Embed);
    }

    #[test]
    fn test_generic_pattern_catches_trailing_path() {
        let (id, shape) = extract_with_shape("https://youtu.be/dQw4w9WgXcQ/").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(shape, UrlShape::Pattern);
    }

    #[test]
    fn test_unrecognized_url() {
        assert_eq!(
            extract("https://example.com/video/123"),
            Err(TranscriptError::InvalidUrl("https://example.com/video/123".to_string()))
        );
    }

    #[test]
    fn test_wrong_length() {
        assert!(extract("https://youtu.be/short").is_err());
        assert!(extract("https://www.youtube.com/watch?v=dQw4w9WgXcQextra").is_err());
        assert!(extract("https://www.youtube.com/embed/abc").is_err());
    }

    #[test]
    fn test_invalid_charset() {
        assert!(extract("https://www.youtube.com/watch?v=abc$%^*()!@").is_err());
    }

    #[test]
    fn test_video_id_new() {
        assert!(VideoId::new("dQw4w9WgXcQ").is_ok());
        assert!(VideoId::new("dQw4w9WgXc").is_err());
        assert_eq!(VideoId::new("8S0FDjFBj8o").unwrap().to_string(), "8S0FDjFBj8o");
    }
}
