use async_trait::async_trait;

pub mod http;
pub mod innertube;
pub mod mirror;
pub mod primary;
pub mod retry;
pub mod scrape;
pub mod timedtext;

use crate::identifier::VideoId;
use crate::SourceError;

pub use http::{HttpFetcher, HttpProfile, HttpResponse, ReqwestFetcher};
pub use mirror::{MirrorDescriptor, MirrorShape, MirrorSource};
pub use primary::{CaptionService, CaptionTrack, PrimarySource};
pub use retry::RetryPolicy;
pub use scrape::ScrapeSource;

/// Minimum number of characters a fetched transcript must have
pub const DEFAULT_MIN_CHARS: usize = 50;

/// One timed caption line as delivered by a source
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSegment {
    pub text: String,
    /// Start offset in seconds
    pub start: f64,
    /// Duration in seconds
    pub duration: f64,
}

impl CaptionSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// Join segment texts with single spaces and trim the result
pub fn join_segments(segments: &[CaptionSegment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Outcome of a single tier attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SourceAttempt {
    Success(String),
    Empty,
    Failed(SourceError),
}

/// A tier in the retrieval cascade
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Short tier name used in logs and results
    fn name(&self) -> &'static str;

    /// Try to produce the full transcript text for a video
    async fn attempt(&self, video_id: &VideoId) -> SourceAttempt;
}

/// Rejects fetched text that is too short to be a real transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityGate {
    pub min_chars: usize,
}

impl QualityGate {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    pub fn check(&self, text: &str) -> Result<String, SourceError> {
        let trimmed = text.trim();
        let chars = trimmed.chars().count();
        if chars < self.min_chars {
            return Err(SourceError::LowQuality {
                chars,
                min: self.min_chars,
            });
        }
        Ok(trimmed.to_string())
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CHARS)
    }
}
