//! Transcript Cascade - fetch caption transcripts for video URLs
//!
//! This library turns a video URL into a plain-text transcript by trying a fixed
//! chain of caption sources: a static demonstration cache, the primary caption
//! service, a list of HTTP mirrors and finally a page-scraping fallback.

pub mod cache;
pub mod cli;
pub mod config;
pub mod identifier;
pub mod output;
pub mod pipeline;
pub mod sources;
pub mod utils;

pub use cache::StaticTranscriptCache;
pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use identifier::{UrlShape, VideoId};
pub use pipeline::{Transcript, TranscriptPipeline};
pub use sources::{CaptionSegment, SourceAttempt, TranscriptSource};

/// Result type used by the application layer
pub type Result<T> = anyhow::Result<T>;

/// Failures surfaced to callers of the pipeline
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    #[error("No transcript available for video {video_id}: {last_cause}")]
    AllSourcesExhausted { video_id: String, last_cause: String },
}

/// Failures raised inside a single source tier
///
/// These never reach the caller directly; the pipeline logs them and moves on
/// to the next tier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Transcripts are disabled for this video")]
    TranscriptsDisabled,

    #[error("No transcript found for this video")]
    NoTranscriptFound,

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Result too short ({chars} chars, need at least {min})")]
    LowQuality { chars: usize, min: usize },
}

impl SourceError {
    /// Structural errors describe the video itself rather than the transport.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SourceError::TranscriptsDisabled | SourceError::NoTranscriptFound
        )
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        SourceError::Unavailable(message.into())
    }
}
