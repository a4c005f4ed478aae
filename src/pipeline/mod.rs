use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::Instrument;

use crate::cache::StaticTranscriptCache;
use crate::config::Config;
use crate::identifier::{self, VideoId};
use crate::sources::innertube::InnertubeCaptionService;
use crate::sources::{
    MirrorSource, PrimarySource, QualityGate, ReqwestFetcher, ScrapeSource, SourceAttempt,
    TranscriptSource,
};
use crate::TranscriptError;

/// Source name reported for cache hits
pub const CACHE_SOURCE: &str = "cache";

/// A finished transcript for one video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    pub video_id: VideoId,
    #[serde(rename = "transcript")]
    pub full_text: String,
    /// Tier that produced the text
    pub source: &'static str,
    pub retrieved_at: DateTime<Utc>,
}

impl Transcript {
    fn new(video_id: &VideoId, full_text: String, source: &'static str) -> Self {
        Self {
            video_id: video_id.clone(),
            full_text,
            source,
            retrieved_at: Utc::now(),
        }
    }
}

/// Runs the cache check and then each source tier in a fixed order
pub struct TranscriptPipeline {
    cache: StaticTranscriptCache,
    sources: Vec<Box<dyn TranscriptSource>>,
}

impl TranscriptPipeline {
    pub fn new(cache: StaticTranscriptCache, sources: Vec<Box<dyn TranscriptSource>>) -> Self {
        Self { cache, sources }
    }

    /// Build the production pipeline; disabled tiers are left out here, once
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let cache = if config.cache.enabled {
            StaticTranscriptCache::builtin()
        } else {
            StaticTranscriptCache::empty()
        };
        let gate = QualityGate::new(config.sources.min_transcript_chars);
        let mut sources: Vec<Box<dyn TranscriptSource>> = Vec::new();

        if config.sources.primary {
            let http = ReqwestFetcher::new(&config.http.page_profile())
                .context("Failed to build HTTP client for the caption service")?;
            let service =
                InnertubeCaptionService::new(Arc::new(http), config.sources.preferred_languages.clone());
            sources.push(Box::new(
                PrimarySource::new(Box::new(service))
                    .with_fallback_language(config.sources.fallback_language.clone()),
            ));
        }

        if config.sources.mirrors && !config.mirrors.is_empty() {
            let http = ReqwestFetcher::new(&config.http.mirror_profile())
                .context("Failed to build HTTP client for mirrors")?;
            sources.push(Box::new(MirrorSource::new(
                Arc::new(http),
                config.mirror_descriptors(),
                gate,
            )));
        }

        if config.sources.scrape {
            let http = ReqwestFetcher::new(&config.http.page_profile())
                .context("Failed to build HTTP client for page scraping")?;
            sources.push(Box::new(ScrapeSource::new(
                Arc::new(http),
                config.retry.policy(),
                gate,
            )));
        }

        let pipeline = Self::new(cache, sources);
        tracing::debug!(
            "Transcript pipeline ready: cache with {} entries, tiers [{}]",
            pipeline.cache.len(),
            pipeline.source_names().join(", ")
        );
        Ok(pipeline)
    }

    /// Tier names in the order they are tried
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    pub fn cache(&self) -> &StaticTranscriptCache {
        &self.cache
    }

    /// Extract the video id from `url` and fetch its transcript
    pub async fn get_transcript(&self, url: &str) -> Result<Transcript, TranscriptError> {
        let video_id = identifier::extract(url).map_err(|e| {
            tracing::warn!("Rejected URL {:?}: {}", url, e);
            e
        })?;
        self.get_transcript_for(&video_id).await
    }

    /// Fetch the transcript for an already validated id
    pub async fn get_transcript_for(&self, video_id: &VideoId) -> Result<Transcript, TranscriptError> {
        if let Some(text) = self.cache.lookup(video_id) {
            tracing::info!("Serving transcript for {} from the static cache", video_id);
            return Ok(Transcript::new(video_id, text.to_string(), CACHE_SOURCE));
        }

        let mut last_cause: Option<String> = None;

        for source in &self.sources {
            let tier = source.name();
            let span = tracing::info_span!("tier", video_id = %video_id, tier);
            let attempt = source.attempt(video_id).instrument(span).await;

            match attempt {
                SourceAttempt::Success(text) if !text.trim().is_empty() => {
                    tracing::info!(
                        "Transcript for {} retrieved from {} ({} chars)",
                        video_id,
                        tier,
                        text.chars().count()
                    );
                    return Ok(Transcript::new(video_id, text.trim().to_string(), tier));
                }
                SourceAttempt::Success(_) | SourceAttempt::Empty => {
                    tracing::warn!(video_id = %video_id, tier, "Source returned no text");
                    last_cause = Some(format!("{} returned no text", tier));
                }
                SourceAttempt::Failed(e) if e.is_structural() => {
                    tracing::warn!(
                        video_id = %video_id,
                        tier,
                        "{}; trying remaining sources",
                        e
                    );
                    last_cause = Some(format!("{}: {}", tier, e));
                }
                SourceAttempt::Failed(e) => {
                    tracing::warn!(video_id = %video_id, tier, "Source failed: {}", e);
                    last_cause = Some(format!("{}: {}", tier, e));
                }
            }
        }

        tracing::error!("All transcript sources exhausted for {}", video_id);
        Err(TranscriptError::AllSourcesExhausted {
            video_id: video_id.to_string(),
            last_cause: last_cause.unwrap_or_else(|| "no transcript sources are enabled".to_string()),
        })
    }
}
