//! Last-resort tier: read captions straight out of the public video page.
//!
//! This depends on unversioned page markup and is the lowest-confidence
//! source in the cascade. Both heuristics here are best effort.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use url::Url;

use super::http::HttpFetcher;
use super::retry::RetryPolicy;
use super::{join_segments, timedtext, QualityGate, SourceAttempt, TranscriptSource};
use crate::identifier::VideoId;
use crate::utils::{decode_basic_entities, unescape_embedded_url};
use crate::SourceError;

const WATCH_PAGE: &str = "https://www.youtube.com/watch";
const CAPTION_MARKER: &str = "\"captionTracks\":";

lazy_static! {
    static ref INLINE_SCRIPT: Regex = Regex::new(r"(?s)<script[^>]*>(.*?)</script>").unwrap();
    static ref BASE_URL: Regex = Regex::new(r#""baseUrl":\s*"([^"]+)""#).unwrap();
    static ref SEGMENT_TEXT: Regex =
        Regex::new(r#"(?s)<[a-z-]+[^>]*\bclass="[^"]*\bsegment-text\b[^"]*"[^>]*>(.*?)</"#).unwrap();
    static ref MARKUP: Regex = Regex::new(r"<[^>]+>").unwrap();
}

/// Page-scraping tier with bounded retries on the page fetch
pub struct ScrapeSource {
    http: Arc<dyn HttpFetcher>,
    retry: RetryPolicy,
    gate: QualityGate,
}

impl ScrapeSource {
    pub fn new(http: Arc<dyn HttpFetcher>, retry: RetryPolicy, gate: QualityGate) -> Self {
        Self { http, retry, gate }
    }

    async fn fetch_page(&self, video_id: &VideoId) -> Result<String, SourceError> {
        let url = Url::parse_with_params(WATCH_PAGE, &[("v", video_id.as_str())])
            .map_err(|e| SourceError::unavailable(format!("Bad watch URL: {}", e)))?;
        let http = &self.http;
        let url = url.as_str();

        self.retry
            .run("watch page fetch", |_| async move {
                http.get(url).await?.into_success("watch page")
            })
            .await
    }

    async fn from_caption_tracks(&self, page: &str) -> Result<String, SourceError> {
        let track_url = caption_track_url(page)
            .ok_or_else(|| SourceError::unavailable("no caption metadata in page scripts"))?;
        tracing::debug!("Found embedded caption track {}", track_url);

        let xml = self
            .http
            .get(&track_url)
            .await?
            .into_success("timed-text track")?;
        self.gate.check(&join_segments(&timedtext::parse(&xml)))
    }
}

/// First caption track URL found in an inline script carrying caption metadata
fn caption_track_url(page: &str) -> Option<String> {
    INLINE_SCRIPT
        .captures_iter(page)
        .filter_map(|script| {
            let body = script.get(1)?.as_str();
            let start = body.find(CAPTION_MARKER)? + CAPTION_MARKER.len();
            BASE_URL
                .captures(&body[start..])
                .map(|c| unescape_embedded_url(&c[1]))
        })
        .next()
}

/// Text of every element whose class marks it as a transcript segment
fn segment_text_scan(page: &str) -> String {
    SEGMENT_TEXT
        .captures_iter(page)
        .map(|c| decode_basic_entities(MARKUP.replace_all(&c[1], "").trim()))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl TranscriptSource for ScrapeSource {
    fn name(&self) -> &'static str {
        "scrape"
    }

    async fn attempt(&self, video_id: &VideoId) -> SourceAttempt {
        let page = match self.fetch_page(video_id).await {
            Ok(page) => page,
            Err(e) => return SourceAttempt::Failed(e),
        };

        let caption_error = match self.from_caption_tracks(&page).await {
            Ok(text) => return SourceAttempt::Success(text),
            Err(e) => e,
        };
        tracing::warn!(
            video_id = %video_id,
            tier = "scrape",
            "Embedded caption tracks unusable ({}), scanning page segments",
            caption_error
        );

        match self.gate.check(&segment_text_scan(&page)) {
            Ok(text) => SourceAttempt::Success(text),
            Err(e) => {
                tracing::warn!(
                    video_id = %video_id,
                    tier = "scrape",
                    "Segment scan failed: {}",
                    e
                );
                SourceAttempt::Failed(caption_error)
            }
        }
    }
}
