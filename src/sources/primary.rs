use async_trait::async_trait;

use super::{join_segments, CaptionSegment, SourceAttempt, TranscriptSource};
use crate::identifier::VideoId;
use crate::SourceError;

/// Language requested when the default fetch fails
pub const FALLBACK_LANGUAGE: &str = "en";

/// A caption track advertised by the caption service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub language_code: String,
    pub name: String,
    pub base_url: String,
    /// Automatic speech recognition track
    pub is_generated: bool,
}

/// Captions retrieval service behind the primary tier
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionService: Send + Sync {
    /// Fetch with the service's default language preferences
    async fn fetch_default(&self, video_id: &VideoId) -> Result<Vec<CaptionSegment>, SourceError>;

    /// Fetch the track for one specific language
    async fn fetch_language(
        &self,
        video_id: &VideoId,
        language: &str,
    ) -> Result<Vec<CaptionSegment>, SourceError>;

    /// List every caption track, in the order the service reports them
    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>, SourceError>;

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<CaptionSegment>, SourceError>;
}

/// First network tier: default fetch, then an explicit language, then any track
pub struct PrimarySource {
    service: Box<dyn CaptionService>,
    fallback_language: String,
}

impl PrimarySource {
    pub fn new(service: Box<dyn CaptionService>) -> Self {
        Self {
            service,
            fallback_language: FALLBACK_LANGUAGE.to_string(),
        }
    }

    pub fn with_fallback_language(mut self, language: impl Into<String>) -> Self {
        self.fallback_language = language.into();
        self
    }

    async fn fetch_any_track(&self, video_id: &VideoId) -> Result<Vec<CaptionSegment>, SourceError> {
        let tracks = self.service.list_tracks(video_id).await?;
        let track = tracks.first().ok_or(SourceError::NoTranscriptFound)?;
        tracing::debug!(
            "Using first listed caption track {} ({}) for {}",
            track.language_code,
            track.name,
            video_id
        );
        self.service.fetch_track(track).await
    }
}

/// Keeps the error worth reporting once every sub-attempt has failed
#[derive(Default)]
struct FailureTracker {
    structural: Option<SourceError>,
    last: Option<SourceError>,
}

impl FailureTracker {
    fn record(&mut self, video_id: &VideoId, step: &str, error: SourceError) {
        tracing::warn!(
            video_id = %video_id,
            tier = "primary",
            "{} fetch failed: {}",
            step,
            error
        );
        if error.is_structural() {
            self.structural = Some(error.clone());
        }
        self.last = Some(error);
    }

    fn into_error(self) -> SourceError {
        self.structural
            .or(self.last)
            .unwrap_or(SourceError::NoTranscriptFound)
    }
}

/// Empty segment lists count as a failed sub-attempt
fn non_empty(result: Result<Vec<CaptionSegment>, SourceError>) -> Result<String, SourceError> {
    let text = join_segments(&result?);
    if text.is_empty() {
        Err(SourceError::NoTranscriptFound)
    } else {
        Ok(text)
    }
}

#[async_trait]
impl TranscriptSource for PrimarySource {
    fn name(&self) -> &'static str {
        "primary"
    }

    async fn attempt(&self, video_id: &VideoId) -> SourceAttempt {
        let mut failures = FailureTracker::default();

        match non_empty(self.service.fetch_default(video_id).await) {
            Ok(text) => return SourceAttempt::Success(text),
            Err(e) => failures.record(video_id, "default", e),
        }

        let language = self.fallback_language.as_str();
        match non_empty(self.service.fetch_language(video_id, language).await) {
            Ok(text) => {
                tracing::info!("Fetched '{}' captions for {} after default fetch failed", language, video_id);
                return SourceAttempt::Success(text);
            }
            Err(e) => failures.record(video_id, language, e),
        }

        match non_empty(self.fetch_any_track(video_id).await) {
            Ok(text) => {
                tracing::info!("Fetched captions for {} from enumerated tracks", video_id);
                return SourceAttempt::Success(text);
            }
            Err(e) => failures.record(video_id, "all-tracks", e),
        }

        SourceAttempt::Failed(failures.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video() -> VideoId {
        VideoId::new("dQw4w9WgXcQ").unwrap()
    }

    fn segments(texts: &[&str]) -> Vec<CaptionSegment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| CaptionSegment::new(*text, i as f64, 1.0))
            .collect()
    }

    fn track(code: &str) -> CaptionTrack {
        CaptionTrack {
            language_code: code.to_string(),
            name: code.to_string(),
            base_url: format!("https://example.com/timedtext?lang={}", code),
            is_generated: false,
        }
    }

    #[tokio::test]
    async fn test_default_fetch_wins() {
        let mut service = MockCaptionService::new();
        service
            .expect_fetch_default()
            .times(1)
            .returning(|_| Ok(segments(&["Hello", "world"])));
        service.expect_fetch_language().times(0);
        service.expect_list_tracks().times(0);

        let source = PrimarySource::new(Box::new(service));
        assert_eq!(
            source.attempt(&video()).await,
            SourceAttempt::Success("Hello world".to_string())
        );
    }

    #[tokio::test]
    async fn test_language_fallback_skips_enumeration() {
        let mut service = MockCaptionService::new();
        service
            .expect_fetch_default()
            .returning(|_| Err(SourceError::unavailable("default failed")));
        service
            .expect_fetch_language()
            .withf(|id, language| id.as_str() == "dQw4w9WgXcQ" && language == "en")
            .times(1)
            .returning(|_, _| Ok(segments(&["english", "captions"])));
        service.expect_list_tracks().times(0);
        service.expect_fetch_track().times(0);

        let source = PrimarySource::new(Box::new(service));
        assert_eq!(
            source.attempt(&video()).await,
            SourceAttempt::Success("english captions".to_string())
        );
    }

    #[tokio::test]
    async fn test_enumeration_uses_first_track() {
        let mut service = MockCaptionService::new();
        service
            .expect_fetch_default()
            .returning(|_| Err(SourceError::NoTranscriptFound));
        service
            .expect_fetch_language()
            .returning(|_, _| Err(SourceError::NoTranscriptFound));
        service
            .expect_list_tracks()
            .returning(|_| Ok(vec![track("de"), track("fr")]));
        service
            .expect_fetch_track()
            .withf(|t| t.language_code == "de")
            .times(1)
            .returning(|_| Ok(segments(&["Hallo", "Welt"])));

        let source = PrimarySource::new(Box::new(service));
        assert_eq!(
            source.attempt(&video()).await,
            SourceAttempt::Success("Hallo Welt".to_string())
        );
    }

    #[tokio::test]
    async fn test_structural_error_preserved() {
        let mut service = MockCaptionService::new();
        service
            .expect_fetch_default()
            .returning(|_| Err(SourceError::TranscriptsDisabled));
        service
            .expect_fetch_language()
            .returning(|_, _| Err(SourceError::unavailable("timeout")));
        service
            .expect_list_tracks()
            .returning(|_| Err(SourceError::unavailable("timeout")));

        let source = PrimarySource::new(Box::new(service));
        assert_eq!(
            source.attempt(&video()).await,
            SourceAttempt::Failed(SourceError::TranscriptsDisabled)
        );
    }

    #[tokio::test]
    async fn test_no_tracks_is_not_found() {
        let mut service = MockCaptionService::new();
        service
            .expect_fetch_default()
            .returning(|_| Err(SourceError::unavailable("down")));
        service
            .expect_fetch_language()
            .returning(|_, _| Ok(Vec::new()));
        service.expect_list_tracks().returning(|_| Ok(Vec::new()));
        service.expect_fetch_track().times(0);

        let source = PrimarySource::new(Box::new(service)).with_fallback_language("en");
        assert_eq!(
            source.attempt(&video()).await,
            SourceAttempt::Failed(SourceError::NoTranscriptFound)
        );
    }
}
