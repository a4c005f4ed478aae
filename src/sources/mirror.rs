use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::http::HttpFetcher;
use super::{QualityGate, SourceAttempt, TranscriptSource};
use crate::identifier::VideoId;
use crate::utils::{extract_domain, preview};
use crate::SourceError;

/// Pulls transcript text out of a mirror's JSON body
pub type TextExtractor = fn(&Value) -> Option<String>;

/// Response layouts the known mirrors use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorShape {
    /// Text under a top-level `description` key
    Description,
    /// `captions` array whose `label` fields are joined with newlines
    CaptionLabels,
}

impl MirrorShape {
    pub fn extractor(self) -> TextExtractor {
        match self {
            MirrorShape::Description => description_text,
            MirrorShape::CaptionLabels => caption_labels_text,
        }
    }
}

fn description_text(body: &Value) -> Option<String> {
    body.get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn caption_labels_text(body: &Value) -> Option<String> {
    let labels: Vec<&str> = body
        .get("captions")?
        .as_array()?
        .iter()
        .filter_map(|caption| caption.get("label").and_then(Value::as_str))
        .collect();
    Some(labels.join("\n"))
}

/// One mirror endpoint and how to read it
#[derive(Clone)]
pub struct MirrorDescriptor {
    pub name: String,
    /// URL with a `{video_id}` placeholder
    pub url_template: String,
    pub extract: TextExtractor,
}

impl MirrorDescriptor {
    pub fn new(name: impl Into<String>, url_template: impl Into<String>, shape: MirrorShape) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            extract: shape.extractor(),
        }
    }

    pub fn url_for(&self, video_id: &VideoId) -> String {
        self.url_template
            .replace("{video_id}", &urlencoding::encode(video_id.as_str()))
    }
}

impl std::fmt::Debug for MirrorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorDescriptor")
            .field("name", &self.name)
            .field("url_template", &self.url_template)
            .finish()
    }
}

/// Tier that asks each mirror in turn and keeps the first usable answer
pub struct MirrorSource {
    http: Arc<dyn HttpFetcher>,
    mirrors: Vec<MirrorDescriptor>,
    gate: QualityGate,
}

impl MirrorSource {
    pub fn new(http: Arc<dyn HttpFetcher>, mirrors: Vec<MirrorDescriptor>, gate: QualityGate) -> Self {
        Self { http, mirrors, gate }
    }

    async fn query(&self, mirror: &MirrorDescriptor, video_id: &VideoId) -> Result<String, SourceError> {
        let url = mirror.url_for(video_id);
        let body = self.http.get(&url).await?.into_success(&mirror.name)?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|e| SourceError::unavailable(format!("{} returned malformed JSON: {}", mirror.name, e)))?;
        let text = (mirror.extract)(&json).unwrap_or_default();
        self.gate.check(&text)
    }
}

#[async_trait]
impl TranscriptSource for MirrorSource {
    fn name(&self) -> &'static str {
        "mirrors"
    }

    async fn attempt(&self, video_id: &VideoId) -> SourceAttempt {
        let mut last_error = None;

        for mirror in &self.mirrors {
            match self.query(mirror, video_id).await {
                Ok(text) => {
                    tracing::info!(
                        "Mirror {} ({}) returned {} chars for {}: {}",
                        mirror.name,
                        extract_domain(&mirror.url_template).unwrap_or_default(),
                        text.chars().count(),
                        video_id,
                        preview(&text, 60)
                    );
                    return SourceAttempt::Success(text);
                }
                Err(e) => {
                    tracing::warn!(
                        video_id = %video_id,
                        tier = "mirrors",
                        mirror = %mirror.name,
                        "Mirror attempt failed: {}",
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => SourceAttempt::Failed(e),
            None => SourceAttempt::Failed(SourceError::unavailable("no mirrors configured")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::http::{HttpResponse, MockHttpFetcher};
    use serde_json::json;

    fn video() -> VideoId {
        VideoId::new("dQw4w9WgXcQ").unwrap()
    }

    fn mirrors() -> Vec<MirrorDescriptor> {
        vec![
            MirrorDescriptor::new("first", "https://one.example/api/v1/videos/{video_id}", MirrorShape::Description),
            MirrorDescriptor::new("second", "https://two.example/api/v1/videos/{video_id}", MirrorShape::Description),
        ]
    }

    fn description_body(text: &str) -> HttpResponse {
        HttpResponse::new(200, json!({ "description": text }).to_string())
    }

    #[test]
    fn test_extractors() {
        let body = json!({"description": "plain text"});
        assert_eq!(MirrorShape::Description.extractor()(&body).as_deref(), Some("plain text"));

        let body = json!({"captions": [{"label": "English"}, {"label": "Deutsch"}, {"code": "x"}]});
        assert_eq!(
            MirrorShape::CaptionLabels.extractor()(&body).as_deref(),
            Some("English\nDeutsch")
        );
        assert_eq!(MirrorShape::CaptionLabels.extractor()(&json!({})), None);
    }

    #[test]
    fn test_url_for() {
        let mirror = MirrorDescriptor::new("m", "https://m.example/captions?id={video_id}", MirrorShape::Description);
        assert_eq!(mirror.url_for(&video()), "https://m.example/captions?id=dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn test_short_result_falls_through_to_next_mirror() {
        let short = "a".repeat(40);
        let long = "b".repeat(200);
        let long_clone = long.clone();

        let mut http = MockHttpFetcher::new();
        http.expect_get()
            .withf(|url| url.starts_with("https://one.example"))
            .times(1)
            .returning(move |_| Ok(description_body(&short)));
        http.expect_get()
            .withf(|url| url.starts_with("https://two.example"))
            .times(1)
            .returning(move |_| Ok(description_body(&long_clone)));

        let source = MirrorSource::new(Arc::new(http), mirrors(), QualityGate::default());
        assert_eq!(source.attempt(&video()).await, SourceAttempt::Success(long));
    }

    #[tokio::test]
    async fn test_http_and_json_failures_fall_through() {
        let mut http = MockHttpFetcher::new();
        http.expect_get()
            .withf(|url| url.starts_with("https://one.example"))
            .returning(|_| Ok(HttpResponse::new(502, "bad gateway")));
        http.expect_get()
            .withf(|url| url.starts_with("https://two.example"))
            .returning(|_| Ok(HttpResponse::new(200, "<html>not json</html>")));

        let source = MirrorSource::new(Arc::new(http), mirrors(), QualityGate::default());
        match source.attempt(&video()).await {
            SourceAttempt::Failed(SourceError::Unavailable(message)) => {
                assert!(message.contains("second returned malformed JSON"));
            }
            other => panic!("unexpected attempt result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_good_mirror_stops_the_walk() {
        let mut http = MockHttpFetcher::new();
        http.expect_get()
            .withf(|url| url.starts_with("https://one.example"))
            .returning(|_| Ok(description_body(&"c".repeat(80))));
        http.expect_get()
            .withf(|url| url.starts_with("https://two.example"))
            .times(0);

        let source = MirrorSource::new(Arc::new(http), mirrors(), QualityGate::default());
        assert!(matches!(source.attempt(&video()).await, SourceAttempt::Success(_)));
    }

    #[tokio::test]
    async fn test_no_mirrors() {
        let source = MirrorSource::new(Arc::new(MockHttpFetcher::new()), Vec::new(), QualityGate::default());
        assert!(matches!(source.attempt(&video()).await, SourceAttempt::Failed(_)));
    }
}
