use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::http::HttpFetcher;
use super::primary::{CaptionService, CaptionTrack};
use super::{timedtext, CaptionSegment};
use crate::identifier::VideoId;
use crate::SourceError;

const WATCH_URL: &str = "https://www.youtube.com/watch?v={video_id}";
const PLAYER_API_URL: &str = "https://www.youtube.com/youtubei/v1/player?key={api_key}";

lazy_static! {
    static ref API_KEY: Regex = Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).unwrap();
    static ref API_KEY_FALLBACK: Regex = Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).unwrap();
}

type TrackListing = (VideoId, Result<Vec<CaptionTrack>, SourceError>);

/// Caption service that talks to the video platform's player API.
///
/// `fetch_default` always loads a fresh track list. The `fetch_language` and
/// `list_tracks` calls that follow it for the same video reuse that list, as
/// long as it was loaded or failed with a structural error.
pub struct InnertubeCaptionService {
    http: Arc<dyn HttpFetcher>,
    preferred_languages: Vec<String>,
    last_listing: Mutex<Option<TrackListing>>,
}

impl InnertubeCaptionService {
    pub fn new(http: Arc<dyn HttpFetcher>, preferred_languages: Vec<String>) -> Self {
        Self {
            http,
            preferred_languages,
            last_listing: Mutex::new(None),
        }
    }

    fn listing(&self) -> MutexGuard<'_, Option<TrackListing>> {
        self.last_listing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn load_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>, SourceError> {
        let player = self.player_response(video_id).await?;
        check_playability(&player)?;
        let tracks = parse_tracks(&player)?;
        tracing::debug!("Caption service lists {} tracks for {}", tracks.len(), video_id);
        Ok(tracks)
    }

    async fn tracks_for(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>, SourceError> {
        let cached = self
            .listing()
            .as_ref()
            .filter(|(id, _)| id == video_id)
            .map(|(_, listing)| listing.clone());
        if let Some(listing) = cached {
            tracing::debug!("Reusing caption track list for {}", video_id);
            return listing;
        }

        let listing = self.load_tracks(video_id).await;
        let reusable = match &listing {
            Ok(_) => true,
            Err(e) => e.is_structural(),
        };
        *self.listing() = reusable.then(|| (video_id.clone(), listing.clone()));
        listing
    }

    async fn watch_page(&self, video_id: &VideoId) -> Result<String, SourceError> {
        let url = WATCH_URL.replace("{video_id}", video_id.as_str());
        let html = self.http.get(&url).await?.into_success("watch page")?;

        if html.contains("class=\"g-recaptcha\"") {
            return Err(SourceError::unavailable("watch page answered with a captcha"));
        }
        Ok(html)
    }

    async fn player_response(&self, video_id: &VideoId) -> Result<Value, SourceError> {
        let html = self.watch_page(video_id).await?;
        let api_key = extract_api_key(&html)
            .ok_or_else(|| SourceError::unavailable("player API key not found in watch page"))?;

        let url = PLAYER_API_URL.replace("{api_key}", &api_key);
        let request = json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": "20.10.38"
                }
            },
            "videoId": video_id.as_str()
        });

        let body = self
            .http
            .post_json(&url, &request)
            .await?
            .into_success("player API")?;

        serde_json::from_str(&body)
            .map_err(|e| SourceError::unavailable(format!("Malformed player response: {}", e)))
    }

    async fn fetch_preferred(
        &self,
        video_id: &VideoId,
        languages: &[String],
    ) -> Result<Vec<CaptionSegment>, SourceError> {
        let tracks = self.tracks_for(video_id).await?;
        let track = pick_track(&tracks, languages).ok_or(SourceError::NoTranscriptFound)?;
        self.fetch_track(track).await
    }
}

#[async_trait]
impl CaptionService for InnertubeCaptionService {
    async fn fetch_default(&self, video_id: &VideoId) -> Result<Vec<CaptionSegment>, SourceError> {
        self.listing().take();
        self.fetch_preferred(video_id, &self.preferred_languages).await
    }

    async fn fetch_language(
        &self,
        video_id: &VideoId,
        language: &str,
    ) -> Result<Vec<CaptionSegment>, SourceError> {
        self.fetch_preferred(video_id, &[language.to_string()]).await
    }

    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>, SourceError> {
        self.tracks_for(video_id).await
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<CaptionSegment>, SourceError> {
        let xml = self
            .http
            .get(&track.base_url)
            .await?
            .into_success("timed-text track")?;
        Ok(timedtext::parse(&xml))
    }
}

fn extract_api_key(html: &str) -> Option<String> {
    API_KEY
        .captures(html)
        .or_else(|| API_KEY_FALLBACK.captures(html))
        .map(|c| c[1].to_string())
}

fn check_playability(player: &Value) -> Result<(), SourceError> {
    let Some(status) = player.pointer("/playabilityStatus/status").and_then(Value::as_str) else {
        return Ok(());
    };
    if status == "OK" {
        return Ok(());
    }
    let reason = player
        .pointer("/playabilityStatus/reason")
        .and_then(Value::as_str)
        .unwrap_or("no reason given");
    Err(SourceError::unavailable(format!("Video not playable ({}): {}", status, reason)))
}

/// Read caption tracks out of a player response
fn parse_tracks(player: &Value) -> Result<Vec<CaptionTrack>, SourceError> {
    let renderer = player
        .pointer("/captions/playerCaptionsTracklistRenderer")
        .ok_or(SourceError::TranscriptsDisabled)?;

    let tracks: Vec<CaptionTrack> = renderer
        .get("captionTracks")
        .and_then(Value::as_array)
        .map(|tracks| tracks.iter().filter_map(parse_track).collect())
        .unwrap_or_default();

    if tracks.is_empty() {
        return Err(SourceError::NoTranscriptFound);
    }
    Ok(tracks)
}

fn parse_track(track: &Value) -> Option<CaptionTrack> {
    let language_code = track.get("languageCode")?.as_str()?.to_string();
    let base_url = track.get("baseUrl")?.as_str()?.replace("&fmt=srv3", "");
    let name = track
        .pointer("/name/runs/0/text")
        .or_else(|| track.pointer("/name/simpleText"))
        .and_then(Value::as_str)
        .unwrap_or(&language_code)
        .to_string();
    let is_generated = track.get("kind").and_then(Value::as_str) == Some("asr");

    Some(CaptionTrack {
        language_code,
        name,
        base_url,
        is_generated,
    })
}

/// Manually created tracks win over generated ones for each language, in order
fn pick_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|language| {
        tracks
            .iter()
            .find(|t| &t.language_code == language && !t.is_generated)
            .or_else(|| tracks.iter().find(|t| &t.language_code == language))
    })
}
