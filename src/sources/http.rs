use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;

use crate::SourceError;

/// Desktop browser user agent used for page requests
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into a transport failure
    pub fn into_success(self, what: &str) -> Result<String, SourceError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(SourceError::unavailable(format!("{} returned HTTP {}", what, self.status)))
        }
    }
}

/// Minimal HTTP surface the sources need
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, SourceError>;

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, SourceError>;
}

/// Client settings for one family of requests
#[derive(Debug, Clone)]
pub struct HttpProfile {
    pub timeout: Duration,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
    pub headers: Vec<(String, String)>,
}

impl HttpProfile {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            timeout,
            user_agent: user_agent.into(),
            accept_invalid_certs: false,
            headers: Vec::new(),
        }
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// `HttpFetcher` backed by reqwest
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(profile: &HttpProfile) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &profile.headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        let client = Client::builder()
            .timeout(profile.timeout)
            .user_agent(profile.user_agent.as_str())
            .default_headers(headers)
            .danger_accept_invalid_certs(profile.accept_invalid_certs)
            .build()?;

        Ok(Self { client })
    }

    async fn read(response: reqwest::Response) -> Result<HttpResponse, SourceError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::unavailable(format!("Failed to read body: {}", e)))?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse, SourceError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::unavailable(describe_transport_error(&e)))?;
        Self::read(response).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, SourceError> {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| SourceError::unavailable(describe_transport_error(&e)))?;
        Self::read(response).await
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("Request timed out: {}", error)
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        format!("Request failed: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_success() {
        assert_eq!(HttpResponse::new(200, "ok").into_success("page").unwrap(), "ok");
        assert_eq!(
            HttpResponse::new(503, "").into_success("mirror"),
            Err(SourceError::Unavailable("mirror returned HTTP 503".to_string()))
        );
    }

    #[test]
    fn test_fetcher_builds_from_profile() {
        let profile = HttpProfile::new(Duration::from_secs(12), BROWSER_USER_AGENT)
            .accept_invalid_certs(true)
            .header("Accept-Language", "en-US,en;q=0.9");
        assert!(ReqwestFetcher::new(&profile).is_ok());
    }

    #[test]
    fn test_fetcher_rejects_bad_header() {
        let profile = HttpProfile::new(Duration::from_secs(1), "agent").header("bad header", "x");
        assert!(ReqwestFetcher::new(&profile).is_err());
    }
}
