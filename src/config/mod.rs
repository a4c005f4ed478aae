use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::http::BROWSER_USER_AGENT;
use crate::sources::{HttpProfile, MirrorDescriptor, MirrorShape, RetryPolicy, DEFAULT_MIN_CHARS};

const LOCAL_CONFIG: &str = "transcript-cascade.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP client settings
    pub http: HttpConfig,

    /// Which tiers run and how results are judged
    pub sources: SourcesConfig,

    /// Mirror endpoints, tried in order
    pub mirrors: Vec<MirrorConfig>,

    /// Retry policy for the page-scraping tier
    pub retry: RetryConfig,

    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent for page and caption requests
    pub user_agent: String,

    /// Timeout for page and caption requests
    pub page_timeout_secs: u64,

    /// Timeout for each mirror request
    pub mirror_timeout_secs: u64,

    /// Mirrors commonly run with self-issued certificates
    pub mirror_accept_invalid_certs: bool,

    pub accept_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub primary: bool,
    pub mirrors: bool,
    pub scrape: bool,

    /// Shorter results are treated as no result
    pub min_transcript_chars: usize,

    /// Languages the primary default fetch asks for
    pub preferred_languages: Vec<String>,

    /// Language requested explicitly when the default fetch fails
    pub fallback_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub name: String,

    /// Endpoint with a `{video_id}` placeholder
    pub url_template: String,

    pub shape: MirrorShape,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            sources: SourcesConfig::default(),
            mirrors: vec![
                MirrorConfig {
                    name: "invidious-videos".to_string(),
                    url_template: "https://invidious.nerdvpn.de/api/v1/videos/{video_id}".to_string(),
                    shape: MirrorShape::Description,
                },
                MirrorConfig {
                    name: "invidious-captions".to_string(),
                    url_template: "https://inv.nadeko.net/api/v1/captions/{video_id}".to_string(),
                    shape: MirrorShape::CaptionLabels,
                },
            ],
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            page_timeout_secs: 15,
            mirror_timeout_secs: 12,
            mirror_accept_invalid_certs: true,
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            primary: true,
            mirrors: true,
            scrape: true,
            min_transcript_chars: DEFAULT_MIN_CHARS,
            preferred_languages: vec!["en".to_string()],
            fallback_language: "en".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay_ms: 1000,
            multiplier: 2.0,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl HttpConfig {
    /// Browser-like profile for the watch page, player API and caption tracks
    pub fn page_profile(&self) -> HttpProfile {
        HttpProfile::new(Duration::from_secs(self.page_timeout_secs), self.user_agent.as_str())
            .header("Accept-Language", self.accept_language.as_str())
    }

    pub fn mirror_profile(&self) -> HttpProfile {
        HttpProfile::new(Duration::from_secs(self.mirror_timeout_secs), self.user_agent.as_str())
            .accept_invalid_certs(self.mirror_accept_invalid_certs)
            .header("Accept", "application/json")
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            self.multiplier,
        )
    }
}

impl Config {
    /// Load configuration from an explicit path, the usual locations, or defaults
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover_path(),
        };

        let config = match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;
        serde_yaml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// First existing config file: working directory, then the user config dir
    fn discover_path() -> Option<PathBuf> {
        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            return Some(local_config);
        }

        Self::user_config_path().filter(|path| path.exists())
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("transcript-cascade").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.sources.min_transcript_chars == 0 {
            anyhow::bail!("sources.min_transcript_chars must be at least 1");
        }

        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }

        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            anyhow::bail!("retry.multiplier must be a finite number of at least 1.0");
        }

        if self.sources.fallback_language.trim().is_empty() {
            anyhow::bail!("sources.fallback_language must not be empty");
        }

        for mirror in &self.mirrors {
            if !mirror.url_template.contains("{video_id}") {
                anyhow::bail!(
                    "Mirror {} url_template must contain a {{video_id}} placeholder",
                    mirror.name
                );
            }
        }

        Ok(())
    }

    pub fn mirror_descriptors(&self) -> Vec<MirrorDescriptor> {
        self.mirrors
            .iter()
            .map(|m| MirrorDescriptor::new(m.name.as_str(), m.url_template.as_str(), m.shape))
            .collect()
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Page timeout: {}s", self.http.page_timeout_secs);
        println!("  Mirror timeout: {}s", self.http.mirror_timeout_secs);
        println!("  Accept self-signed mirror certs: {}", self.http.mirror_accept_invalid_certs);
        println!(
            "  Tiers: primary={} mirrors={} scrape={}",
            self.sources.primary, self.sources.mirrors, self.sources.scrape
        );
        println!("  Minimum transcript length: {} chars", self.sources.min_transcript_chars);
        println!("  Preferred languages: {}", self.sources.preferred_languages.join(", "));
        println!("  Fallback language: {}", self.sources.fallback_language);
        println!(
            "  Scrape retries: {} attempts, {}ms base delay, x{}",
            self.retry.max_attempts, self.retry.base_delay_ms, self.retry.multiplier
        );
        println!("  Static cache: {}", if self.cache.enabled { "enabled" } else { "disabled" });
        println!("  Mirrors:");
        for mirror in &self.mirrors {
            println!("    - {} ({:?}): {}", mirror.name, mirror.shape, mirror.url_template);
        }
        if let Some(path) = Self::user_config_path() {
            println!("  User config file: {}", path.display());
        }
    }
}
