//! Configuration management

use crate::client::IdentitySelector;
use crate::error::{Result, SignalError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Account the original deployment follows when no selector is configured.
pub const DEFAULT_USER_ID: &str = "107780257626128497";
pub const DEFAULT_POSTS_URL: &str = "https://api.scrapecreators.com/v1/truthsocial/user/posts";
pub const DEFAULT_SENTIMENT_URL: &str =
    "https://api-inference.huggingface.co/models/cardiffnlp/twitter-roberta-base-sentiment-latest";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub posts: PostsApiConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostsApiConfig {
    /// ScrapeCreators key, sent as `x-api-key`
    pub api_key: String,
    /// Posts endpoint
    pub base_url: String,
    /// Numeric account id (preferred, cheaper lookup)
    pub user_id: Option<String>,
    /// Account handle, used instead of `user_id`
    pub handle: Option<String>,
    /// Ask the API for trimmed post payloads
    pub trim: bool,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum pages walked per fetch
    pub max_pages: u32,
    /// Upper bound for a whole paginated fetch, retries included
    pub deadline_secs: u64,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// Delay before the first retry (ms), doubled on each further retry
    pub base_delay_ms: u64,
    /// Cap for a single backoff delay (ms)
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentBackend {
    #[default]
    Lexicon,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub backend: SentimentBackend,
    /// Posts classified in parallel
    pub concurrency: usize,
    pub remote: RemoteSentimentConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteSentimentConfig {
    /// Hosted inference endpoint
    pub endpoint: String,
    /// Bearer token
    pub api_token: String,
    /// Top label score below which the result is forced to neutral
    pub min_confidence: f64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
    /// Comma separated CORS origins, `*` for any
    pub allowed_origins: String,
    /// Signals returned when the request has no `limit`
    pub default_limit: usize,
}

impl Config {
    /// Load configuration from file, `.env` and environment
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let raw = path.as_ref().to_string_lossy();
        let expanded = shellexpand::tilde(raw.as_ref());

        let settings = config::Config::builder()
            .add_source(config::File::with_name(expanded.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("TRUTH_SIGNALS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option(
                "posts.api_key",
                legacy_env(&["TRUTH_SOCIAL_API_KEY", "SCRAPECREATORS_API_KEY"]),
            )?
            .set_override_option("posts.base_url", legacy_env(&["TRUTH_SOCIAL_BASE_URL"]))?
            .set_override_option("server.allowed_origins", legacy_env(&["ALLOWED_ORIGINS"]))?
            .set_override_option("sentiment.remote.api_token", legacy_env(&["HF_API_TOKEN"]))?
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on anything the pipeline cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.posts.api_key.trim().is_empty() {
            return Err(SignalError::Config(
                "missing posts API key, set TRUTH_SOCIAL_API_KEY or posts.api_key".into(),
            ));
        }
        if !self.posts.base_url.starts_with("http://") && !self.posts.base_url.starts_with("https://") {
            return Err(SignalError::Config(format!(
                "posts.base_url must be an http(s) URL, got {:?}",
                self.posts.base_url
            )));
        }
        self.posts.identity()?;
        if self.posts.max_pages == 0 {
            return Err(SignalError::Config("posts.max_pages must be at least 1".into()));
        }
        if self.posts.timeout_secs == 0 {
            return Err(SignalError::Config("posts.timeout_secs must be at least 1".into()));
        }
        if self.posts.deadline_secs == 0 {
            return Err(SignalError::Config("posts.deadline_secs must be at least 1".into()));
        }
        if self.sentiment.concurrency == 0 {
            return Err(SignalError::Config("sentiment.concurrency must be at least 1".into()));
        }
        if self.sentiment.backend == SentimentBackend::Remote {
            let remote = &self.sentiment.remote;
            if remote.api_token.trim().is_empty() {
                return Err(SignalError::Config(
                    "remote sentiment backend selected but no API token configured".into(),
                ));
            }
            if remote.timeout_secs == 0 {
                return Err(SignalError::Config(
                    "sentiment.remote.timeout_secs must be at least 1".into(),
                ));
            }
            if !(0.0..=1.0).contains(&remote.min_confidence) {
                return Err(SignalError::Config(format!(
                    "sentiment.remote.min_confidence must be within [0, 1], got {}",
                    remote.min_confidence
                )));
            }
        }
        if self.server.default_limit == 0 {
            return Err(SignalError::Config("server.default_limit must be at least 1".into()));
        }
        Ok(())
    }
}

impl PostsApiConfig {
    /// Account selector for the fetch; falls back to [`DEFAULT_USER_ID`] when neither is set
    pub fn identity(&self) -> Result<IdentitySelector> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        if blank(&self.user_id) && blank(&self.handle) {
            return Ok(IdentitySelector::UserId(DEFAULT_USER_ID.to_string()));
        }
        IdentitySelector::from_parts(self.user_id.as_deref(), self.handle.as_deref())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl RetryConfig {
    /// Backoff before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(16);
        let delay = self.base_delay_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl ServerConfig {
    /// Parsed CORS allow-list; empty means any origin
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty() && *o != "*")
            .map(str::to_string)
            .collect()
    }
}

fn legacy_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

impl Default for PostsApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_POSTS_URL.to_string(),
            user_id: None,
            handle: None,
            trim: true,
            timeout_secs: 10,
            max_pages: 1,
            deadline_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 4000,
        }
    }
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            backend: SentimentBackend::Lexicon,
            concurrency: 4,
            remote: RemoteSentimentConfig::default(),
        }
    }
}

impl Default for RemoteSentimentConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SENTIMENT_URL.to_string(),
            api_token: String::new(),
            min_confidence: 0.6,
            timeout_secs: 10,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            allowed_origins: "*".to_string(),
            default_limit: 4,
        }
    }
}
