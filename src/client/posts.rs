//! Paged access to the posts endpoint

use super::IdentitySelector;
use crate::config::{PostsApiConfig, RetryConfig};
use crate::error::{Result, SignalError};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Longest slice of an error payload carried into an error message
const MAX_ERROR_BODY: usize = 300;

/// Posts API client. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct PostsClient {
    http: Client,
    base_url: String,
    api_key: String,
    retry: RetryConfig,
}

/// Parameters for a single page fetch
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub identity: IdentitySelector,
    /// `next_max_id` returned by the previous page
    pub cursor: Option<String>,
    pub trim: bool,
    /// Per-attempt request timeout
    pub timeout: Duration,
}

/// One page of raw records as returned by the API
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    pub posts: Vec<RawPost>,
    pub next_cursor: Option<String>,
}

/// Post record as it appears on the wire. Every field is optional here;
/// the ingester decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPost {
    #[serde(default, deserialize_with = "opaque_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl PageRequest {
    pub fn first(identity: IdentitySelector, trim: bool, timeout: Duration) -> Self {
        Self {
            identity,
            cursor: None,
            trim,
            timeout,
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let (key, value) = self.identity.query_pair();
        let mut params = vec![("trim", self.trim.to_string()), (key, value.to_string())];
        if let Some(cursor) = self.cursor.as_deref().filter(|c| !c.is_empty()) {
            params.push(("next_max_id", cursor.to_string()));
        }
        params
    }
}

impl PostsClient {
    /// Create a new posts client. The key is checked per call so a missing
    /// key still fails before any request goes out.
    pub fn new(config: &PostsApiConfig) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| SignalError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            retry: config.retry.clone(),
        })
    }

    /// Fetch one page, retrying transient failures within the retry budget
    pub async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult> {
        if self.api_key.trim().is_empty() {
            return Err(SignalError::Config(
                "missing posts API key, set TRUTH_SOCIAL_API_KEY".into(),
            ));
        }

        let params = request.query();
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                "Fetching posts for {} (cursor: {:?}, attempt {}/{})",
                request.identity, request.cursor, attempt, max_attempts
            );

            match self.send_once(&params, request.timeout).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Posts API attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt, max_attempts, e, delay
                    );
                    sleep(delay).await;
                }
                Err(SignalError::RateLimited { .. }) => {
                    return Err(SignalError::RateLimited { attempts: attempt })
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, params: &[(&'static str, String)], timeout: Duration) -> Result<PageResult> {
        let resp = self
            .http
            .get(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header(ACCEPT, "application/json")
            .query(params)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = resp.status();
        match status.as_u16() {
            401 | 403 => {
                return Err(SignalError::Auth {
                    status: status.as_u16(),
                })
            }
            429 => return Err(SignalError::RateLimited { attempts: 1 }),
            500 | 502 | 503 | 504 => {
                return Err(SignalError::Transient(format!(
                    "posts API returned {}",
                    status.as_u16()
                )))
            }
            _ => {}
        }

        let body = resp.text().await.map_err(|e| transport_error(e, timeout))?;
        if !status.is_success() {
            return Err(SignalError::UnexpectedStatus {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        parse_page(&body)
    }
}

/// Validate a success payload and split it into records and cursor
pub(crate) fn parse_page(body: &str) -> Result<PageResult> {
    let data: Value = serde_json::from_str(body).map_err(|e| {
        SignalError::ResponseFormat(format!("failed to parse JSON from posts API: {}", e))
    })?;

    let mut obj = match data {
        Value::Object(obj) => obj,
        other => {
            return Err(SignalError::ResponseFormat(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            )))
        }
    };

    if !obj.get("success").and_then(Value::as_bool).unwrap_or(false) {
        return Err(SignalError::ResponseFormat(format!(
            "API returned non-success response: {}",
            truncate(body)
        )));
    }

    let posts = match obj.remove("posts") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(serde_json::from_value::<RawPost>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SignalError::ResponseFormat(format!("malformed post record: {}", e)))?,
        Some(other) => {
            return Err(SignalError::ResponseFormat(format!(
                "unexpected 'posts' format in response: {}",
                json_type(&other)
            )))
        }
    };

    let next_cursor = match obj.get("next_max_id") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Ok(PageResult { posts, next_cursor })
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> SignalError {
    if e.is_builder() {
        SignalError::Config(format!("invalid posts API request: {}", e))
    } else if e.is_timeout() {
        SignalError::Transient(format!(
            "request to posts API timed out after {:?}",
            timeout
        ))
    } else if e.is_connect() {
        SignalError::Transient(format!("connection to posts API failed: {}", e))
    } else {
        SignalError::Transient(format!("network error while calling posts API: {}", e))
    }
}

fn opaque_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
