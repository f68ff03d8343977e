//! Post ingestion
//!
//! Walks the posts API page by page and turns raw records into [`Post`]s:
//! - Follows `next_max_id` until the page cap, a missing cursor or an empty page
//! - Drops records without text
//! - Parses `created_at` permissively (RFC 3339, then `YYYY-MM-DDTHH:MM:SS`)


use crate::client::{IdentitySelector, PageRequest, PostsClient, RawPost};
use crate::config::PostsApiConfig;
use crate::error::{Result, SignalError};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fallback layout for timestamps without offset information
const NAIVE_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S";

/// A post with usable text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    id: String,
    text: String,
    created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(id: impl Into<String>, text: impl Into<String>, created_at: DateTime<Utc>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SignalError::InvalidArgument("post text must not be empty".into()));
        }
        Ok(Self {
            id: id.into(),
            text,
            created_at,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Paginated post fetcher for one account
#[derive(Clone)]
pub struct PostFetcher {
    client: PostsClient,
    identity: IdentitySelector,
    trim: bool,
    request_timeout: Duration,
}

impl PostFetcher {
    pub fn new(client: PostsClient, identity: IdentitySelector, trim: bool, request_timeout: Duration) -> Self {
        Self {
            client,
            identity,
            trim,
            request_timeout,
        }
    }

    /// Create from config
    pub fn from_config(config: &PostsApiConfig) -> Result<Self> {
        let client = PostsClient::new(config)?;
        Ok(Self::new(client, config.identity()?, config.trim, config.timeout()))
    }

    /// Fetch up to `max_pages` pages and normalize them, first page first
    pub async fn fetch_posts(&self, max_pages: u32) -> Result<Vec<Post>> {
        let raw = self.fetch_raw(max_pages).await?;
        let fetched = raw.len();
        let posts = normalize(raw)?;
        info!(
            "Fetched {} posts for {} ({} records without text dropped)",
            posts.len(),
            self.identity,
            fetched - posts.len()
        );
        Ok(posts)
    }

    /// Same as [`fetch_posts`](Self::fetch_posts) but gives up after `deadline`,
    /// retry sleeps included. Pages fetched before the deadline are discarded.
    pub async fn fetch_posts_with_deadline(&self, max_pages: u32, deadline: Duration) -> Result<Vec<Post>> {
        match tokio::time::timeout(deadline, self.fetch_posts(max_pages)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Fetching posts for {} exceeded {:?}", self.identity, deadline);
                Err(SignalError::Timeout { after: deadline })
            }
        }
    }

    /// Raw records across pages, in fetch order.
    ///
    /// `max_pages` is the hard bound. A page with no posts or no cursor ends
    /// the walk early, and so does a cursor the API already returned: a
    /// cursor is never requested twice.
    pub async fn fetch_raw(&self, max_pages: u32) -> Result<Vec<RawPost>> {
        if max_pages == 0 {
            return Err(SignalError::InvalidArgument("max_pages must be at least 1".into()));
        }

        let mut records = Vec::new();
        let mut seen_cursors = HashSet::new();
        let mut request = PageRequest::first(self.identity.clone(), self.trim, self.request_timeout);

        for page_no in 1..=max_pages {
            let page = self.client.fetch_page(&request).await?;
            let count = page.posts.len();
            records.extend(page.posts);
            debug!("Page {}/{}: {} records", page_no, max_pages, count);

            if count == 0 {
                break;
            }
            let Some(cursor) = page.next_cursor else {
                break;
            };
            if !seen_cursors.insert(cursor.clone()) {
                warn!("Posts API repeated cursor {}, stopping pagination", cursor);
                break;
            }
            request.cursor = Some(cursor);
        }

        Ok(records)
    }
}

/// Turn raw records into posts, dropping those without text
pub fn normalize(records: Vec<RawPost>) -> Result<Vec<Post>> {
    records
        .into_iter()
        .filter(|r| r.text.as_deref().map_or(false, |t| !t.trim().is_empty()))
        .map(|record| {
            let id = record
                .id
                .ok_or_else(|| SignalError::ResponseFormat("post record without id".into()))?;
            let created_at = match record.created_at.as_deref() {
                Some(value) => parse_created_at(value)?,
                None => {
                    return Err(SignalError::ResponseFormat(format!(
                        "post {} has no created_at",
                        id
                    )))
                }
            };
            Post::new(id, record.text.unwrap_or_default(), created_at)
        })
        .collect()
}

/// Parse an API timestamp. RFC 3339 (including a `Z` suffix) first; failing
/// that, the first 19 characters as `YYYY-MM-DDTHH:MM:SS`, read as UTC.
pub fn parse_created_at(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value.trim()) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let head = value.get(..19).unwrap_or(value);
    NaiveDateTime::parse_from_str(head, NAIVE_TIMESTAMP)
        .map(|naive| naive.and_utc())
        .map_err(|e| SignalError::ResponseFormat(format!("invalid created_at {:?}: {}", value, e)))
}
