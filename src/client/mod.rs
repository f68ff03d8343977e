//! Posts API client
//!
//! Talks to the ScrapeCreators Truth Social endpoint:
//! - One authenticated GET per page, keyed by user id or handle
//! - Retry with exponential backoff on 429 / 5xx / network failures
//! - Failure classification into [`SignalError`](crate::error::SignalError)

mod posts;
#[cfg(test)]
mod tests;

pub use posts::{PageRequest, PageResult, PostsClient, RawPost};

use crate::error::{Result, SignalError};

/// Which account to read posts from. The API takes exactly one of the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySelector {
    UserId(String),
    Handle(String),
}

impl IdentitySelector {
    /// Build a selector from optional parts; blank values count as absent
    pub fn from_parts(user_id: Option<&str>, handle: Option<&str>) -> Result<Self> {
        let user_id = user_id.map(str::trim).filter(|s| !s.is_empty());
        let handle = handle
            .map(|h| h.trim().trim_start_matches('@'))
            .filter(|s| !s.is_empty());

        match (user_id, handle) {
            (Some(id), None) => Ok(Self::UserId(id.to_string())),
            (None, Some(handle)) => Ok(Self::Handle(handle.to_string())),
            (Some(_), Some(_)) => Err(SignalError::InvalidArgument(
                "provide either user_id or handle, not both".into(),
            )),
            (None, None) => Err(SignalError::InvalidArgument(
                "you must provide either user_id or handle".into(),
            )),
        }
    }

    fn query_pair(&self) -> (&'static str, &str) {
        match self {
            Self::UserId(id) => ("user_id", id),
            Self::Handle(handle) => ("handle", handle),
        }
    }
}

impl std::fmt::Display for IdentitySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserId(id) => write!(f, "user_id={}", id),
            Self::Handle(handle) => write!(f, "@{}", handle),
        }
    }
}
