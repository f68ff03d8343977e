//! Fetch → classify → map
//!
//! One call fetches the latest posts, classifies them with bounded
//! parallelism and returns signals in fetch order. Any failure fails the
//! whole call; partial results are never returned.

use crate::config::Config;
use crate::error::{Result, SignalError};
use crate::ingester::{Post, PostFetcher};
use crate::sentiment::{build_classifier, SentimentClassifier};
use crate::strategy::Signal;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct SignalPipeline {
    fetcher: PostFetcher,
    classifier: Arc<dyn SentimentClassifier>,
    max_pages: u32,
    deadline: Duration,
    concurrency: usize,
}

impl SignalPipeline {
    pub fn new(
        fetcher: PostFetcher,
        classifier: Arc<dyn SentimentClassifier>,
        max_pages: u32,
        deadline: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            max_pages,
            deadline,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            PostFetcher::from_config(&config.posts)?,
            build_classifier(&config.sentiment)?,
            config.posts.max_pages,
            config.posts.deadline(),
            config.sentiment.concurrency,
        ))
    }

    /// Signals for the newest posts, at most `limit` of them
    pub async fn latest_signals(&self, limit: Option<usize>) -> Result<Vec<Signal>> {
        if limit == Some(0) {
            return Err(SignalError::InvalidArgument("limit must be at least 1".into()));
        }

        let mut posts = self
            .fetcher
            .fetch_posts_with_deadline(self.max_pages, self.deadline)
            .await?;
        if let Some(limit) = limit {
            posts.truncate(limit);
        }

        let signals = self.classify_all(posts).await?;
        info!(
            "Produced {} signals with {} backend",
            signals.len(),
            self.classifier.name()
        );
        Ok(signals)
    }

    /// Classify posts concurrently; output order follows input order
    pub async fn classify_all(&self, posts: Vec<Post>) -> Result<Vec<Signal>> {
        stream::iter(posts)
            .map(|post| {
                let classifier = Arc::clone(&self.classifier);
                async move {
                    let sentiment = classifier.classify(post.text()).await?;
                    Ok::<_, SignalError>(Signal::new(post, sentiment))
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }
}
