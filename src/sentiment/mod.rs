//! Post Sentiment Classification
//!
//! Turns post text into a three-way sentiment label.
//! Backends:
//! - Lexicon: VADER-style compound score, offline and deterministic
//! - Remote: hosted text-classification model behind an inference API
//!
//! The backend is picked once from configuration; callers only see
//! [`SentimentClassifier`].

pub mod remote;
pub mod sentiment_analyzer;

pub use remote::{LabelScore, RemoteClassifier};
pub use sentiment_analyzer::{LexiconClassifier, PolarityScores, SentimentAnalyzer};

use crate::config::{SentimentBackend, SentimentConfig};
use crate::error::{Result, SignalError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Compound score at or above which text counts as bullish (and its negation bearish)
pub const COMPOUND_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentLabel {
    /// Label for a compound polarity score in [-1, 1]
    pub fn from_compound(compound: f64) -> Self {
        if compound >= COMPOUND_THRESHOLD {
            SentimentLabel::Bullish
        } else if compound <= -COMPOUND_THRESHOLD {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Bullish => "bullish",
            SentimentLabel::Bearish => "bearish",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sentiment backend
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Classify non-empty text
    async fn classify(&self, text: &str) -> Result<SentimentLabel>;

    fn name(&self) -> &str;
}

/// Build the configured backend
pub fn build_classifier(config: &SentimentConfig) -> Result<Arc<dyn SentimentClassifier>> {
    let classifier: Arc<dyn SentimentClassifier> = match config.backend {
        SentimentBackend::Lexicon => Arc::new(LexiconClassifier::new()),
        SentimentBackend::Remote => Arc::new(RemoteClassifier::new(&config.remote)?),
    };
    tracing::info!("Using {} sentiment backend", classifier.name());
    Ok(classifier)
}

pub(crate) fn ensure_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(SignalError::InvalidArgument(
            "cannot classify empty text".into(),
        ));
    }
    Ok(())
}
