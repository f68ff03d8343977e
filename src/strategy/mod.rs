//! Trading signal mapping


use crate::ingester::Post;
use crate::sentiment::SentimentLabel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Action suggested by a post's sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalLabel {
    Buy,
    Sell,
    Hold,
}

impl SignalLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalLabel::Buy => "BUY",
            SignalLabel::Sell => "SELL",
            SignalLabel::Hold => "HOLD",
        }
    }
}

impl fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bullish buys, bearish sells, neutral holds
pub fn to_signal(sentiment: SentimentLabel) -> SignalLabel {
    match sentiment {
        SentimentLabel::Bullish => SignalLabel::Buy,
        SentimentLabel::Bearish => SignalLabel::Sell,
        SentimentLabel::Neutral => SignalLabel::Hold,
    }
}

impl From<SentimentLabel> for SignalLabel {
    fn from(sentiment: SentimentLabel) -> Self {
        to_signal(sentiment)
    }
}

/// A post with its sentiment and the resulting signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub post: Post,
    pub sentiment: SentimentLabel,
    pub signal: SignalLabel,
}

impl Signal {
    pub fn new(post: Post, sentiment: SentimentLabel) -> Self {
        Self {
            post,
            sentiment,
            signal: to_signal(sentiment),
        }
    }
}
