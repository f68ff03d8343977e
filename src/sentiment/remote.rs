//! Hosted model backend
//!
//! Posts text to a text-classification inference endpoint and maps the
//! top-scoring label to a [`SentimentLabel`]. Accepts both the flat
//! `[{label, score}]` and the batched `[[{label, score}]]` response shapes.

use super::{ensure_text, SentimentClassifier, SentimentLabel};
use crate::config::RemoteSentimentConfig;
use crate::error::{Result, SignalError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

/// One label prediction
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseShape {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

pub struct RemoteClassifier {
    http: Client,
    endpoint: String,
    api_token: String,
    min_confidence: f64,
    timeout: Duration,
}

impl RemoteClassifier {
    pub fn new(config: &RemoteSentimentConfig) -> Result<Self> {
        if config.api_token.trim().is_empty() {
            return Err(SignalError::Config(
                "remote sentiment backend needs an API token (HF_API_TOKEN)".into(),
            ));
        }

        let http = Client::builder()
            .build()
            .map_err(|e| SignalError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
            min_confidence: config.min_confidence,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl SentimentClassifier for RemoteClassifier {
    async fn classify(&self, text: &str) -> Result<SentimentLabel> {
        ensure_text(text)?;

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&InferenceRequest { inputs: text })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SignalError::Classification(format!("inference request failed: {}", e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SignalError::Classification(format!("failed to read inference response: {}", e)))?;

        if !status.is_success() {
            return Err(SignalError::Classification(format!(
                "inference endpoint returned {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let top = top_prediction(&body)?;
        debug!("Inference top label {} ({:.3})", top.label, top.score);
        Ok(label_for(&top, self.min_confidence))
    }

    fn name(&self) -> &str {
        "remote"
    }
}

/// Highest-scoring prediction in an inference response body
pub fn top_prediction(body: &str) -> Result<LabelScore> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| SignalError::Classification(format!("inference response is not JSON: {}", e)))?;

    let predictions = match serde_json::from_value::<ResponseShape>(value) {
        Ok(ResponseShape::Nested(batches)) => batches.into_iter().next().unwrap_or_default(),
        Ok(ResponseShape::Flat(predictions)) => predictions,
        Err(e) => {
            return Err(SignalError::ResponseFormat(format!(
                "unexpected inference response shape: {}",
                e
            )))
        }
    };

    predictions
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| SignalError::ResponseFormat("inference response has no predictions".into()))
}

/// Map a model label to a sentiment; low-confidence predictions are neutral
pub fn label_for(prediction: &LabelScore, min_confidence: f64) -> SentimentLabel {
    if prediction.score < min_confidence {
        return SentimentLabel::Neutral;
    }
    let label = prediction.label.to_ascii_lowercase();
    // cardiffnlp checkpoints without id2label report LABEL_0..2 (negative, neutral, positive)
    if label.contains("positive") || label == "label_2" {
        SentimentLabel::Bullish
    } else if label.contains("negative") || label == "label_0" {
        SentimentLabel::Bearish
    } else {
        SentimentLabel::Neutral
    }
}
