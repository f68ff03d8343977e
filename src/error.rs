//! Error types for the signal service

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Authentication error: posts API returned {status}, check that the x-api-key is correct and active")]
    Auth { status: u16 },

    #[error("Rate limited: still receiving 429 after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Network error: {0}")]
    Transient(String),

    #[error("Timed out after {after:?}")]
    Timeout { after: std::time::Duration },

    #[error("Unexpected status {status} from posts API: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Response format error: {0}")]
    ResponseFormat(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SignalError {
    /// Whether the transport layer may try the same request again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SignalError::Transient(_) | SignalError::RateLimited { .. })
    }

    /// Failures caused by an outbound dependency rather than this service or its caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            SignalError::Auth { .. }
                | SignalError::RateLimited { .. }
                | SignalError::Transient(_)
                | SignalError::Timeout { .. }
                | SignalError::UnexpectedStatus { .. }
                | SignalError::ResponseFormat(_)
                | SignalError::Classification(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SignalError>;
