//! Error types for quote provider operations.

use std::time::Duration;
use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur while fetching quotes.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("provider returned HTTP {0}")]
    Status(u16),

    #[error("failed to parse response: {0}")]
    Malformed(String),

    #[error("instrument not recognized: {0}")]
    UnknownInstrument(String),

    #[error("timed out: {0}")]
    Timeout(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::Status(status.as_u16())
        } else {
            ProviderError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Malformed(err.to_string())
    }
}

impl ProviderError {
    /// Returns true if this error is transient and likely to succeed on retry.
    /// The polling loop retries these on the next tick without escalating.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Http(_) | ProviderError::Timeout(_) => true,
            ProviderError::Status(code) => *code == 429 || *code >= 500,
            ProviderError::Malformed(_) | ProviderError::UnknownInstrument(_) => false,
        }
    }

    /// Returns true if retrying the same request cannot help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Returns a suggested retry delay for this error type, if applicable.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            ProviderError::Status(429) => Some(Duration::from_secs(60)),
            ProviderError::Status(code) if *code >= 500 => Some(Duration::from_secs(5)),
            ProviderError::Http(_) => Some(Duration::from_secs(5)),
            ProviderError::Timeout(_) => Some(Duration::from_secs(2)),
            _ => None,
        }
    }
}
