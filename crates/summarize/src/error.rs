use std::time::Duration;

use thiserror::Error;

/// Failures from one summarizer call. Retryable variants cover conditions
/// that may clear on a later attempt; invalid input never will, so it fails
/// the item on the spot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummarizeError {
    #[error("summarizer call exceeded {0:?}")]
    Timeout(Duration),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("invalid input rejected by summarizer: {0}")]
    InvalidInput(String),
}

impl SummarizeError {
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, SummarizeError>;
