use quake_utils::error::DateError;
use thiserror::Error;

/// Failures of a single upstream request.
///
/// Cloneable so one in-flight result can be handed to every request waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    /// Timeout, refused connection, broken body stream.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The feed answered with a non-2xx status.
    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16 },

    /// The body was not a feature collection.
    #[error("invalid feed payload: {0}")]
    InvalidPayload(String),

    /// The query window could not be rendered as request parameters.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] DateError),
}

impl FeedError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Transport(_) => true,
            FeedError::Upstream { status } => *status >= 500 || *status == 429,
            FeedError::InvalidPayload(_) | FeedError::InvalidQuery(_) => false,
        }
    }
}
