//! Retrieval error types

use thiserror::Error;

/// Errors that can occur while fetching an analysis from the service
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("service error {status}: {body}")]
    Service { status: u16, body: String },

    #[error("analysis unavailable: {message}")]
    Analysis { message: String },

    #[error("malformed payload: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RetrievalError {
    /// Check if this is a transport-level failure (connection, timeout)
    pub fn is_transport(&self) -> bool {
        matches!(self, RetrievalError::Network(_))
    }

    /// Check if this is the service's soft failure payload.
    ///
    /// A well-formed reply saying the analysis produced nothing, as
    /// opposed to the exchange itself breaking.
    pub fn is_soft(&self) -> bool {
        matches!(self, RetrievalError::Analysis { .. })
    }
}
