//! Error types for the director client

/// Director client errors
#[derive(Debug, thiserror::Error)]
pub enum DirectorError {
    /// Building the authorization header failed
    #[error("error building authorization header: {0}")]
    Auth(String),

    /// The request never produced a response
    #[error("error reaching director at {url}: {source}")]
    Transport {
        /// Request URL
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The director answered with a status the call does not accept
    #[error("unexpected response from director: {method} {url} returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP method
        method: String,
        /// Request URL
        url: String,
        /// Response status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Resource does not exist on the director
    #[error("not found on director: {0}")]
    NotFound(String),

    /// Response body or headers could not be interpreted
    #[error("invalid director response from {url}: {message}")]
    InvalidResponse {
        /// Request URL
        url: String,
        /// What could not be interpreted
        message: String,
    },

    /// Client could not be constructed
    #[error("invalid director configuration: {0}")]
    Configuration(String),

    /// Error raised by another `Director` implementation
    #[error("{0}")]
    Other(String),
}

impl DirectorError {
    /// Whether retrying the same idempotent request may succeed
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_connect() || source.is_timeout(),
            Self::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Create an invalid-response error
    pub fn invalid_response(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            message: message.into(),
        }
    }
}
