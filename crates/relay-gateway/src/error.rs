//! Gateway error types.

use thiserror::Error;

/// Errors raised while calling the action gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The request never produced an HTTP response (connect, timeout, I/O).
    #[error("gateway unreachable at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The gateway answered with a non-2xx status.
    #[error("gateway returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The response body is not the expected JSON.
    #[error("invalid gateway response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl GatewayError {
    /// Create a transport error
    pub fn transport(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// URL of the failed call
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. } | Self::Status { url, .. } | Self::Decode { url, .. } => url,
        }
    }
}

/// Errors raised while reading the `result` of a successful response.
#[derive(Error, Debug)]
pub enum ResultError {
    /// The response has no `result` field.
    #[error("response carries no result")]
    Missing,

    /// The `result` does not have the expected fields.
    #[error("result has an unexpected shape: {0}")]
    Shape(#[from] serde_json::Error),
}
