use geoharvest_core::FetchError;
use thiserror::Error;

/// A request produced no response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The configured timeout elapsed first.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Fully qualified request URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// Connecting, sending or reading the body failed.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Fully qualified request URL.
        url: String,
        /// Underlying diagnostic.
        message: String,
    },
}

impl From<TransportError> for FetchError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Timeout { url, timeout_secs } => Self::Timeout { url, timeout_secs },
            TransportError::Network { url, message } => Self::Transport { url, message },
        }
    }
}

/// Failure to build an [`super::HttpTransport`].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
