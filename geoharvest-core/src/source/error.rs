use thiserror::Error;

use crate::SourceKind;

/// Errors from [`crate::source::SourceClient::fetch`].
///
/// Each variant carries a human-readable reason; the orchestrator records it
/// against the failed item and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The request could not be delivered (DNS, connect, TLS, reset).
    #[error("network error contacting {url}: {message}")]
    Transport {
        /// Fully qualified request URL.
        url: String,
        /// Transport diagnostic.
        message: String,
    },
    /// The transport gave up waiting for a response.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Fully qualified request URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The server answered with a non-2xx status.
    #[error("request to {url} failed with status {status}: {message}")]
    Status {
        /// Fully qualified request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Leading part of the response body.
        message: String,
    },
    /// The body was not valid JSON.
    #[error("response from {url} is not valid JSON: {message}")]
    Decode {
        /// Fully qualified request URL.
        url: String,
        /// Parser diagnostic.
        message: String,
    },
    /// The service reported an error inside a successful response.
    #[error("service error {code}: {message}")]
    Service {
        /// Service-specific error code.
        code: i64,
        /// Service-supplied description.
        message: String,
    },
    /// The query was addressed to a different kind of source.
    #[error("{client} client cannot serve a {query} query")]
    UnsupportedQuery {
        /// Kind served by the client.
        client: SourceKind,
        /// Kind of the rejected query.
        query: SourceKind,
    },
}
