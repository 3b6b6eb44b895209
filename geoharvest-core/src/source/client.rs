//! Source client trait and the raw response alias.

use crate::{SourceKind, SourceQuery};

use super::error::FetchError;

/// Decoded, otherwise untouched, response body of one fetch.
pub type RawResponse = serde_json::Value;

/// Outcome of one fetch: the raw response or the reason it failed.
pub type FetchResult = Result<RawResponse, FetchError>;

/// Issue parameterised requests against one remote source.
///
/// Implementers perform exactly one round trip per [`SourceClient::fetch`]
/// call and translate every transport, status or decoding problem into a
/// [`FetchError`].
///
/// # Examples
///
/// ```rust
/// use geoharvest_core::{FetchError, FetchResult, SourceClient, SourceKind, SourceQuery};
/// use serde_json::json;
///
/// struct EmptyFeed;
///
/// impl SourceClient for EmptyFeed {
///     fn kind(&self) -> SourceKind {
///         SourceKind::MarkerFeed
///     }
///
///     fn fetch(&self, query: &SourceQuery) -> FetchResult {
///         match query {
///             SourceQuery::Feed => Ok(json!({"stations": {}})),
///             other => Err(FetchError::UnsupportedQuery {
///                 client: self.kind(),
///                 query: other.kind(),
///             }),
///         }
///     }
/// }
///
/// let raw = EmptyFeed.fetch(&SourceQuery::Feed)?;
/// assert!(raw["stations"].as_object().is_some_and(|stations| stations.is_empty()));
/// # Ok::<(), FetchError>(())
/// ```
pub trait SourceClient {
    /// The source this client talks to.
    fn kind(&self) -> SourceKind;

    /// Whether the source publishes a usage policy that requires pacing.
    ///
    /// The orchestrator inserts a rate-limiter slot ahead of every call after
    /// the first when this returns `true`.
    fn rate_limited(&self) -> bool {
        false
    }

    /// Perform one request for `query`.
    ///
    /// Implementations must return [`FetchError::UnsupportedQuery`] when the
    /// query kind does not match [`SourceClient::kind`].
    fn fetch(&self, query: &SourceQuery) -> FetchResult;
}

impl<T: SourceClient + ?Sized> SourceClient for &T {
    fn kind(&self) -> SourceKind {
        (**self).kind()
    }

    fn rate_limited(&self) -> bool {
        (**self).rate_limited()
    }

    fn fetch(&self, query: &SourceQuery) -> FetchResult {
        (**self).fetch(query)
    }
}
