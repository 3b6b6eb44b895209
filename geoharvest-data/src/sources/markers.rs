//! Marker-feed client for the EV charging network map.
//!
//! The feed is a single parameterless `GET` returning every station as a
//! keyed object under `stations`.

use geoharvest_core::{
    ConfigurationError, FetchError, FetchResult, SourceClient, SourceKind, SourceQuery,
};
use url::Url;

use super::{fetch_json, parse_base_url, with_user_agent};
use crate::transport::{Transport, TransportRequest};

/// Public EV charging marker feed.
pub const DEFAULT_MARKER_FEED_URL: &str = "https://ev.vialietuva.lt/async/fetch_markers";

/// Configuration for [`MarkerFeedClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerFeedConfig {
    /// Feed endpoint.
    pub url: String,
    /// User agent overriding the transport default.
    pub user_agent: Option<String>,
}

impl Default for MarkerFeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_MARKER_FEED_URL.to_owned(),
            user_agent: None,
        }
    }
}

impl MarkerFeedConfig {
    /// Configuration for the feed at `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: None,
        }
    }

    /// Override the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Client for the bulk marker feed.
#[derive(Debug)]
pub struct MarkerFeedClient<T> {
    transport: T,
    url: Url,
    config: MarkerFeedConfig,
}

impl<T: Transport> MarkerFeedClient<T> {
    /// Build a client, validating the feed URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidBaseUrl`] when the URL is not an
    /// absolute http(s) URL.
    pub fn new(transport: T, config: MarkerFeedConfig) -> Result<Self, ConfigurationError> {
        let url = parse_base_url(&config.url)?;
        Ok(Self {
            transport,
            url,
            config,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &MarkerFeedConfig {
        &self.config
    }

    /// Download the whole feed.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for transport, status or decoding failures.
    pub fn fetch_markers(&self) -> FetchResult {
        let request = with_user_agent(
            TransportRequest::get(self.url.as_str()),
            self.config.user_agent.as_deref(),
        );
        fetch_json(&self.transport, &request)
    }
}

impl<T: Transport> SourceClient for MarkerFeedClient<T> {
    fn kind(&self) -> SourceKind {
        SourceKind::MarkerFeed
    }

    fn fetch(&self, query: &SourceQuery) -> FetchResult {
        match query {
            SourceQuery::Feed => self.fetch_markers(),
            other => Err(FetchError::UnsupportedQuery {
                client: self.kind(),
                query: other.kind(),
            }),
        }
    }
}
