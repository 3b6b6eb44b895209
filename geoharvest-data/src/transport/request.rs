use std::collections::BTreeMap;

use reqwest::Method;
use url::Url;

/// A transport-level request: method, URL, query parameters and headers.
///
/// Parameters and headers are kept in sorted maps so the encoded URL is
/// stable, which keeps logs and recorded test requests comparable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    method: Method,
    url: String,
    query: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
}

impl TransportRequest {
    /// A `GET` request for `url` with no parameters.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }

    /// Add or replace a query parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Add or replace a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// URL without query parameters.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query parameters.
    #[must_use]
    pub const fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Look up a single query parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// The URL with its query string encoded, as used in error reports.
    ///
    /// Falls back to the bare URL when it does not parse.
    #[must_use]
    pub fn full_url(&self) -> String {
        let Ok(mut url) = Url::parse(&self.url) else {
            return self.url.clone();
        };
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        url.into()
    }
}

/// Status code and body bytes of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, undecoded.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Build a response from a status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}
