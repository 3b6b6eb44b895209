//! Nominatim free-text geocoding client.
//!
//! Each call asks for the single best match (`limit=1`, `format=json`). The
//! public instance's usage policy allows at most one request per second and
//! requires an identifying user agent, so the client reports itself as rate
//! limited and always sends its configured agent.

use geoharvest_core::{
    AddressQuery, ConfigurationError, FetchError, FetchResult, SourceClient, SourceKind,
    SourceQuery,
};
use url::Url;

use super::{fetch_json, parse_base_url, with_user_agent};
use crate::transport::{DEFAULT_USER_AGENT, Transport, TransportRequest};

/// Public Nominatim search endpoint.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Country filter applied by default (Lithuania).
pub const DEFAULT_COUNTRY_CODES: &str = "lt";

/// Configuration for [`GeocoderClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocoderConfig {
    /// Search endpoint.
    pub base_url: String,
    /// Comma-separated ISO 3166-1 alpha-2 codes, or `None` for no filter.
    pub country_codes: Option<String>,
    /// Identifying user agent.
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOCODER_URL.to_owned(),
            country_codes: Some(DEFAULT_COUNTRY_CODES.to_owned()),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl GeocoderConfig {
    /// Configuration for the endpoint at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Restrict matches to `country_codes`, or lift the filter with `None`.
    #[must_use]
    pub fn with_country_codes(mut self, country_codes: Option<String>) -> Self {
        self.country_codes = country_codes.filter(|codes| !codes.trim().is_empty());
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Geocoding client returning at most one match per address.
#[derive(Debug)]
pub struct GeocoderClient<T> {
    transport: T,
    base_url: Url,
    config: GeocoderConfig,
}

impl<T: Transport> GeocoderClient<T> {
    /// Build a client, validating the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidBaseUrl`] when the endpoint is not
    /// an absolute http(s) URL.
    pub fn new(transport: T, config: GeocoderConfig) -> Result<Self, ConfigurationError> {
        let base_url = parse_base_url(&config.base_url)?;
        Ok(Self {
            transport,
            base_url,
            config,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &GeocoderConfig {
        &self.config
    }

    /// Look up `address`, returning the raw match array.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for transport, status or decoding failures.
    pub fn geocode(&self, address: &AddressQuery) -> FetchResult {
        let mut request = with_user_agent(
            TransportRequest::get(self.base_url.as_str()),
            Some(self.config.user_agent.as_str()),
        )
        .with_param("q", address.as_str())
        .with_param("format", "json")
        .with_param("limit", "1");
        if let Some(codes) = &self.config.country_codes {
            request = request.with_param("countrycodes", codes.as_str());
        }
        log::debug!("geocoding {:?}", address.as_str());
        fetch_json(&self.transport, &request)
    }
}

impl<T: Transport> SourceClient for GeocoderClient<T> {
    fn kind(&self) -> SourceKind {
        SourceKind::Geocoder
    }

    fn rate_limited(&self) -> bool {
        true
    }

    fn fetch(&self, query: &SourceQuery) -> FetchResult {
        match query {
            SourceQuery::Address(address) => self.geocode(address),
            other => Err(FetchError::UnsupportedQuery {
                client: self.kind(),
                query: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubTransport;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn transport() -> StubTransport {
        StubTransport::new()
    }

    fn address(text: &str) -> AddressQuery {
        AddressQuery::new(text).expect("valid address")
    }

    #[rstest]
    fn sends_single_match_search(transport: StubTransport) {
        transport.push_json(&json!([]));
        let client =
            GeocoderClient::new(&transport, GeocoderConfig::default()).expect("valid config");

        client
            .geocode(&address("Gedimino pr. 9, Vilnius"))
            .expect("request succeeds");

        let request = transport.requests().remove(0);
        assert_eq!(request.url(), DEFAULT_GEOCODER_URL);
        assert_eq!(request.param("q"), Some("Gedimino pr. 9, Vilnius"));
        assert_eq!(request.param("format"), Some("json"));
        assert_eq!(request.param("limit"), Some("1"));
        assert_eq!(request.param("countrycodes"), Some("lt"));
        assert_eq!(
            request.headers().get("User-Agent").map(String::as_str),
            Some("geoharvest/0.1")
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some("  ".to_owned()))]
    fn country_filter_can_be_lifted(transport: StubTransport, #[case] codes: Option<String>) {
        transport.push_json(&json!([]));
        let config = GeocoderConfig::default().with_country_codes(codes);
        let client = GeocoderClient::new(&transport, config).expect("valid config");
        client.geocode(&address("Ozo g. 25")).expect("request succeeds");
        assert_eq!(transport.requests()[0].param("countrycodes"), None);
    }

    #[rstest]
    fn is_rate_limited(transport: StubTransport) {
        let client =
            GeocoderClient::new(&transport, GeocoderConfig::default()).expect("valid config");
        assert!(client.rate_limited());
        assert_eq!(client.kind(), SourceKind::Geocoder);
    }

    #[rstest]
    fn returns_raw_matches_untouched(transport: StubTransport) {
        let body = json!([{"lat": "54.687", "lon": "25.279", "display_name": "Gedimino prospektas 9, Vilnius"}]);
        transport.push_json(&body);
        let client =
            GeocoderClient::new(&transport, GeocoderConfig::default()).expect("valid config");
        let raw = client
            .fetch(&SourceQuery::from(address("Gedimino pr. 9, Vilnius")))
            .expect("request succeeds");
        assert_eq!(raw, body);
    }

    #[rstest]
    fn feed_queries_are_unsupported(transport: StubTransport) {
        let client =
            GeocoderClient::new(&transport, GeocoderConfig::default()).expect("valid config");
        let err = client.fetch(&SourceQuery::Feed).expect_err("wrong kind");
        assert_eq!(
            err,
            FetchError::UnsupportedQuery {
                client: SourceKind::Geocoder,
                query: SourceKind::MarkerFeed
            }
        );
    }
}
