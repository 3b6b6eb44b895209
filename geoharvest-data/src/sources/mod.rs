//! Source clients for the three supported remote sources.
//!
//! Each client implements [`geoharvest_core::SourceClient`] on top of a
//! [`Transport`]. The clients build requests, map the transport outcome onto
//! [`FetchError`] and hand back the decoded JSON body untouched.

pub mod arcgis;
pub mod markers;
pub mod nominatim;

use geoharvest_core::{ConfigurationError, FetchError, RawResponse};
use url::Url;

use crate::transport::{Transport, TransportRequest};

pub use arcgis::{
    DEFAULT_MAP_SERVER_URL, ImageFormat, ImageSize, LayerSummary, MapExport, MapExtent,
    MapServerClient, MapServerConfig, ResponseFormat,
};
pub use markers::{DEFAULT_MARKER_FEED_URL, MarkerFeedClient, MarkerFeedConfig};
pub use nominatim::{
    DEFAULT_COUNTRY_CODES, DEFAULT_GEOCODER_URL, GeocoderClient, GeocoderConfig,
};

/// Longest body excerpt carried in a [`FetchError::Status`].
const MAX_BODY_EXCERPT: usize = 200;

/// Perform `request` and decode a successful body as JSON.
pub(crate) fn fetch_json<T: Transport + ?Sized>(
    transport: &T,
    request: &TransportRequest,
) -> Result<RawResponse, FetchError> {
    let url = request.full_url();
    let response = transport.request(request)?;
    if !response.is_success() {
        return Err(FetchError::Status {
            url,
            status: response.status,
            message: body_excerpt(&response.body),
        });
    }
    serde_json::from_slice(&response.body).map_err(|err| FetchError::Decode {
        url,
        message: err.to_string(),
    })
}

pub(crate) fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let excerpt: String = text.chars().take(MAX_BODY_EXCERPT).collect();
    excerpt.trim().to_owned()
}

/// Validate a configured base URL.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason,
    };
    let url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an absolute http(s) URL".to_owned()));
    }
    Ok(url)
}

/// Attach `user_agent` as a header when configured.
pub(crate) fn with_user_agent(
    request: TransportRequest,
    user_agent: Option<&str>,
) -> TransportRequest {
    match user_agent {
        Some(agent) => request.with_header("User-Agent", agent),
        None => request,
    }
}
