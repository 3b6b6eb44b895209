//! ArcGIS map-server client.
//!
//! Issues predicate-based layer queries (`GET {base}/{layer}/query`), reads
//! the service's layer catalogue and renders map images. Map servers report request errors
//! inside a 200 response as `{"error": {"code": .., "message": ..}}`; those
//! are surfaced as [`FetchError::Service`].

mod export;
mod wire;

use geoharvest_core::{
    ConfigurationError, FetchError, FetchResult, LayerQuery, RawResponse, SourceClient,
    SourceKind, SourceQuery,
};
use url::Url;

use self::wire::{ErrorEnvelope, LayersResponse};
use super::{body_excerpt, fetch_json, parse_base_url, with_user_agent};
use crate::transport::{Transport, TransportRequest};

pub use self::export::{ImageFormat, ImageSize, MapExport, MapExtent};
pub use self::wire::LayerSummary;

/// Default map service: the Lithuanian geoportal's ESO public layers.
pub const DEFAULT_MAP_SERVER_URL: &str =
    "https://www.geoportal.lt/mapproxy/ESO_DB_Public/MapServer";

/// Wire encoding requested for layer queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Esri JSON (`f=json`): `attributes` plus `geometry.{x,y}`.
    #[default]
    EsriJson,
    /// GeoJSON (`f=geojson`): `properties` plus `geometry.coordinates`.
    GeoJson,
}

impl ResponseFormat {
    /// Value of the `f` parameter.
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::EsriJson => "json",
            Self::GeoJson => "geojson",
        }
    }
}

/// Configuration for [`MapServerClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapServerConfig {
    /// Map service root, e.g. `https://host/arcgis/rest/services/Name/MapServer`.
    pub base_url: String,
    /// Encoding requested for layer queries.
    pub response_format: ResponseFormat,
    /// User agent overriding the transport default.
    pub user_agent: Option<String>,
}

impl Default for MapServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MAP_SERVER_URL.to_owned(),
            response_format: ResponseFormat::default(),
            user_agent: None,
        }
    }
}

impl MapServerConfig {
    /// Configuration for the service rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Select the response encoding.
    #[must_use]
    pub const fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = response_format;
        self
    }

    /// Override the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Client for one ArcGIS map service.
///
/// # Examples
/// ```
/// use geoharvest_core::{LayerQuery, SourceClient, SourceQuery};
/// use geoharvest_data::sources::{MapServerClient, MapServerConfig};
/// use geoharvest_data::test_support::StubTransport;
/// use serde_json::json;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = StubTransport::new();
/// transport.push_json(&json!({"features": []}));
/// let client = MapServerClient::new(&transport, MapServerConfig::default())?;
///
/// let raw = client.fetch(&SourceQuery::from(LayerQuery::new(1, "1=1")?))?;
/// assert!(raw["features"].as_array().is_some());
/// assert_eq!(transport.requests()[0].param("outSR"), Some("3346"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MapServerClient<T> {
    transport: T,
    base_url: Url,
    config: MapServerConfig,
}

impl<T: Transport> MapServerClient<T> {
    /// Build a client, validating the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidBaseUrl`] when the base URL is not
    /// an absolute http(s) URL.
    pub fn new(transport: T, config: MapServerConfig) -> Result<Self, ConfigurationError> {
        let base_url = parse_base_url(&config.base_url)?;
        Ok(Self {
            transport,
            base_url,
            config,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &MapServerConfig {
        &self.config
    }

    fn endpoint(&self, segments: &[&str]) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{}", segments.join("/"))
    }

    fn request(&self, segments: &[&str]) -> TransportRequest {
        with_user_agent(
            TransportRequest::get(self.endpoint(segments)),
            self.config.user_agent.as_deref(),
        )
    }

    /// Query one layer for records matching the query predicate.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for transport, status, decoding or service
    /// failures.
    pub fn query_layer(&self, query: &LayerQuery) -> FetchResult {
        let layer = query.layer_id().to_string();
        let request = self
            .request(&[layer.as_str(), "query"])
            .with_param("f", self.config.response_format.as_param())
            .with_param("where", query.predicate())
            .with_param("outFields", query.out_fields())
            .with_param(
                "returnGeometry",
                if query.return_geometry() { "true" } else { "false" },
            )
            .with_param("outSR", query.out_sr().wkid().to_string());
        log::debug!("querying map-server layer {layer}");
        let raw = fetch_json(&self.transport, &request)?;
        check_service_error(&raw)?;
        Ok(raw)
    }

    /// List the layers published by the service.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for transport, status, decoding or service
    /// failures, including a catalogue that does not match the expected shape.
    pub fn list_layers(&self) -> Result<Vec<LayerSummary>, FetchError> {
        let request = self.request(&["layers"]).with_param("f", "json");
        let raw = fetch_json(&self.transport, &request)?;
        check_service_error(&raw)?;
        let response: LayersResponse = decode_typed(&request, raw)?;
        Ok(response.layers)
    }

    /// Describe a single layer.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for transport, status, decoding or service
    /// failures.
    pub fn layer_info(&self, layer_id: u32) -> Result<LayerSummary, FetchError> {
        let layer = layer_id.to_string();
        let request = self.request(&[layer.as_str()]).with_param("f", "json");
        let raw = fetch_json(&self.transport, &request)?;
        check_service_error(&raw)?;
        decode_typed(&request, raw)
    }

    /// Render the map for `export.extent` and return the encoded image.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for transport or status failures, and
    /// [`FetchError::Service`] when the service answers with a JSON error
    /// envelope instead of an image.
    pub fn export_map(&self, export: &MapExport) -> Result<Vec<u8>, FetchError> {
        let wkid = export.crs.wkid().to_string();
        let request = self
            .request(&["export"])
            .with_param("f", "image")
            .with_param("bbox", export.extent.to_string())
            .with_param("size", export.size.to_string())
            .with_param("format", export.format.as_param())
            .with_param(
                "transparent",
                if export.transparent { "true" } else { "false" },
            )
            .with_param("bboxSR", wkid.as_str())
            .with_param("imageSR", wkid);
        log::debug!("exporting map image for {}", export.extent);
        let response = self.transport.request(&request)?;
        if !response.is_success() {
            return Err(FetchError::Status {
                url: request.full_url(),
                status: response.status,
                message: body_excerpt(&response.body),
            });
        }
        if let Ok(raw) = serde_json::from_slice::<RawResponse>(&response.body) {
            check_service_error(&raw)?;
        }
        Ok(response.body)
    }
}

fn check_service_error(raw: &RawResponse) -> Result<(), FetchError> {
    if raw.get("error").is_none() {
        return Ok(());
    }
    match serde_json::from_value::<ErrorEnvelope>(raw.clone()) {
        Ok(envelope) => Err(FetchError::Service {
            code: envelope.error.code,
            message: envelope.error.describe(),
        }),
        Err(_) => Err(FetchError::Service {
            code: 0,
            message: raw["error"].to_string(),
        }),
    }
}

fn decode_typed<D: serde::de::DeserializeOwned>(
    request: &TransportRequest,
    raw: RawResponse,
) -> Result<D, FetchError> {
    serde_json::from_value(raw).map_err(|err| FetchError::Decode {
        url: request.full_url(),
        message: err.to_string(),
    })
}

impl<T: Transport> SourceClient for MapServerClient<T> {
    fn kind(&self) -> SourceKind {
        SourceKind::MapServer
    }

    fn fetch(&self, query: &SourceQuery) -> FetchResult {
        match query {
            SourceQuery::Layer(layer) => self.query_layer(layer),
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
    use geoharvest_core::{AddressQuery, Crs};
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn transport() -> StubTransport {
        StubTransport::new()
    }

    fn client(transport: &StubTransport) -> MapServerClient<&StubTransport> {
        MapServerClient::new(transport, MapServerConfig::default()).expect("default URL is valid")
    }

    #[rstest]
    fn layer_query_sends_documented_parameters(transport: StubTransport) {
        transport.push_json(&json!({"features": []}));
        let query = LayerQuery::new(1, "STATUS = 'A'")
            .expect("valid query")
            .with_out_fields("OBJECTID,NAME")
            .with_geometry(false)
            .with_out_sr(Crs::Wgs84);

        client(&transport).query_layer(&query).expect("query succeeds");

        let requests = transport.requests();
        let request = requests.first().expect("one request recorded");
        assert_eq!(request.url(), format!("{DEFAULT_MAP_SERVER_URL}/1/query"));
        assert_eq!(request.param("f"), Some("json"));
        assert_eq!(request.param("where"), Some("STATUS = 'A'"));
        assert_eq!(request.param("outFields"), Some("OBJECTID,NAME"));
        assert_eq!(request.param("returnGeometry"), Some("false"));
        assert_eq!(request.param("outSR"), Some("4326"));
    }

    #[rstest]
    fn geojson_format_sets_f_parameter(transport: StubTransport) {
        transport.push_json(&json!({"type": "FeatureCollection", "features": []}));
        let config = MapServerConfig::default().with_response_format(ResponseFormat::GeoJson);
        let client = MapServerClient::new(&transport, config).expect("valid config");
        client
            .query_layer(&LayerQuery::new(1, "1=1").expect("valid query"))
            .expect("query succeeds");
        assert_eq!(transport.requests()[0].param("f"), Some("geojson"));
    }

    #[rstest]
    fn embedded_error_is_a_service_failure(transport: StubTransport) {
        transport.push_json(&json!({"error": {"code": 400, "message": "Invalid query", "details": []}}));
        let err = client(&transport)
            .query_layer(&LayerQuery::new(1, "bogus").expect("valid query"))
            .expect_err("error envelope should fail");
        assert_eq!(
            err,
            FetchError::Service {
                code: 400,
                message: "Invalid query".to_owned()
            }
        );
    }

    #[rstest]
    fn trailing_slash_in_base_is_ignored(transport: StubTransport) {
        transport.push_json(&json!({"layers": []}));
        let config = MapServerConfig::new("https://maps.example.org/MapServer/");
        let client = MapServerClient::new(&transport, config).expect("valid config");
        client.list_layers().expect("catalogue succeeds");
        assert_eq!(
            transport.requests()[0].url(),
            "https://maps.example.org/MapServer/layers"
        );
    }

    #[rstest]
    fn lists_layers(transport: StubTransport) {
        transport.push_json(&json!({"layers": [
            {"id": 0, "name": "Stotys", "type": "Feature Layer", "geometryType": "esriGeometryPoint"},
            {"id": 1, "name": "Linijos", "type": "Feature Layer", "geometryType": "esriGeometryPolyline"}
        ]}));
        let layers = client(&transport).list_layers().expect("catalogue succeeds");
        let names: Vec<_> = layers.iter().map(|layer| layer.name.as_str()).collect();
        assert_eq!(names, vec!["Stotys", "Linijos"]);
        assert_eq!(transport.requests()[0].param("f"), Some("json"));
    }

    #[rstest]
    fn layer_info_decodes_summary(transport: StubTransport) {
        transport.push_json(&json!({"id": 7, "name": "Pastotės", "type": "Feature Layer",
            "geometryType": "esriGeometryPoint", "fields": []}));
        let summary = client(&transport).layer_info(7).expect("info succeeds");
        assert_eq!(summary.id, 7);
        assert_eq!(
            transport.requests()[0].url(),
            format!("{DEFAULT_MAP_SERVER_URL}/7")
        );
    }

    #[rstest]
    fn malformed_catalogue_is_a_decode_error(transport: StubTransport) {
        transport.push_json(&json!({"layers": [{"name": "missing id"}]}));
        let err = client(&transport).list_layers().expect_err("should fail");
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    fn vilnius_extent() -> MapExtent {
        MapExtent::new(570_000.0, 6_050_000.0, 590_000.0, 6_070_000.0).expect("valid extent")
    }

    #[rstest]
    fn export_sends_image_parameters(transport: StubTransport) {
        transport.push_response(200, b"\x89PNG\r\n".to_vec());
        let export = MapExport::new(vilnius_extent())
            .with_size(ImageSize::new(1024, 768).expect("valid size"))
            .with_format(ImageFormat::Jpg)
            .with_transparency(false);

        let image = client(&transport).export_map(&export).expect("export succeeds");

        assert_eq!(image, b"\x89PNG\r\n".to_vec());
        let requests = transport.requests();
        let request = requests.first().expect("one request recorded");
        assert_eq!(request.url(), format!("{DEFAULT_MAP_SERVER_URL}/export"));
        assert_eq!(request.param("f"), Some("image"));
        assert_eq!(request.param("bbox"), Some("570000,6050000,590000,6070000"));
        assert_eq!(request.param("size"), Some("1024,768"));
        assert_eq!(request.param("format"), Some("jpg"));
        assert_eq!(request.param("transparent"), Some("false"));
        assert_eq!(request.param("bboxSR"), Some("3346"));
        assert_eq!(request.param("imageSR"), Some("3346"));
    }

    #[rstest]
    fn export_defaults_to_transparent_png(transport: StubTransport) {
        transport.push_response(200, b"GIF89a".to_vec());
        client(&transport)
            .export_map(&MapExport::new(vilnius_extent()))
            .expect("export succeeds");
        let request = &transport.requests()[0];
        assert_eq!(request.param("size"), Some("800,600"));
        assert_eq!(request.param("format"), Some("png"));
        assert_eq!(request.param("transparent"), Some("true"));
    }

    #[rstest]
    fn export_error_envelope_is_a_service_failure(transport: StubTransport) {
        transport.push_json(&json!({"error": {"code": 500, "message": "Unable to export"}}));
        let err = client(&transport)
            .export_map(&MapExport::new(vilnius_extent()))
            .expect_err("error envelope should fail");
        assert_eq!(
            err,
            FetchError::Service {
                code: 500,
                message: "Unable to export".to_owned()
            }
        );
    }

    #[rstest]
    fn export_status_failure_is_reported(transport: StubTransport) {
        transport.push_response(403, "Forbidden");
        let err = client(&transport)
            .export_map(&MapExport::new(vilnius_extent()))
            .expect_err("403 should fail");
        assert!(matches!(err, FetchError::Status { status: 403, .. }));
    }

    #[rstest]
    fn rejects_queries_for_other_sources(transport: StubTransport) {
        let query = SourceQuery::from(AddressQuery::new("Ozo g. 25").expect("valid"));
        let err = client(&transport).fetch(&query).expect_err("wrong kind");
        assert!(matches!(err, FetchError::UnsupportedQuery { .. }));
        assert!(transport.requests().is_empty(), "no request should be sent");
    }

    #[rstest]
    fn invalid_base_url_is_a_configuration_error(transport: StubTransport) {
        let err = MapServerClient::new(&transport, MapServerConfig::new("geoportal"))
            .expect_err("relative URL");
        assert!(matches!(err, ConfigurationError::InvalidBaseUrl { .. }));
    }

    #[rstest]
    fn custom_user_agent_is_sent(transport: StubTransport) {
        transport.push_json(&json!({"layers": []}));
        let config = MapServerConfig::default().with_user_agent("Mozilla/5.0");
        let client = MapServerClient::new(&transport, config).expect("valid config");
        client.list_layers().expect("catalogue succeeds");
        assert_eq!(
            transport.requests()[0].headers().get("User-Agent").map(String::as_str),
            Some("Mozilla/5.0")
        );
    }
}
