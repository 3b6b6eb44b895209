//! ArcGIS REST response fragments.
//!
//! Only the catalogue and error envelopes are typed; feature query bodies are
//! passed through as raw JSON for the normalizer.
//!
//! See: <https://developers.arcgis.com/rest/services-reference/enterprise/map-service/>

use serde::{Deserialize, Serialize};

/// One entry of a map service's layer catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSummary {
    /// Layer identifier used in query URLs.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Layer kind, e.g. `Feature Layer` or `Group Layer`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub layer_type: Option<String>,
    /// Geometry type, e.g. `esriGeometryPoint`.
    #[serde(
        rename = "geometryType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub geometry_type: Option<String>,
}

/// Body of `GET {base}/layers?f=json`.
#[derive(Debug, Deserialize)]
pub(super) struct LayersResponse {
    #[serde(default)]
    pub layers: Vec<LayerSummary>,
}

/// Error envelope returned with a 200 status.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub error: ServiceErrorBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct ServiceErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl ServiceErrorBody {
    /// Message with any detail lines appended.
    pub fn describe(&self) -> String {
        if self.details.is_empty() {
            self.message.clone()
        } else {
            format!("{} ({})", self.message, self.details.join("; "))
        }
    }
}
