//! GeoJSON encoding of [`FeatureCollection`] values.
//!
//! The emitted document is a standard `FeatureCollection` whose members are
//! `Point` features:
//!
//! ```json
//! {"type": "FeatureCollection", "features": [
//!   {"type": "Feature",
//!    "geometry": {"type": "Point", "coordinates": [25.3, 54.7]},
//!    "properties": {"StationId": 1}}
//! ]}
//! ```
//!
//! Decoding accepts any point collection written by a standard GeoJSON
//! writer. Extra position members (altitude) are ignored and features are
//! re-validated, so a decoded collection upholds the same invariants as a
//! freshly normalised one.

use std::io::{Read, Write};

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Feature, FeatureCollection, NormalizationError, Properties};

/// Errors from encoding or decoding GeoJSON.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeoJsonError {
    /// Serialising the collection failed.
    #[error("failed to encode GeoJSON: {0}")]
    Encode(#[source] serde_json::Error),
    /// The document was not a point `FeatureCollection`.
    #[error("failed to decode GeoJSON: {0}")]
    Decode(#[source] serde_json::Error),
    /// A decoded feature violated the feature invariants.
    #[error("GeoJSON feature {index} is invalid: {source}")]
    InvalidFeature {
        /// Zero-based position within `features`.
        index: usize,
        /// Validation failure.
        #[source]
        source: NormalizationError,
    },
}

#[derive(Debug, Serialize, Deserialize)]
enum CollectionTag {
    FeatureCollection,
}

#[derive(Debug, Serialize, Deserialize)]
enum FeatureTag {
    Feature,
}

#[derive(Debug, Serialize, Deserialize)]
enum PointTag {
    Point,
}

#[derive(Debug, Serialize, Deserialize)]
struct PointGeometry {
    #[serde(rename = "type")]
    kind: PointTag,
    coordinates: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct FeatureOut<'a> {
    #[serde(rename = "type")]
    kind: FeatureTag,
    geometry: PointGeometry,
    properties: &'a Properties,
}

#[derive(Debug, Serialize)]
struct CollectionOut<'a> {
    #[serde(rename = "type")]
    kind: CollectionTag,
    features: Vec<FeatureOut<'a>>,
}

#[derive(Debug, Deserialize)]
struct FeatureIn {
    #[serde(rename = "type")]
    _kind: FeatureTag,
    geometry: PointGeometry,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Debug, Deserialize)]
struct CollectionIn {
    #[serde(rename = "type")]
    _kind: CollectionTag,
    features: Vec<FeatureIn>,
}

impl<'a> From<&'a Feature> for FeatureOut<'a> {
    fn from(feature: &'a Feature) -> Self {
        Self {
            kind: FeatureTag::Feature,
            geometry: PointGeometry {
                kind: PointTag::Point,
                coordinates: vec![feature.longitude(), feature.latitude()],
            },
            properties: feature.properties(),
        }
    }
}

impl FeatureIn {
    fn into_feature(self, index: usize) -> Result<Feature, GeoJsonError> {
        let record = format!("features[{index}]");
        let invalid = |source| GeoJsonError::InvalidFeature { index, source };
        let (x, y) = match self.geometry.coordinates.as_slice() {
            [x, y, ..] => (*x, *y),
            _ => {
                return Err(invalid(NormalizationError::InvalidCoordinate {
                    record,
                    reason: "a position needs at least two members".to_owned(),
                }));
            }
        };
        Feature::new(&record, Coord { x, y }, self.properties.unwrap_or_default()).map_err(invalid)
    }
}

impl Serialize for FeatureCollection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        CollectionOut {
            kind: CollectionTag::FeatureCollection,
            features: self.iter().map(FeatureOut::from).collect(),
        }
        .serialize(serializer)
    }
}

impl FeatureCollection {
    /// Encode as pretty-printed GeoJSON text.
    ///
    /// Non-ASCII property text is written verbatim, not escaped.
    pub fn to_geojson_string(&self) -> Result<String, GeoJsonError> {
        serde_json::to_string_pretty(self).map_err(GeoJsonError::Encode)
    }

    /// Encode as pretty-printed GeoJSON into `writer`.
    pub fn write_geojson<W: Write>(&self, writer: W) -> Result<(), GeoJsonError> {
        serde_json::to_writer_pretty(writer, self).map_err(GeoJsonError::Encode)
    }

    /// Decode a GeoJSON point collection from text.
    pub fn from_geojson_str(text: &str) -> Result<Self, GeoJsonError> {
        let document: CollectionIn = serde_json::from_str(text).map_err(GeoJsonError::Decode)?;
        Self::from_document(document)
    }

    /// Decode a GeoJSON point collection from `reader`.
    pub fn read_geojson<R: Read>(reader: R) -> Result<Self, GeoJsonError> {
        let document: CollectionIn =
            serde_json::from_reader(reader).map_err(GeoJsonError::Decode)?;
        Self::from_document(document)
    }

    fn from_document(document: CollectionIn) -> Result<Self, GeoJsonError> {
        document
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| feature.into_feature(index))
            .collect()
    }
}
