//! Record normalizer: source-specific shapes into canonical [`Feature`]s.
//!
//! [`Normalizer`] has one variant per source kind. Each variant walks its
//! source's native layout, turns every usable record into a [`Feature`] and
//! sets aside every unusable one as a [`NormalizationError`]. A bad record
//! never aborts the batch, and normalization itself never fails: a response
//! whose overall shape is wrong yields no features and a single
//! [`NormalizationError::UnexpectedShape`].

mod geocoder;
mod map_server;
mod markers;

use geoharvest_core::{
    Crs, Feature, NormalizationError, Properties, PropertyValue, RawResponse, SourceKind,
    SourceQuery,
};
use serde_json::{Map, Value};

pub use markers::REQUIRED_STATION_FIELDS;

/// Features extracted from one raw response, plus the records that were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Usable features in source order.
    pub features: Vec<Feature>,
    /// One entry per dropped record.
    pub rejected: Vec<NormalizationError>,
}

impl Normalized {
    fn unusable(error: NormalizationError) -> Self {
        Self {
            features: Vec::new(),
            rejected: vec![error],
        }
    }

    /// Whether the response produced nothing but rejections.
    #[must_use]
    pub fn is_unusable(&self) -> bool {
        self.features.is_empty() && !self.rejected.is_empty()
    }
}

impl FromIterator<Result<Feature, NormalizationError>> for Normalized {
    fn from_iter<I: IntoIterator<Item = Result<Feature, NormalizationError>>>(iter: I) -> Self {
        let mut normalized = Self::default();
        for outcome in iter {
            match outcome {
                Ok(feature) => normalized.features.push(feature),
                Err(error) => normalized.rejected.push(error),
            }
        }
        normalized
    }
}

/// Schema reconciliation for one source kind.
///
/// Built from the query that produced the response, since some sources need
/// query context: the geocoder echoes the input address into the feature, and
/// map queries declare the reference system their coordinates use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer<'a> {
    /// Map-server feature array (Esri JSON or GeoJSON elements).
    MapServer {
        /// Reference system requested for the response.
        out_sr: Crs,
    },
    /// Geocoder match array; only the first match is used.
    Geocoder {
        /// The address text that was looked up.
        address: &'a str,
    },
    /// Keyed marker set under `stations`.
    MarkerFeed,
}

impl<'a> Normalizer<'a> {
    /// Pick the variant matching `query`.
    #[must_use]
    pub fn for_query(query: &'a SourceQuery) -> Self {
        match query {
            SourceQuery::Layer(layer) => Self::MapServer {
                out_sr: layer.out_sr(),
            },
            SourceQuery::Address(address) => Self::Geocoder {
                address: address.as_str(),
            },
            SourceQuery::Feed => Self::MarkerFeed,
        }
    }

    /// Source kind this variant understands.
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        match self {
            Self::MapServer { .. } => SourceKind::MapServer,
            Self::Geocoder { .. } => SourceKind::Geocoder,
            Self::MarkerFeed => SourceKind::MarkerFeed,
        }
    }

    /// Map `raw` into canonical features.
    #[must_use]
    pub fn normalize(&self, raw: &RawResponse) -> Normalized {
        match *self {
            Self::MapServer { out_sr } => map_server::normalize(out_sr, raw),
            Self::Geocoder { address } => geocoder::normalize(address, raw),
            Self::MarkerFeed => markers::normalize(raw),
        }
    }
}

/// Normalize the response `raw` obtained for `query`.
///
/// # Examples
/// ```
/// use geoharvest_core::SourceQuery;
/// use geoharvest_data::normalize::normalize;
/// use serde_json::json;
///
/// let raw = json!({"stations": {"1": {
///     "StationId": 1, "Lat": 54.7, "Lon": 25.3, "Status": 1,
///     "status_name": "Available", "status_timestamp": "2024-01-01T00:00:00Z"
/// }}});
/// let normalized = normalize(&SourceQuery::Feed, &raw);
/// assert_eq!(normalized.features.len(), 1);
/// assert_eq!(normalized.features[0].longitude(), 25.3);
/// assert!(normalized.rejected.is_empty());
/// ```
#[must_use]
pub fn normalize(query: &SourceQuery, raw: &RawResponse) -> Normalized {
    Normalizer::for_query(query).normalize(raw)
}

/// Copy scalar attributes verbatim, rejecting arrays and objects.
fn scalar_properties<'v>(
    record: &str,
    entries: impl IntoIterator<Item = (&'v String, &'v Value)>,
) -> Result<Properties, NormalizationError> {
    entries
        .into_iter()
        .map(|(key, value)| {
            PropertyValue::try_from(value)
                .map(|scalar| (key.clone(), scalar))
                .map_err(|()| NormalizationError::NonScalarProperty {
                    record: record.to_owned(),
                    key: key.clone(),
                })
        })
        .collect()
}

/// Fetch a field that must be present, though it may be `null`.
fn required<'v>(
    record: &str,
    fields: &'v Map<String, Value>,
    field: &str,
) -> Result<&'v Value, NormalizationError> {
    fields
        .get(field)
        .ok_or_else(|| NormalizationError::MissingField {
            record: record.to_owned(),
            field: field.to_owned(),
        })
}

/// Read a coordinate that must be a JSON number.
fn numeric_coordinate(record: &str, field: &str, value: &Value) -> Result<f64, NormalizationError> {
    value
        .as_f64()
        .ok_or_else(|| NormalizationError::InvalidCoordinate {
            record: record.to_owned(),
            reason: format!("`{field}` is {value}, not a number"),
        })
}

/// Build a feature, enforcing WGS-84 ranges only for geographic systems.
fn build_feature(
    record: &str,
    crs: Crs,
    location: geo::Coord<f64>,
    properties: Properties,
) -> Result<Feature, NormalizationError> {
    if crs.is_geographic() {
        Feature::geographic(record, location, properties)
    } else {
        Feature::new(record, location, properties)
    }
}
