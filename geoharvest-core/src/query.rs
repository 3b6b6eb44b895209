use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ConfigurationError;

/// The remote sources a run can draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Predicate-based feature query against a tiled map service.
    MapServer,
    /// Free-text geocoding returning at most one best match.
    Geocoder,
    /// Parameterless bulk fetch of keyed marker records.
    MarkerFeed,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MapServer => "map-server",
            Self::Geocoder => "geocoder",
            Self::MarkerFeed => "marker-feed",
        })
    }
}

/// Coordinate reference system requested from, or reported by, a source.
///
/// Only used to decide which coordinate checks apply; coordinates are never
/// transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// Geographic longitude/latitude on WGS-84 (EPSG:4326).
    Wgs84,
    /// Any other EPSG code, treated as projected.
    Epsg(u32),
}

impl Crs {
    /// Lithuanian LKS-94 / Transverse Mercator (EPSG:3346).
    pub const LKS94: Self = Self::Epsg(3346);

    /// Map an EPSG well-known ID onto a [`Crs`].
    #[must_use]
    pub const fn from_wkid(wkid: u32) -> Self {
        match wkid {
            4326 => Self::Wgs84,
            other => Self::Epsg(other),
        }
    }

    /// EPSG well-known ID.
    #[must_use]
    pub const fn wkid(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::Epsg(code) => code,
        }
    }

    /// Whether coordinates are longitude/latitude degrees.
    #[must_use]
    pub const fn is_geographic(self) -> bool {
        matches!(self, Self::Wgs84)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::LKS94
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.wkid())
    }
}

/// Parameters for one map-server layer query.
///
/// # Examples
/// ```
/// use geoharvest_core::{Crs, LayerQuery};
///
/// # fn main() -> Result<(), geoharvest_core::ConfigurationError> {
/// let query = LayerQuery::new(1, "1=1")?.with_out_fields("OBJECTID,NAME");
/// assert_eq!(query.out_sr(), Crs::LKS94);
/// assert!(query.return_geometry());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerQuery {
    layer_id: u32,
    predicate: String,
    out_fields: String,
    return_geometry: bool,
    out_sr: Crs,
}

impl LayerQuery {
    /// Query `layer_id` for records matching the SQL-like `predicate`.
    pub fn new(layer_id: u32, predicate: impl Into<String>) -> Result<Self, ConfigurationError> {
        let predicate = predicate.into();
        if predicate.trim().is_empty() {
            return Err(ConfigurationError::EmptyPredicate);
        }
        Ok(Self {
            layer_id,
            predicate,
            out_fields: "*".to_owned(),
            return_geometry: true,
            out_sr: Crs::default(),
        })
    }

    /// Restrict the returned attribute fields (comma-separated, `*` for all).
    #[must_use]
    pub fn with_out_fields(mut self, out_fields: impl Into<String>) -> Self {
        self.out_fields = out_fields.into();
        self
    }

    /// Toggle whether geometries are included in the response.
    #[must_use]
    pub const fn with_geometry(mut self, return_geometry: bool) -> Self {
        self.return_geometry = return_geometry;
        self
    }

    /// Request coordinates in `out_sr`.
    #[must_use]
    pub const fn with_out_sr(mut self, out_sr: Crs) -> Self {
        self.out_sr = out_sr;
        self
    }

    /// Target layer.
    #[must_use]
    pub const fn layer_id(&self) -> u32 {
        self.layer_id
    }

    /// Filter predicate.
    #[must_use]
    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    /// Selected fields.
    #[must_use]
    pub fn out_fields(&self) -> &str {
        &self.out_fields
    }

    /// Whether geometries are requested.
    #[must_use]
    pub const fn return_geometry(&self) -> bool {
        self.return_geometry
    }

    /// Requested output reference system.
    #[must_use]
    pub const fn out_sr(&self) -> Crs {
        self.out_sr
    }
}

/// Free-text address for a geocoding request. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressQuery(String);

impl AddressQuery {
    /// Validate and wrap `address` exactly as given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EmptyAddressText`] when `address` is
    /// empty or whitespace only.
    pub fn new(address: &str) -> Result<Self, ConfigurationError> {
        if address.trim().is_empty() {
            return Err(ConfigurationError::EmptyAddressText);
        }
        Ok(Self(address.to_owned()))
    }

    /// Address text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AddressQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parameters for a single fetch call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceQuery {
    /// Map-server layer query.
    Layer(LayerQuery),
    /// Geocoding request.
    Address(AddressQuery),
    /// Feed-style fetch with no parameters.
    Feed,
}

impl SourceQuery {
    /// The source this query is meant for.
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        match self {
            Self::Layer(_) => SourceKind::MapServer,
            Self::Address(_) => SourceKind::Geocoder,
            Self::Feed => SourceKind::MarkerFeed,
        }
    }

    /// Short human-readable label used in run reports.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Layer(query) => format!("layer {} where {}", query.layer_id, query.predicate),
            Self::Address(address) => address.as_str().to_owned(),
            Self::Feed => "marker feed".to_owned(),
        }
    }
}

impl From<LayerQuery> for SourceQuery {
    fn from(query: LayerQuery) -> Self {
        Self::Layer(query)
    }
}

impl From<AddressQuery> for SourceQuery {
    fn from(query: AddressQuery) -> Self {
        Self::Address(query)
    }
}
