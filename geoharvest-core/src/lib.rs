//! Core domain types for the geoharvest pipeline.
//!
//! Responsibilities:
//! - Model canonical point features and their scalar properties.
//! - Describe the queries issued against remote sources and the errors a
//!   fetch, a normalisation or a configuration step can produce.
//! - Provide the pure spatial filter and the GeoJSON interchange codec.
//!
//! Boundaries:
//! - No network or filesystem access lives here (see `geoharvest-data` and
//!   `geoharvest-cli`).
//! - Coordinates are passed through in whatever reference system the source
//!   used; nothing in this crate reprojects.

#![forbid(unsafe_code)]

pub mod bbox;
mod error;
mod feature;
pub mod filter;
pub mod geojson;
mod query;
pub mod source;

pub use bbox::BoundingBox;
pub use error::{ConfigurationError, NormalizationError};
pub use feature::{Feature, FeatureCollection, Properties, PropertyValue};
pub use filter::filter_by_bbox;
pub use geojson::GeoJsonError;
pub use query::{AddressQuery, Crs, LayerQuery, SourceKind, SourceQuery};
pub use source::{FetchError, FetchResult, RawResponse, SourceClient};
