//! Errors raised while normalising records and validating run configuration.

use thiserror::Error;

use crate::SourceKind;

/// A single source record could not be turned into a [`crate::Feature`].
///
/// Normalisation errors are scoped to one record: the record is dropped and
/// the rest of the batch carries on.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum NormalizationError {
    /// A required field was absent from the record.
    #[error("record {record} is missing required field `{field}`")]
    MissingField {
        /// Label identifying the record within its response.
        record: String,
        /// Name of the absent field.
        field: String,
    },
    /// A coordinate was present but not a finite number.
    #[error("record {record} has an invalid coordinate: {reason}")]
    InvalidCoordinate {
        /// Label identifying the record within its response.
        record: String,
        /// What was wrong with the coordinate.
        reason: String,
    },
    /// A geographic coordinate fell outside the WGS-84 value ranges.
    #[error("record {record} has out-of-range coordinates ({longitude}, {latitude})")]
    OutOfRange {
        /// Label identifying the record within its response.
        record: String,
        /// Supplied longitude.
        longitude: f64,
        /// Supplied latitude.
        latitude: f64,
    },
    /// A property value was an array or an object.
    #[error("record {record} property `{key}` is not a scalar value")]
    NonScalarProperty {
        /// Label identifying the record within its response.
        record: String,
        /// Offending property key.
        key: String,
    },
    /// The response as a whole did not have the shape the source promises.
    #[error("{kind} response is not {expected}")]
    UnexpectedShape {
        /// Source whose schema was expected.
        kind: SourceKind,
        /// Description of the expected shape.
        expected: &'static str,
    },
}

/// Fatal, run-level configuration problems.
///
/// These are surfaced before any fetching begins; no partial run is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// A run was requested with nothing to fetch.
    #[error("at least one query is required")]
    EmptyQueryList,
    /// A standalone geocoding query had no text.
    #[error("address text is empty")]
    EmptyAddressText,
    /// An entry in an address list had no text.
    #[error("address at position {index} is empty")]
    EmptyAddress {
        /// Zero-based position of the address in the input list.
        index: usize,
    },
    /// A map query had an empty filter predicate.
    #[error("layer query predicate must not be empty")]
    EmptyPredicate,
    /// Bounding box minimums exceed maximums.
    #[error("bounding box is inverted: {axis} minimum {min} exceeds maximum {max}")]
    InvertedBounds {
        /// Either `latitude` or `longitude`.
        axis: &'static str,
        /// Supplied minimum.
        min: String,
        /// Supplied maximum.
        max: String,
    },
    /// A map export was requested with a zero-sized image.
    #[error("image size {width}x{height} must be non-zero")]
    EmptyImageSize {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
    /// A bounding box edge was NaN or infinite.
    #[error("bounding box {edge} must be a finite number")]
    NonFiniteBound {
        /// Name of the offending edge.
        edge: &'static str,
    },
    /// A bounding box string could not be parsed.
    #[error("cannot parse bounding box {input:?}: expected minLat,maxLat,minLon,maxLon")]
    UnparsableBounds {
        /// Raw input text.
        input: String,
    },
    /// A source base URL was not an absolute URL.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// Offending URL text.
        url: String,
        /// Parser diagnostic.
        reason: String,
    },
    /// A query was routed to a client for a different source.
    #[error("{found} query cannot be served by a {expected} client")]
    QueryMismatch {
        /// Kind served by the client.
        expected: SourceKind,
        /// Kind of the offending query.
        found: SourceKind,
    },
}
