//! Facade crate for the geoharvest ingestion pipeline.
//!
//! This crate re-exports the core domain types and, behind the `http`
//! feature, the source clients and the pipeline orchestrator.

#![forbid(unsafe_code)]

pub use geoharvest_core::{
    AddressQuery, BoundingBox, ConfigurationError, Crs, Feature, FeatureCollection, FetchError,
    FetchResult, GeoJsonError, LayerQuery, NormalizationError, Properties, PropertyValue,
    RawResponse, SourceClient, SourceKind, SourceQuery, filter_by_bbox,
};

#[cfg(feature = "http")]
pub use geoharvest_data::{
    GeocoderClient, GeocoderConfig, HttpTransport, HttpTransportConfig, ImageFormat, ImageSize,
    LayerSummary, MapExport, MapExtent, MapServerClient, MapServerConfig, MarkerFeedClient,
    MarkerFeedConfig, Normalizer, Pipeline, PipelineConfig, RateLimiter, ResponseFormat,
    RunOutcome, RunSummary, Transport, normalize,
};
