//! Remote sources, normalization and orchestration for geoharvest.
//!
//! Responsibilities:
//! - Talk to the map-server, geocoder and marker-feed services through a
//!   pluggable [`transport::Transport`].
//! - Reconcile each source's native record layout into canonical features.
//! - Pace rate-limited sources and drive the fetch/normalize/filter run.
//!
//! Boundaries:
//! - Domain types and the spatial filter live in `geoharvest-core`.
//! - Writing artefacts to disk is left to the caller (see `geoharvest-cli`).
//!
//! Invariants:
//! - Strictly sequential: one request in flight at a time.
//! - No global mutable state; a run owns its limiter and feature collection.

#![forbid(unsafe_code)]

pub mod normalize;
pub mod pipeline;
pub mod rate_limit;
pub mod sources;
pub mod transport;

#[doc(hidden)]
pub mod test_support;

pub use normalize::{Normalized, Normalizer, normalize};
pub use pipeline::{Pipeline, PipelineConfig, RunOutcome, RunSummary};
pub use rate_limit::{Clock, DEFAULT_MIN_INTERVAL, RateLimiter, SystemClock};
pub use sources::{
    GeocoderClient, GeocoderConfig, ImageFormat, ImageSize, LayerSummary, MapExport, MapExtent,
    MapServerClient, MapServerConfig, MarkerFeedClient, MarkerFeedConfig, ResponseFormat,
};
pub use transport::{
    ClientBuildError, HttpTransport, HttpTransportConfig, Transport, TransportError,
};
