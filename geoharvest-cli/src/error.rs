//! Error types emitted by the geoharvest CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use geoharvest_core::{ConfigurationError, FetchError, GeoJsonError};
use geoharvest_data::ClientBuildError;
use thiserror::Error;

/// Errors emitted by the geoharvest CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The geocode command was given nothing to look up.
    #[error("no addresses given (pass them as arguments or with --addresses-file)")]
    MissingAddresses,
    /// A resolved option failed validation, e.g. an inverted bounding box.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),
    /// Installing the stderr logger failed.
    #[error("failed to start logging: {0}")]
    Logging(#[from] flexi_logger::FlexiLoggerError),
    /// The HTTP client or its runtime could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    BuildTransport(#[from] ClientBuildError),
    /// Fetching the map-server layer catalogue failed.
    #[error("failed to list map-server layers: {0}")]
    ListLayers(#[source] FetchError),
    /// Reading the address list failed.
    #[error("failed to read addresses from {path:?}: {source}")]
    ReadAddresses {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening an input artefact failed.
    #[error("failed to open input {path:?}: {source}")]
    OpenInput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An input artefact was not a point feature collection.
    #[error("failed to decode GeoJSON in {path:?}: {source}")]
    DecodeInput {
        path: Utf8PathBuf,
        #[source]
        source: GeoJsonError,
    },
    /// Creating or writing an output artefact failed.
    #[error("failed to write {path:?}: {source}")]
    WriteOutput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Encoding the feature collection failed.
    #[error("failed to encode GeoJSON for {path:?}: {source}")]
    EncodeOutput {
        path: Utf8PathBuf,
        #[source]
        source: GeoJsonError,
    },
    /// Encoding a raw response capture failed.
    #[error("failed to encode raw response for {path:?}: {source}")]
    EncodeRaw {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Serializing the stdout report failed.
    #[error("failed to serialize report: {0}")]
    SerializeReport(#[source] serde_json::Error),
    /// Writing the stdout report failed.
    #[error("failed to write report: {0}")]
    WriteReport(#[source] std::io::Error),
}
