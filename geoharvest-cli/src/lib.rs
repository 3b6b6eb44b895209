//! Command-line driver for the geoharvest ingestion pipeline.
//!
//! Each fetch subcommand resolves its layered configuration, runs the
//! pipeline against one source, writes the resulting GeoJSON artefact and
//! prints the run summary as JSON on stdout.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use geoharvest_core::BoundingBox;

mod error;
mod filter;
mod fs;
mod geocode;
mod layer;
mod layers;
mod logging;
mod markers;
mod output;

pub use error::CliError;

use filter::FilterArgs;
use geocode::GeocodeArgs;
use layer::LayerArgs;
use layers::LayersArgs;
use markers::MarkersArgs;

pub(crate) const ARG_LOG_LEVEL: &str = "log-level";
pub(crate) const ENV_LOG_LEVEL: &str = "GEOHARVEST_LOG_LEVEL";
pub(crate) const DEFAULT_LOG_LEVEL: &str = "info";

pub(crate) const ARG_OUTPUT: &str = "output";
pub(crate) const ARG_BBOX: &str = "bbox";

pub(crate) const ARG_ADDRESSES_FILE: &str = "addresses-file";
pub(crate) const ARG_MIN_INTERVAL_MS: &str = "min-interval-ms";
pub(crate) const ARG_GEOCODER_URL: &str = "geocoder-url";
pub(crate) const ARG_COUNTRY_CODES: &str = "country-codes";

pub(crate) const ARG_RAW_OUTPUT: &str = "raw-output";
pub(crate) const ARG_NO_FILTER: &str = "no-filter";
/// Clap id of the `no_filter` field, used by `conflicts_with`.
pub(crate) const ARG_ID_NO_FILTER: &str = "no_filter";
pub(crate) const ARG_FEED_URL: &str = "feed-url";

pub(crate) const ARG_LAYER_ID: &str = "layer-id";
pub(crate) const ARG_WHERE: &str = "where";
pub(crate) const ARG_OUT_FIELDS: &str = "out-fields";
pub(crate) const ARG_OUT_SR: &str = "out-sr";
pub(crate) const ARG_NO_GEOMETRY: &str = "no-geometry";
pub(crate) const ARG_GEOJSON: &str = "geojson";
pub(crate) const ARG_MAP_SERVER_URL: &str = "map-server-url";
pub(crate) const ENV_LAYER_ID: &str = "GEOHARVEST_CMDS_LAYER_LAYER_ID";

pub(crate) const ARG_INPUT: &str = "input";
pub(crate) const ENV_FILTER_INPUT: &str = "GEOHARVEST_CMDS_FILTER_INPUT";

/// Run the geoharvest CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let _logger = logging::init(&cli.log_level)?;
    match cli.command {
        Command::Geocode(args) => geocode::run_geocode(args),
        Command::Markers(args) => markers::run_markers(args),
        Command::Layer(args) => layer::run_layer(args),
        Command::Layers(args) => layers::run_layers(args),
        Command::Filter(args) => filter::run_filter(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "geoharvest",
    about = "Fetch point features from public map, geocoding and charger feeds",
    version
)]
struct Cli {
    /// Log level or `RUST_LOG`-style filter specification.
    #[arg(
        long = ARG_LOG_LEVEL,
        env = ENV_LOG_LEVEL,
        default_value = DEFAULT_LOG_LEVEL,
        global = true,
        value_name = "spec"
    )]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Geocode street addresses into point features.
    Geocode(GeocodeArgs),
    /// Download the EV charger marker feed.
    Markers(MarkersArgs),
    /// Query one map-server layer.
    Layer(LayerArgs),
    /// List the layers a map server publishes.
    Layers(LayersArgs),
    /// Re-filter an existing GeoJSON artefact by bounding box.
    Filter(FilterArgs),
}

/// Parse an optional `minLat,maxLat,minLon,maxLon` string.
pub(crate) fn parse_bbox(text: Option<&str>) -> Result<Option<BoundingBox>, CliError> {
    text.map(str::parse::<BoundingBox>)
        .transpose()
        .map_err(CliError::InvalidConfiguration)
}

#[cfg(test)]
mod tests;
