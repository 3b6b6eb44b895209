//! Geocode command implementation for the geoharvest CLI.

use std::io::Write;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use geoharvest_data::{
    GeocoderClient, GeocoderConfig, HttpTransport, Pipeline, PipelineConfig, Transport,
};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::{self, RunReport};
use crate::{
    ARG_ADDRESSES_FILE, ARG_BBOX, ARG_COUNTRY_CODES, ARG_GEOCODER_URL, ARG_MIN_INTERVAL_MS,
    ARG_OUTPUT, CliError, fs, parse_bbox,
};

/// Artefact written when `--output` is not given.
pub(crate) const DEFAULT_GEOCODE_OUTPUT: &str = "vilnius_addresses.geojson";

/// CLI arguments for the `geocode` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "geocode",
    long_about = "Geocode street addresses one at a time, pacing requests to \
                 respect the geocoder's usage policy. Addresses come from \
                 positional arguments and/or a file with one address per \
                 line; blank lines and lines starting with '#' are ignored.",
    about = "Geocode street addresses into point features"
)]
#[ortho_config(prefix = "GEOHARVEST")]
pub(crate) struct GeocodeArgs {
    /// Addresses to geocode, in order.
    #[arg(value_name = "address")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) addresses: Vec<String>,
    /// File with one address per line, appended after positional addresses.
    #[arg(long = ARG_ADDRESSES_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) addresses_file: Option<Utf8PathBuf>,
    /// GeoJSON artefact to write.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Keep only matches inside `minLat,maxLat,minLon,maxLon`.
    #[arg(long = ARG_BBOX, value_name = "bounds")]
    #[serde(default)]
    pub(crate) bbox: Option<String>,
    /// Minimum spacing between geocoder requests, in milliseconds.
    #[arg(long = ARG_MIN_INTERVAL_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) min_interval_ms: Option<u64>,
    /// Geocoder search endpoint.
    #[arg(long = ARG_GEOCODER_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) geocoder_url: Option<String>,
    /// Comma-separated country codes; pass an empty string to search worldwide.
    #[arg(long = ARG_COUNTRY_CODES, value_name = "codes")]
    #[serde(default)]
    pub(crate) country_codes: Option<String>,
}

impl GeocodeArgs {
    pub(crate) fn into_config(self) -> Result<GeocodeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        GeocodeConfig::try_from(merged)
    }
}

/// Resolved `geocode` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GeocodeConfig {
    /// Addresses given directly.
    pub(crate) addresses: Vec<String>,
    /// Optional address list file.
    pub(crate) addresses_file: Option<Utf8PathBuf>,
    /// Output artefact path.
    pub(crate) output: Utf8PathBuf,
    /// Pacing and filtering.
    pub(crate) pipeline: PipelineConfig,
    /// Geocoder endpoint settings.
    pub(crate) geocoder: GeocoderConfig,
}

impl GeocodeConfig {
    /// Positional addresses followed by those read from the address file.
    pub(crate) fn load_addresses(&self) -> Result<Vec<String>, CliError> {
        let mut addresses = self.addresses.clone();
        if let Some(path) = &self.addresses_file {
            addresses.extend(read_address_file(path)?);
        }
        if addresses.is_empty() {
            return Err(CliError::MissingAddresses);
        }
        Ok(addresses)
    }
}

impl TryFrom<GeocodeArgs> for GeocodeConfig {
    type Error = CliError;

    fn try_from(args: GeocodeArgs) -> Result<Self, Self::Error> {
        let defaults = PipelineConfig::default();
        let min_interval = args
            .min_interval_ms
            .map_or(defaults.min_interval, Duration::from_millis);
        let pipeline = defaults
            .with_min_interval(min_interval)
            .with_bbox(parse_bbox(args.bbox.as_deref())?);

        let mut geocoder = args
            .geocoder_url
            .map_or_else(GeocoderConfig::default, GeocoderConfig::new);
        if let Some(codes) = args.country_codes {
            geocoder = geocoder.with_country_codes(Some(codes));
        }

        Ok(Self {
            addresses: args.addresses,
            addresses_file: args.addresses_file,
            output: args
                .output
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_GEOCODE_OUTPUT)),
            pipeline,
            geocoder,
        })
    }
}

fn read_address_file(path: &Utf8Path) -> Result<Vec<String>, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::ReadAddresses {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

pub(super) fn run_geocode(args: GeocodeArgs) -> Result<(), CliError> {
    let transport = HttpTransport::new()?;
    let mut stdout = std::io::stdout().lock();
    run_geocode_with(args, &transport, &mut stdout)
}

pub(super) fn run_geocode_with(
    args: GeocodeArgs,
    transport: &dyn Transport,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_geocode(&config, transport, writer)
}

pub(super) fn execute_geocode(
    config: &GeocodeConfig,
    transport: &dyn Transport,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let addresses = config.load_addresses()?;
    let client = GeocoderClient::new(transport, config.geocoder.clone())?;
    let outcome = Pipeline::new(config.pipeline).geocode_addresses(&client, &addresses)?;
    output::write_collection(&config.output, &outcome.features)?;
    output::write_report(
        writer,
        &RunReport {
            output: &config.output,
            raw_output: None,
            summary: &outcome.summary,
        },
    )
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<GeocodeConfig, CliError> {
    let merged = GeocodeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    GeocodeConfig::try_from(merged)
}
