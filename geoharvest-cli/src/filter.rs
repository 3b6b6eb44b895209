//! Filter command: re-filter an existing GeoJSON artefact without fetching.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use geoharvest_core::{BoundingBox, filter_by_bbox};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output;
use crate::{ARG_BBOX, ARG_INPUT, ARG_OUTPUT, CliError, ENV_FILTER_INPUT, parse_bbox};

/// CLI arguments for the `filter` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "filter",
    long_about = "Read a GeoJSON point collection and keep the features \
                 inside the bounding box (the Vilnius area unless --bbox is \
                 given). The output defaults to <input stem>_filtered.geojson \
                 next to the input.",
    about = "Re-filter an existing GeoJSON artefact by bounding box"
)]
#[ortho_config(prefix = "GEOHARVEST")]
pub(crate) struct FilterArgs {
    /// GeoJSON point collection to read.
    #[arg(value_name = "input")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// GeoJSON artefact to write.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Bounds as `minLat,maxLat,minLon,maxLon`.
    #[arg(long = ARG_BBOX, value_name = "bounds")]
    #[serde(default)]
    pub(crate) bbox: Option<String>,
}

impl FilterArgs {
    pub(crate) fn into_config(self) -> Result<FilterConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        FilterConfig::try_from(merged)
    }
}

/// Resolved `filter` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FilterConfig {
    /// Input artefact.
    pub(crate) input: Utf8PathBuf,
    /// Output artefact.
    pub(crate) output: Utf8PathBuf,
    /// Containment box.
    pub(crate) bbox: BoundingBox,
}

impl TryFrom<FilterArgs> for FilterConfig {
    type Error = CliError;

    fn try_from(args: FilterArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_FILTER_INPUT,
        })?;
        let bbox = parse_bbox(args.bbox.as_deref())?.unwrap_or_default();
        let output = args.output.unwrap_or_else(|| filtered_sibling(&input));
        Ok(Self {
            input,
            output,
            bbox,
        })
    }
}

/// `dir/name.geojson` becomes `dir/name_filtered.geojson`.
fn filtered_sibling(input: &Utf8Path) -> Utf8PathBuf {
    let stem = input.file_stem().unwrap_or("features");
    input.with_file_name(format!("{stem}_filtered.geojson"))
}

/// Counts printed after a filter run.
#[derive(Debug, Serialize)]
struct FilterReport<'a> {
    input: &'a Utf8Path,
    output: &'a Utf8Path,
    read: usize,
    filtered_out: usize,
    emitted: usize,
}

pub(super) fn run_filter(args: FilterArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_filter_with(args, &mut stdout)
}

pub(super) fn run_filter_with(args: FilterArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_filter(&config, writer)
}

pub(super) fn execute_filter(config: &FilterConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    let features = output::read_collection(&config.input)?;
    let kept = filter_by_bbox(&features, &config.bbox);
    let filtered_out = features.len().saturating_sub(kept.len());
    info!(
        "kept {} of {} features inside {}",
        kept.len(),
        features.len(),
        config.bbox
    );
    output::write_collection(&config.output, &kept)?;
    output::write_report(
        writer,
        &FilterReport {
            input: &config.input,
            output: &config.output,
            read: features.len(),
            filtered_out,
            emitted: kept.len(),
        },
    )
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<FilterConfig, CliError> {
    let merged = FilterArgs::merge_from_layers(layers).map_err(CliError::from)?;
    FilterConfig::try_from(merged)
}
