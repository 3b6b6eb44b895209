//! Layer command implementation for the geoharvest CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use geoharvest_core::{Crs, LayerQuery, SourceQuery};
use geoharvest_data::{
    HttpTransport, MapServerClient, MapServerConfig, Pipeline, PipelineConfig, ResponseFormat,
    Transport,
};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::{self, RunReport};
use crate::{
    ARG_BBOX, ARG_GEOJSON, ARG_LAYER_ID, ARG_MAP_SERVER_URL, ARG_NO_GEOMETRY, ARG_OUT_FIELDS,
    ARG_OUT_SR, ARG_OUTPUT, ARG_WHERE, CliError, ENV_LAYER_ID, parse_bbox,
};

const DEFAULT_PREDICATE: &str = "1=1";
const DEFAULT_OUT_FIELDS: &str = "*";

/// CLI arguments for the `layer` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "layer",
    long_about = "Query one map-server layer and convert its point records \
                 into features. Coordinates are kept in the requested \
                 spatial reference (EPSG:3346 by default); a --bbox filter \
                 is only meaningful when requesting EPSG:4326.",
    about = "Query one map-server layer"
)]
#[ortho_config(prefix = "GEOHARVEST")]
pub(crate) struct LayerArgs {
    /// Numeric layer identifier.
    #[arg(value_name = "layer-id")]
    #[serde(default)]
    pub(crate) layer_id: Option<u32>,
    /// SQL-like filter predicate.
    #[arg(long = ARG_WHERE, value_name = "predicate")]
    #[serde(default)]
    pub(crate) r#where: Option<String>,
    /// Comma-separated attribute fields, `*` for all.
    #[arg(long = ARG_OUT_FIELDS, value_name = "fields")]
    #[serde(default)]
    pub(crate) out_fields: Option<String>,
    /// EPSG code of the requested output spatial reference.
    #[arg(long = ARG_OUT_SR, value_name = "wkid")]
    #[serde(default)]
    pub(crate) out_sr: Option<u32>,
    /// Request attributes only.
    #[arg(long = ARG_NO_GEOMETRY)]
    #[serde(default)]
    pub(crate) no_geometry: bool,
    /// Ask the service for GeoJSON instead of Esri JSON.
    #[arg(long = ARG_GEOJSON)]
    #[serde(default)]
    pub(crate) geojson: bool,
    /// GeoJSON artefact to write.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Keep only features inside `minLat,maxLat,minLon,maxLon`.
    #[arg(long = ARG_BBOX, value_name = "bounds")]
    #[serde(default)]
    pub(crate) bbox: Option<String>,
    /// Map service root URL.
    #[arg(long = ARG_MAP_SERVER_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) map_server_url: Option<String>,
}

impl LayerArgs {
    pub(crate) fn into_config(self) -> Result<LayerConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        LayerConfig::try_from(merged)
    }
}

/// Resolved `layer` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LayerConfig {
    /// Query to run.
    pub(crate) query: LayerQuery,
    /// Output artefact path.
    pub(crate) output: Utf8PathBuf,
    /// Filtering settings.
    pub(crate) pipeline: PipelineConfig,
    /// Map service settings.
    pub(crate) map_server: MapServerConfig,
}

impl TryFrom<LayerArgs> for LayerConfig {
    type Error = CliError;

    fn try_from(args: LayerArgs) -> Result<Self, Self::Error> {
        let layer_id = args.layer_id.ok_or(CliError::MissingArgument {
            field: ARG_LAYER_ID,
            env: ENV_LAYER_ID,
        })?;
        let query = LayerQuery::new(
            layer_id,
            args.r#where.unwrap_or_else(|| DEFAULT_PREDICATE.to_owned()),
        )?
        .with_out_fields(
            args.out_fields
                .unwrap_or_else(|| DEFAULT_OUT_FIELDS.to_owned()),
        )
        .with_geometry(!args.no_geometry)
        .with_out_sr(args.out_sr.map_or_else(Crs::default, Crs::from_wkid));

        let format = if args.geojson {
            ResponseFormat::GeoJson
        } else {
            ResponseFormat::EsriJson
        };
        let map_server = args
            .map_server_url
            .map_or_else(MapServerConfig::default, MapServerConfig::new)
            .with_response_format(format);

        Ok(Self {
            query,
            output: args
                .output
                .unwrap_or_else(|| Utf8PathBuf::from(format!("layer_{layer_id}_data.geojson"))),
            pipeline: PipelineConfig::default().with_bbox(parse_bbox(args.bbox.as_deref())?),
            map_server,
        })
    }
}

pub(super) fn run_layer(args: LayerArgs) -> Result<(), CliError> {
    let transport = HttpTransport::new()?;
    let mut stdout = std::io::stdout().lock();
    run_layer_with(args, &transport, &mut stdout)
}

pub(super) fn run_layer_with(
    args: LayerArgs,
    transport: &dyn Transport,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_layer(&config, transport, writer)
}

pub(super) fn execute_layer(
    config: &LayerConfig,
    transport: &dyn Transport,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let client = MapServerClient::new(transport, config.map_server.clone())?;
    let query = SourceQuery::from(config.query.clone());
    let outcome = Pipeline::new(config.pipeline).run_single(&client, query)?;
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
) -> Result<LayerConfig, CliError> {
    let merged = LayerArgs::merge_from_layers(layers).map_err(CliError::from)?;
    LayerConfig::try_from(merged)
}
