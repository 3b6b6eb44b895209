//! Layers command: print a map server's layer catalogue.

use std::io::Write;

use clap::Parser;
use geoharvest_data::{HttpTransport, MapServerClient, MapServerConfig, Transport};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{ARG_MAP_SERVER_URL, CliError, output};

/// CLI arguments for the `layers` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "layers",
    about = "List the layers a map server publishes as JSON"
)]
#[ortho_config(prefix = "GEOHARVEST")]
pub(crate) struct LayersArgs {
    /// Map service root URL.
    #[arg(long = ARG_MAP_SERVER_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) map_server_url: Option<String>,
}

impl LayersArgs {
    pub(crate) fn into_config(self) -> Result<MapServerConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(merged
            .map_server_url
            .map_or_else(MapServerConfig::default, MapServerConfig::new))
    }
}

pub(super) fn run_layers(args: LayersArgs) -> Result<(), CliError> {
    let transport = HttpTransport::new()?;
    let mut stdout = std::io::stdout().lock();
    run_layers_with(args, &transport, &mut stdout)
}

pub(super) fn run_layers_with(
    args: LayersArgs,
    transport: &dyn Transport,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_layers(config, transport, writer)
}

pub(super) fn execute_layers(
    config: MapServerConfig,
    transport: &dyn Transport,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let client = MapServerClient::new(transport, config)?;
    let layers = client.list_layers().map_err(CliError::ListLayers)?;
    info!("map server publishes {} layers", layers.len());
    output::write_report(writer, &layers)
}
