//! Markers command implementation for the geoharvest CLI.

use std::cell::RefCell;
use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use geoharvest_core::{
    BoundingBox, FetchResult, RawResponse, SourceClient, SourceKind, SourceQuery,
};
use geoharvest_data::{
    HttpTransport, MarkerFeedClient, MarkerFeedConfig, Pipeline, PipelineConfig, Transport,
};
use log::warn;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::{self, RunReport};
use crate::{
    ARG_BBOX, ARG_FEED_URL, ARG_ID_NO_FILTER, ARG_NO_FILTER, ARG_OUTPUT, ARG_RAW_OUTPUT, CliError,
    parse_bbox,
};

/// Artefact written when `--output` is not given and filtering is on.
pub(crate) const DEFAULT_MARKERS_OUTPUT: &str = "ev_markers_filtered.geojson";
/// Artefact written when `--output` is not given and `--no-filter` is set.
pub(crate) const DEFAULT_UNFILTERED_MARKERS_OUTPUT: &str = "ev_markers.geojson";

/// CLI arguments for the `markers` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "markers",
    long_about = "Download the EV charger marker feed, convert every usable \
                 station into a point feature and keep those inside the \
                 bounding box (the Vilnius area unless --bbox is given).",
    about = "Download the EV charger marker feed"
)]
#[ortho_config(prefix = "GEOHARVEST")]
pub(crate) struct MarkersArgs {
    /// GeoJSON artefact to write.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Also save the decoded feed response here.
    #[arg(long = ARG_RAW_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) raw_output: Option<Utf8PathBuf>,
    /// Keep only stations inside `minLat,maxLat,minLon,maxLon`.
    #[arg(long = ARG_BBOX, value_name = "bounds", conflicts_with = ARG_ID_NO_FILTER)]
    #[serde(default)]
    pub(crate) bbox: Option<String>,
    /// Emit every usable station without spatial filtering.
    #[arg(long = ARG_NO_FILTER)]
    #[serde(default)]
    pub(crate) no_filter: bool,
    /// Marker feed endpoint.
    #[arg(long = ARG_FEED_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) feed_url: Option<String>,
}

impl MarkersArgs {
    pub(crate) fn into_config(self) -> Result<MarkersConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        MarkersConfig::try_from(merged)
    }
}

/// Resolved `markers` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MarkersConfig {
    /// Output artefact path.
    pub(crate) output: Utf8PathBuf,
    /// Raw capture path.
    pub(crate) raw_output: Option<Utf8PathBuf>,
    /// Filtering settings.
    pub(crate) pipeline: PipelineConfig,
    /// Feed endpoint settings.
    pub(crate) feed: MarkerFeedConfig,
}

impl TryFrom<MarkersArgs> for MarkersConfig {
    type Error = CliError;

    fn try_from(args: MarkersArgs) -> Result<Self, Self::Error> {
        let bbox = if args.no_filter {
            None
        } else {
            Some(parse_bbox(args.bbox.as_deref())?.unwrap_or(BoundingBox::VILNIUS))
        };
        let default_output = if bbox.is_some() {
            DEFAULT_MARKERS_OUTPUT
        } else {
            DEFAULT_UNFILTERED_MARKERS_OUTPUT
        };
        Ok(Self {
            output: args
                .output
                .unwrap_or_else(|| Utf8PathBuf::from(default_output)),
            raw_output: args.raw_output,
            pipeline: PipelineConfig::default().with_bbox(bbox),
            feed: args
                .feed_url
                .map_or_else(MarkerFeedConfig::default, MarkerFeedConfig::new),
        })
    }
}

/// Pass-through client that keeps the last successful raw response.
struct CapturingClient<S> {
    inner: S,
    captured: RefCell<Option<RawResponse>>,
}

impl<S: SourceClient> CapturingClient<S> {
    const fn new(inner: S) -> Self {
        Self {
            inner,
            captured: RefCell::new(None),
        }
    }

    fn into_captured(self) -> Option<RawResponse> {
        self.captured.into_inner()
    }
}

impl<S: SourceClient> SourceClient for CapturingClient<S> {
    fn kind(&self) -> SourceKind {
        self.inner.kind()
    }

    fn rate_limited(&self) -> bool {
        self.inner.rate_limited()
    }

    fn fetch(&self, query: &SourceQuery) -> FetchResult {
        let raw = self.inner.fetch(query)?;
        self.captured.replace(Some(raw.clone()));
        Ok(raw)
    }
}

pub(super) fn run_markers(args: MarkersArgs) -> Result<(), CliError> {
    let transport = HttpTransport::new()?;
    let mut stdout = std::io::stdout().lock();
    run_markers_with(args, &transport, &mut stdout)
}

pub(super) fn run_markers_with(
    args: MarkersArgs,
    transport: &dyn Transport,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_markers(&config, transport, writer)
}

pub(super) fn execute_markers(
    config: &MarkersConfig,
    transport: &dyn Transport,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let client = CapturingClient::new(MarkerFeedClient::new(transport, config.feed.clone())?);
    let outcome = Pipeline::new(config.pipeline).run_single(&client, SourceQuery::Feed)?;

    let raw_output = match (&config.raw_output, client.into_captured()) {
        (Some(path), Some(raw)) => {
            output::write_raw(path, &raw)?;
            Some(path.as_path())
        }
        (Some(path), None) => {
            warn!("feed fetch failed; no raw response written to {path}");
            None
        }
        (None, _) => None,
    };

    output::write_collection(&config.output, &outcome.features)?;
    output::write_report(
        writer,
        &RunReport {
            output: &config.output,
            raw_output,
            summary: &outcome.summary,
        },
    )
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<MarkersConfig, CliError> {
    let merged = MarkersArgs::merge_from_layers(layers).map_err(CliError::from)?;
    MarkersConfig::try_from(merged)
}
