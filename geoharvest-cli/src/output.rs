//! Reading and writing artefacts and the stdout report.

use std::io::{BufReader, BufWriter, Write};

use camino::Utf8Path;
use geoharvest_core::FeatureCollection;
use geoharvest_data::RunSummary;
use log::info;
use serde::Serialize;

use crate::{CliError, fs};

/// Report printed on stdout after a fetch command.
#[derive(Debug, Serialize)]
pub(crate) struct RunReport<'a> {
    /// Where the GeoJSON artefact was written.
    pub(crate) output: &'a Utf8Path,
    /// Where the raw response was captured, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) raw_output: Option<&'a Utf8Path>,
    /// Counts and failure reasons.
    pub(crate) summary: &'a RunSummary,
}

/// Write `features` as GeoJSON to `path`.
pub(crate) fn write_collection(path: &Utf8Path, features: &FeatureCollection) -> Result<(), CliError> {
    let file = fs::create_file(path).map_err(|source| CliError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    features
        .write_geojson(&mut writer)
        .map_err(|source| CliError::EncodeOutput {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(|source| CliError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })?;
    info!("wrote {} features to {path}", features.len());
    Ok(())
}

/// Write an arbitrary JSON value (a raw capture) to `path`.
pub(crate) fn write_raw(path: &Utf8Path, value: &serde_json::Value) -> Result<(), CliError> {
    let file = fs::create_file(path).map_err(|source| CliError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| CliError::EncodeRaw {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|source| CliError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a GeoJSON point collection from `path`.
pub(crate) fn read_collection(path: &Utf8Path) -> Result<FeatureCollection, CliError> {
    let file = fs::open_file(path).map_err(|source| CliError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;
    FeatureCollection::read_geojson(BufReader::new(file)).map_err(|source| CliError::DecodeInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Print `report` as pretty JSON followed by a newline.
pub(crate) fn write_report<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    report: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(report).map_err(CliError::SerializeReport)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteReport)?;
    writer.write_all(b"\n").map_err(CliError::WriteReport)?;
    Ok(())
}
