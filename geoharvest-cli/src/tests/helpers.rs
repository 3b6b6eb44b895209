//! Test helpers for temporary artefact directories and canned responses.

use camino::{Utf8Path, Utf8PathBuf};
use geoharvest_core::FeatureCollection;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

pub(super) fn workspace() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(path, contents).expect("write test file");
}

pub(super) fn read_collection(path: &Utf8Path) -> FeatureCollection {
    let text = fs::read_to_string(path).expect("read artefact");
    FeatureCollection::from_geojson_str(&text).expect("artefact is GeoJSON")
}

pub(super) fn stdout_json(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("stdout should be JSON")
}

/// Marker feed with one station in Vilnius, one in Klaipėda and one without
/// a `StationId`.
pub(super) fn marker_feed() -> Value {
    json!({"stations": {
        "1": {"StationId": 1, "Lat": 54.7, "Lon": 25.3, "Status": 1,
              "status_name": "Available", "status_timestamp": "2024-01-01T00:00:00Z"},
        "2": {"StationId": 2, "Lat": 55.7, "Lon": 21.1, "Status": 2,
              "status_name": "Occupied", "status_timestamp": null},
        "3": {"Lat": 54.69, "Lon": 25.28, "Status": 1,
              "status_name": "Available", "status_timestamp": null}
    }})
}

pub(super) fn geocoder_match(lat: &str, lon: &str, display_name: &str) -> Value {
    json!([{"lat": lat, "lon": lon, "display_name": display_name}])
}
