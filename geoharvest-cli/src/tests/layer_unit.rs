//! Unit tests covering map-server layer queries and the layer catalogue.

use super::helpers::{read_collection, stdout_json, workspace};
use super::*;
use crate::layer::{LayerArgs, LayerConfig, config_from_layers_for_test, execute_layer};
use crate::layers::execute_layers;
use geoharvest_core::{ConfigurationError, Crs};
use geoharvest_data::test_support::StubTransport;
use geoharvest_data::{MapServerConfig, ResponseFormat};
use rstest::rstest;
use serde_json::json;

fn layer_args(layer_id: u32) -> LayerArgs {
    LayerArgs {
        layer_id: Some(layer_id),
        ..LayerArgs::default()
    }
}

#[rstest]
fn layer_id_is_required() {
    let err = LayerConfig::try_from(LayerArgs::default()).expect_err("missing layer id");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_LAYER_ID);
            assert_eq!(env, ENV_LAYER_ID);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn layer_config_applies_query_defaults() {
    let config = LayerConfig::try_from(layer_args(3)).expect("config");
    assert_eq!(config.query.layer_id(), 3);
    assert_eq!(config.query.predicate(), "1=1");
    assert_eq!(config.query.out_fields(), "*");
    assert!(config.query.return_geometry());
    assert_eq!(config.query.out_sr(), Crs::LKS94);
    assert_eq!(config.output, Utf8PathBuf::from("layer_3_data.geojson"));
    assert_eq!(config.map_server.response_format, ResponseFormat::EsriJson);
    assert_eq!(config.pipeline.bbox, None);
}

#[rstest]
fn layer_flags_shape_the_query() {
    let args = LayerArgs {
        r#where: Some("STATUS = 1".to_owned()),
        out_fields: Some("OBJECTID,NAME".to_owned()),
        out_sr: Some(4326),
        no_geometry: true,
        geojson: true,
        ..layer_args(7)
    };
    let config = LayerConfig::try_from(args).expect("config");
    assert_eq!(config.query.predicate(), "STATUS = 1");
    assert_eq!(config.query.out_fields(), "OBJECTID,NAME");
    assert_eq!(config.query.out_sr(), Crs::Wgs84);
    assert!(!config.query.return_geometry());
    assert_eq!(config.map_server.response_format, ResponseFormat::GeoJson);
}

#[rstest]
fn blank_predicate_is_rejected() {
    let args = LayerArgs {
        r#where: Some("  ".to_owned()),
        ..layer_args(1)
    };
    let err = LayerConfig::try_from(args).expect_err("blank predicate");
    assert!(matches!(
        err,
        CliError::InvalidConfiguration(ConfigurationError::EmptyPredicate)
    ));
}

#[rstest]
fn layer_query_keeps_projected_coordinates() {
    let (_tmp, root) = workspace();
    let output = root.join("layer_1_data.geojson");
    let args = LayerArgs {
        output: Some(output.clone()),
        map_server_url: Some("http://maps.test/arcgis/rest/services/Grid/MapServer".to_owned()),
        ..layer_args(1)
    };
    let config = LayerConfig::try_from(args).expect("config");

    let transport = StubTransport::new();
    transport.push_json(&json!({
        "spatialReference": {"wkid": 3346},
        "features": [
            {"attributes": {"OBJECTID": 1, "NAME": "TP-1"},
             "geometry": {"x": 582_000.5, "y": 6_061_000.25}},
            {"attributes": {"OBJECTID": 2, "NAME": "TP-2"}}
        ]
    }));
    let mut stdout = Vec::new();
    execute_layer(&config, &transport, &mut stdout).expect("run succeeds");

    let features = read_collection(&output);
    assert_eq!(features.len(), 1);
    let feature = features.iter().next().expect("one feature");
    assert_eq!(feature.longitude(), 582_000.5);
    assert_eq!(feature.latitude(), 6_061_000.25);

    let report = stdout_json(&stdout);
    assert_eq!(report["summary"]["skipped_records"], json!(1));

    let requests = transport.requests();
    assert_eq!(requests[0].param("outSR"), Some("3346"));
    assert_eq!(requests[0].param("where"), Some("1=1"));
    assert!(requests[0].url().ends_with("/MapServer/1/query"));
}

#[rstest]
fn service_error_envelope_is_reported_not_fatal() {
    let (_tmp, root) = workspace();
    let output = root.join("layer_9_data.geojson");
    let args = LayerArgs {
        output: Some(output.clone()),
        ..layer_args(9)
    };
    let config = LayerConfig::try_from(args).expect("config");

    let transport = StubTransport::new();
    transport.push_json(&json!({"error": {"code": 400, "message": "Invalid query"}}));
    let mut stdout = Vec::new();
    execute_layer(&config, &transport, &mut stdout).expect("per-item failures are not fatal");

    assert!(read_collection(&output).is_empty());
    let report = stdout_json(&stdout);
    assert_eq!(report["summary"]["failed"], json!(1));
    let reason = report["summary"]["failures"][0]["reason"]
        .as_str()
        .expect("reason text");
    assert!(reason.contains("Invalid query"), "unexpected reason {reason}");
}

#[rstest]
fn layers_prints_the_catalogue() {
    let transport = StubTransport::new();
    transport.push_json(&json!({"layers": [
        {"id": 0, "name": "Charging stations", "type": "Feature Layer", "geometryType": "esriGeometryPoint"},
        {"id": 1, "name": "Substations", "type": "Feature Layer", "geometryType": "esriGeometryPoint"}
    ]}));
    let mut stdout = Vec::new();
    execute_layers(MapServerConfig::default(), &transport, &mut stdout).expect("catalogue");

    let catalogue = stdout_json(&stdout);
    assert_eq!(catalogue[1]["name"], json!("Substations"));
    assert_eq!(catalogue[0]["geometryType"], json!("esriGeometryPoint"));
}

#[rstest]
fn layers_surfaces_fetch_failures() {
    let transport = StubTransport::new();
    transport.push_response(503, "maintenance");
    let mut stdout = Vec::new();
    let err = execute_layers(MapServerConfig::default(), &transport, &mut stdout)
        .expect_err("catalogue fetch fails");
    assert!(matches!(err, CliError::ListLayers(_)));
    assert!(stdout.is_empty());
}

#[rstest]
fn merge_layers_accepts_layer_id_from_file() {
    use ortho_config::MergeComposer;

    let mut composer = MergeComposer::new();
    composer.push_file(json!({ "layer_id": 4, "where": "TYPE = 'AC'" }), None);
    composer.push_cli(json!({ "out_sr": 4326 }));

    let config = config_from_layers_for_test(composer.layers()).expect("merged config");
    assert_eq!(config.query.layer_id(), 4);
    assert_eq!(config.query.predicate(), "TYPE = 'AC'");
    assert_eq!(config.query.out_sr(), Crs::Wgs84);
}
