//! Unit tests covering geocode configuration and execution.

use super::helpers::{geocoder_match, read_collection, stdout_json, workspace, write_utf8};
use super::*;
use crate::geocode::{
    DEFAULT_GEOCODE_OUTPUT, GeocodeArgs, GeocodeConfig, config_from_layers_for_test,
    execute_geocode,
};
use geoharvest_core::{ConfigurationError, PropertyValue};
use geoharvest_data::DEFAULT_MIN_INTERVAL;
use geoharvest_data::test_support::StubTransport;
use rstest::rstest;
use serde_json::json;
use std::time::Duration;

fn args_for(addresses: &[&str]) -> GeocodeArgs {
    GeocodeArgs {
        addresses: addresses.iter().map(|address| (*address).to_owned()).collect(),
        ..GeocodeArgs::default()
    }
}

#[rstest]
fn geocode_config_applies_defaults() {
    let config = GeocodeConfig::try_from(args_for(&["Ozo g. 25, Vilnius"])).expect("config");
    assert_eq!(config.output, Utf8PathBuf::from(DEFAULT_GEOCODE_OUTPUT));
    assert_eq!(config.pipeline.min_interval, DEFAULT_MIN_INTERVAL);
    assert_eq!(config.pipeline.bbox, None);
    assert_eq!(config.geocoder.country_codes.as_deref(), Some("lt"));
}

#[rstest]
fn empty_country_codes_lift_the_filter() {
    let args = GeocodeArgs {
        country_codes: Some(String::new()),
        ..args_for(&["Ozo g. 25, Vilnius"])
    };
    let config = GeocodeConfig::try_from(args).expect("config");
    assert_eq!(config.geocoder.country_codes, None);
}

#[rstest]
fn zero_interval_disables_pacing() {
    let args = GeocodeArgs {
        min_interval_ms: Some(0),
        ..args_for(&["Ozo g. 25, Vilnius"])
    };
    let config = GeocodeConfig::try_from(args).expect("config");
    assert_eq!(config.pipeline.min_interval, Duration::ZERO);
}

#[rstest]
fn inverted_bbox_is_a_configuration_error() {
    let args = GeocodeArgs {
        bbox: Some("55.0,54.0,24.0,25.0".to_owned()),
        ..args_for(&["Ozo g. 25, Vilnius"])
    };
    let err = GeocodeConfig::try_from(args).expect_err("inverted bbox");
    match err {
        CliError::InvalidConfiguration(ConfigurationError::InvertedBounds { axis, .. }) => {
            assert_eq!(axis, "latitude");
        }
        other => panic!("expected InvalidConfiguration, found {other:?}"),
    }
}

#[rstest]
fn addresses_file_is_appended_after_positional_addresses() {
    let (_tmp, root) = workspace();
    let file = root.join("addresses.txt");
    write_utf8(
        &file,
        "# Vilnius charging sites\nVydūno g. 2, Vilnius\n\n  Žalgirio g. 92, Vilnius  \n".as_bytes(),
    );
    let args = GeocodeArgs {
        addresses_file: Some(file),
        ..args_for(&["Ozo g. 25, Vilnius"])
    };

    let config = GeocodeConfig::try_from(args).expect("config");
    let addresses = config.load_addresses().expect("addresses");
    assert_eq!(
        addresses,
        vec![
            "Ozo g. 25, Vilnius",
            "Vydūno g. 2, Vilnius",
            "Žalgirio g. 92, Vilnius"
        ]
    );
}

#[rstest]
fn no_addresses_is_an_error() {
    let config = GeocodeConfig::try_from(GeocodeArgs::default()).expect("config");
    let err = config.load_addresses().expect_err("nothing to geocode");
    assert!(matches!(err, CliError::MissingAddresses));
}

#[rstest]
fn unreadable_addresses_file_is_reported() {
    let (_tmp, root) = workspace();
    let args = GeocodeArgs {
        addresses_file: Some(root.join("absent.txt")),
        ..GeocodeArgs::default()
    };
    let config = GeocodeConfig::try_from(args).expect("config");
    let err = config.load_addresses().expect_err("missing file");
    assert!(matches!(err, CliError::ReadAddresses { .. }));
}

#[rstest]
fn geocode_writes_matches_and_reports_misses() {
    let (_tmp, root) = workspace();
    let output = root.join("out/addresses.geojson");
    let args = GeocodeArgs {
        output: Some(output.clone()),
        min_interval_ms: Some(0),
        ..args_for(&["Gedimino pr. 9, Vilnius", "Nowhere g. 1, Vilnius"])
    };
    let config = GeocodeConfig::try_from(args).expect("config");

    let transport = StubTransport::new();
    transport.push_json(&geocoder_match(
        "54.687",
        "25.279",
        "Gedimino prospektas 9, Vilnius",
    ));
    transport.push_json(&json!([]));

    let mut stdout = Vec::new();
    execute_geocode(&config, &transport, &mut stdout).expect("run succeeds");

    let features = read_collection(&output);
    let feature = features.iter().next().expect("one feature");
    assert_eq!(features.len(), 1);
    assert_eq!(feature.longitude(), 25.279);
    assert_eq!(feature.latitude(), 54.687);
    assert_eq!(
        feature.property("address"),
        Some(&PropertyValue::from("Gedimino pr. 9, Vilnius"))
    );

    let report = stdout_json(&stdout);
    assert_eq!(report["output"], json!(output.as_str()));
    assert_eq!(report["summary"]["attempted"], json!(2));
    assert_eq!(report["summary"]["succeeded"], json!(1));
    assert_eq!(report["summary"]["failed"], json!(1));
    assert_eq!(
        report["summary"]["failures"][0]["item"],
        json!("Nowhere g. 1, Vilnius")
    );

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].param("q"), Some("Gedimino pr. 9, Vilnius"));
    assert_eq!(requests[0].param("countrycodes"), Some("lt"));
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "min_interval_ms": "soon" }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "geocoder_url": "http://from-file/search",
            "country_codes": "lv",
            "min_interval_ms": 2000,
        }),
        None,
    );
    composer.push_environment(json!({
        "country_codes": "lt,lv",
    }));
    composer.push_cli(json!({
        "addresses": ["Ozo g. 25, Vilnius"],
        "min_interval_ms": 500,
    }));

    let config = config_from_layers_for_test(composer.layers()).expect("merged config");
    assert_eq!(config.geocoder.base_url, "http://from-file/search");
    assert_eq!(config.geocoder.country_codes.as_deref(), Some("lt,lv"));
    assert_eq!(config.pipeline.min_interval, Duration::from_millis(500));
    assert_eq!(config.addresses, vec!["Ozo g. 25, Vilnius"]);
}

#[rstest]
fn bundled_vilnius_address_list_loads() {
    let path = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../demos/vilnius_addresses.txt");
    let args = GeocodeArgs {
        addresses_file: Some(path),
        ..GeocodeArgs::default()
    };
    let config = GeocodeConfig::try_from(args).expect("config");
    let addresses = config.load_addresses().expect("addresses");
    assert_eq!(addresses.len(), 32);
    assert_eq!(addresses.first().map(String::as_str), Some("Vydūno g. 2, Vilnius"));
}
