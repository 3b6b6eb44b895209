//! Behavioural tests for complete pipeline runs over the real source clients.
//!
//! The clients talk to a [`StubTransport`], so the scenarios exercise request
//! building, decoding, normalization and filtering without a network.

use geoharvest_core::{BoundingBox, LayerQuery, PropertyValue, SourceQuery};
use geoharvest_data::pipeline::{Pipeline, PipelineConfig, RunOutcome};
use geoharvest_data::sources::{
    GeocoderClient, GeocoderConfig, MapServerClient, MapServerConfig, MarkerFeedClient,
    MarkerFeedConfig,
};
use geoharvest_data::test_support::{ManualClock, StubTransport};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;
use std::cell::RefCell;

#[derive(Default)]
struct RunWorld {
    transport: StubTransport,
    clock: ManualClock,
    outcome: RefCell<Option<RunOutcome>>,
}

impl RunWorld {
    fn record(&self, outcome: RunOutcome) {
        self.outcome.replace(Some(outcome));
    }

    fn with_outcome<R>(&self, check: impl FnOnce(&RunOutcome) -> R) -> R {
        let borrowed = self.outcome.borrow();
        check(borrowed.as_ref().expect("a run must have happened"))
    }
}

#[fixture]
fn world() -> RunWorld {
    RunWorld::default()
}

fn station(id: i64, lat: f64, lon: f64) -> serde_json::Value {
    json!({
        "StationId": id, "Lat": lat, "Lon": lon, "Status": 1,
        "status_name": "Available", "status_timestamp": "2024-01-01T00:00:00Z"
    })
}

// --- Given steps ---

#[given("a geocoder that finds {name} at latitude {lat} and longitude {lon}")]
fn geocoder_finds(world: &RunWorld, name: String, lat: f64, lon: f64) {
    world.transport.push_json(&json!([{
        "lat": lat.to_string(),
        "lon": lon.to_string(),
        "display_name": name.trim_matches('"'),
    }]));
}

#[given("a geocoder that finds nothing")]
fn geocoder_finds_nothing(world: &RunWorld) {
    world.transport.push_json(&json!([]));
}

#[given("a marker feed with one station at latitude {lat} and longitude {lon}")]
fn feed_with_station(world: &RunWorld, lat: f64, lon: f64) {
    world
        .transport
        .push_json(&json!({"stations": {"1": station(1, lat, lon)}}));
}

#[given("a marker feed with two stations where one lacks StationId")]
fn feed_with_broken_station(world: &RunWorld) {
    let mut broken = station(2, 54.75, 25.25);
    broken
        .as_object_mut()
        .expect("station is an object")
        .remove("StationId");
    world
        .transport
        .push_json(&json!({"stations": {"1": station(1, 54.7, 25.3), "2": broken}}));
}

#[given("a map server that answers with an error envelope")]
fn map_server_error(world: &RunWorld) {
    world
        .transport
        .push_json(&json!({"error": {"code": 400, "message": "Invalid query", "details": []}}));
}

// --- When steps ---

#[when("I geocode the address {address}")]
fn geocode(world: &RunWorld, address: String) {
    let client = GeocoderClient::new(&world.transport, GeocoderConfig::default())
        .expect("default geocoder configuration is valid");
    let outcome = Pipeline::with_clock(PipelineConfig::default(), &world.clock)
        .geocode_addresses(&client, &[address.trim_matches('"')])
        .expect("run should start");
    world.record(outcome);
}

#[when("I download the marker feed filtered to the Vilnius area")]
fn download_feed(world: &RunWorld) {
    let client = MarkerFeedClient::new(&world.transport, MarkerFeedConfig::default())
        .expect("default feed configuration is valid");
    let config = PipelineConfig::default().with_bbox(Some(BoundingBox::VILNIUS));
    let outcome = Pipeline::with_clock(config, &world.clock)
        .run_single(&client, SourceQuery::Feed)
        .expect("run should start");
    world.record(outcome);
}

#[when("I query layer {layer} of the map server")]
fn query_layer(world: &RunWorld, layer: u32) {
    let client = MapServerClient::new(&world.transport, MapServerConfig::default())
        .expect("default map-server configuration is valid");
    let query = LayerQuery::new(layer, "1=1").expect("valid layer query");
    let outcome = Pipeline::with_clock(PipelineConfig::default(), &world.clock)
        .run_single(&client, SourceQuery::from(query))
        .expect("run should start");
    world.record(outcome);
}

// --- Then steps ---

#[then("the run emits {count} features")]
fn emits(world: &RunWorld, count: usize) {
    world.with_outcome(|outcome| {
        assert_eq!(outcome.features.len(), count, "summary: {:?}", outcome.summary);
        assert_eq!(outcome.summary.emitted, count);
    });
}

#[then("the first feature is at longitude {lon} and latitude {lat}")]
fn first_location(world: &RunWorld, lon: f64, lat: f64) {
    world.with_outcome(|outcome| {
        let feature = outcome.features.iter().next().expect("a feature");
        assert_eq!(feature.longitude(), lon);
        assert_eq!(feature.latitude(), lat);
    });
}

#[then("the first feature has address {address}")]
fn first_address(world: &RunWorld, address: String) {
    world.with_outcome(|outcome| {
        let feature = outcome.features.iter().next().expect("a feature");
        assert_eq!(
            feature.property("address"),
            Some(&PropertyValue::from(address.trim_matches('"')))
        );
    });
}

#[then("{count} items failed with reason {reason}")]
fn failed_with(world: &RunWorld, count: usize, reason: String) {
    world.with_outcome(|outcome| {
        assert_eq!(outcome.summary.failed, count);
        assert_eq!(outcome.summary.attempted, count + outcome.summary.succeeded);
        let failure = outcome.summary.failures.first().expect("a failure");
        assert_eq!(failure.reason, reason.trim_matches('"'));
    });
}

#[then("{count} records were skipped")]
fn skipped(world: &RunWorld, count: usize) {
    world.with_outcome(|outcome| assert_eq!(outcome.summary.skipped_records, count));
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $index:literal) => {
        #[scenario(path = "tests/features/pipeline.feature", index = $index)]
        fn $fn_name(world: RunWorld) {
            let _ = world;
        }
    };
}

register_scenario!(geocoding_a_single_address, 0);
register_scenario!(address_without_matches, 1);
register_scenario!(station_inside_vilnius, 2);
register_scenario!(station_without_identifier, 3);
register_scenario!(map_server_error_envelope, 4);
