//! Keyed marker sets.
//!
//! The feed returns `{"stations": {"<key>": {..}, ..}}`. Every station must
//! carry the fields in [`REQUIRED_STATION_FIELDS`]; `Lon` and `Lat` become
//! the point and the rest are copied into the properties. Some backends
//! serialise an empty or list-shaped set as an array, which is accepted too.

use geo::Coord;
use geoharvest_core::{Feature, NormalizationError, SourceKind};
use serde_json::Value;

use super::{Normalized, numeric_coordinate, required, scalar_properties};

/// Fields every station record must carry, coordinates first.
pub const REQUIRED_STATION_FIELDS: [&str; 6] = [
    "Lon",
    "Lat",
    "StationId",
    "Status",
    "status_name",
    "status_timestamp",
];

/// Station fields copied into the feature properties.
const PROPERTY_FIELDS: [&str; 4] = ["StationId", "Status", "status_name", "status_timestamp"];

pub(super) fn normalize(raw: &Value) -> Normalized {
    match raw.get("stations") {
        Some(Value::Object(stations)) => stations
            .iter()
            .map(|(key, station)| station_to_feature(&format!("stations[{key}]"), station))
            .collect(),
        Some(Value::Array(stations)) => stations
            .iter()
            .enumerate()
            .map(|(index, station)| station_to_feature(&format!("stations[{index}]"), station))
            .collect(),
        _ => Normalized::unusable(NormalizationError::UnexpectedShape {
            kind: SourceKind::MarkerFeed,
            expected: "an object with a `stations` map",
        }),
    }
}

fn station_to_feature(record: &str, station: &Value) -> Result<Feature, NormalizationError> {
    let Some(fields) = station.as_object() else {
        return Err(NormalizationError::UnexpectedShape {
            kind: SourceKind::MarkerFeed,
            expected: "station records to be objects",
        });
    };
    for field in REQUIRED_STATION_FIELDS {
        required(record, fields, field)?;
    }
    let longitude = numeric_coordinate(record, "Lon", required(record, fields, "Lon")?)?;
    let latitude = numeric_coordinate(record, "Lat", required(record, fields, "Lat")?)?;
    let properties = scalar_properties(
        record,
        fields
            .iter()
            .filter(|(key, _)| PROPERTY_FIELDS.contains(&key.as_str())),
    )?;
    Feature::geographic(
        record,
        Coord {
            x: longitude,
            y: latitude,
        },
        properties,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoharvest_core::PropertyValue;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn station() -> Value {
        json!({
            "StationId": 1,
            "Lat": 54.7,
            "Lon": 25.3,
            "Status": 1,
            "status_name": "Available",
            "status_timestamp": "2024-01-01T00:00:00Z"
        })
    }

    #[rstest]
    fn station_becomes_point_with_four_properties(mut station: Value) {
        station["Address"] = json!("Ozo g. 25");
        let normalized = normalize(&json!({"stations": {"1": station}}));

        assert!(normalized.rejected.is_empty());
        let feature = normalized.features.first().expect("one feature");
        assert_eq!(feature.location(), Coord { x: 25.3, y: 54.7 });
        let keys: Vec<_> = feature.properties().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["StationId", "Status", "status_name", "status_timestamp"]
        );
        assert_eq!(
            feature.property("status_name"),
            Some(&PropertyValue::from("Available"))
        );
    }

    #[rstest]
    #[case("StationId")]
    #[case("Lon")]
    #[case("status_timestamp")]
    fn station_missing_a_field_is_dropped(station: Value, #[case] field: &str) {
        let mut broken = station.clone();
        broken
            .as_object_mut()
            .expect("object")
            .remove(field);
        let raw = json!({"stations": {"1": station, "2": broken, "3": {
            "StationId": 3, "Lat": 54.8, "Lon": 25.1, "Status": 2,
            "status_name": "Occupied", "status_timestamp": null
        }}});

        let normalized = normalize(&raw);

        assert_eq!(normalized.features.len(), 2);
        assert_eq!(
            normalized.rejected,
            vec![NormalizationError::MissingField {
                record: "stations[2]".to_owned(),
                field: field.to_owned()
            }]
        );
    }

    #[rstest]
    fn null_values_are_kept_but_not_as_coordinates(station: Value) {
        let mut no_timestamp = station.clone();
        no_timestamp["status_timestamp"] = Value::Null;
        let mut null_lat = station;
        null_lat["Lat"] = Value::Null;

        let normalized = normalize(&json!({"stations": {"a": no_timestamp, "b": null_lat}}));

        assert_eq!(normalized.features.len(), 1);
        assert_eq!(
            normalized.features[0].property("status_timestamp"),
            Some(&PropertyValue::Null)
        );
        assert!(matches!(
            normalized.rejected.as_slice(),
            [NormalizationError::InvalidCoordinate { .. }]
        ));
    }

    #[rstest]
    fn string_coordinates_are_not_coerced(mut station: Value) {
        station["Lon"] = json!("25.3");
        let normalized = normalize(&json!({"stations": {"1": station}}));
        assert!(normalized.is_unusable());
    }

    #[rstest]
    fn keyed_order_is_preserved(station: Value) {
        let mut second = station.clone();
        second["StationId"] = json!(2);
        let raw = json!({"stations": {"z": station, "a": second}});
        let ids: Vec<_> = normalize(&raw)
            .features
            .iter()
            .filter_map(|feature| feature.property("StationId").and_then(PropertyValue::as_f64))
            .collect();
        assert_eq!(ids, vec![1.0, 2.0]);
    }

    #[rstest]
    fn array_shaped_sets_are_accepted(station: Value) {
        let normalized = normalize(&json!({"stations": [station]}));
        assert_eq!(normalized.features.len(), 1);
        assert!(normalize(&json!({"stations": []})).features.is_empty());
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({"stations": "none"}))]
    #[case(json!([1, 2]))]
    fn missing_station_set_is_an_unexpected_shape(#[case] raw: Value) {
        assert!(matches!(
            normalize(&raw).rejected.as_slice(),
            [NormalizationError::UnexpectedShape {
                kind: SourceKind::MarkerFeed,
                ..
            }]
        ));
    }
}
