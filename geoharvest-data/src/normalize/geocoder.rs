//! Geocoder match arrays.
//!
//! Nominatim answers with an array of matches whose `lat`/`lon` members are
//! decimal strings. Only the first (best) match is used. The feature carries
//! the address that was looked up and the service's canonical description.

use geo::Coord;
use geoharvest_core::{Feature, NormalizationError, Properties, PropertyValue, SourceKind};
use serde_json::Value;

use super::{Normalized, required};

pub(super) fn normalize(address: &str, raw: &Value) -> Normalized {
    let Some(matches) = raw.as_array() else {
        return Normalized::unusable(NormalizationError::UnexpectedShape {
            kind: SourceKind::Geocoder,
            expected: "an array of matches",
        });
    };
    matches
        .first()
        .map(|best| best_match(address, best))
        .into_iter()
        .collect()
}

fn best_match(address: &str, best: &Value) -> Result<Feature, NormalizationError> {
    let Some(fields) = best.as_object() else {
        return Err(NormalizationError::UnexpectedShape {
            kind: SourceKind::Geocoder,
            expected: "matches to be objects",
        });
    };
    let latitude = degrees(address, "lat", required(address, fields, "lat")?)?;
    let longitude = degrees(address, "lon", required(address, fields, "lon")?)?;
    let display_name = required(address, fields, "display_name")?
        .as_str()
        .ok_or_else(|| NormalizationError::MissingField {
            record: address.to_owned(),
            field: "display_name".to_owned(),
        })?;
    let properties = Properties::from([
        ("address".to_owned(), PropertyValue::from(address)),
        ("display_name".to_owned(), PropertyValue::from(display_name)),
    ]);
    Feature::geographic(
        address,
        Coord {
            x: longitude,
            y: latitude,
        },
        properties,
    )
}

/// Decimal degrees given either as a string or as a number.
fn degrees(record: &str, field: &str, value: &Value) -> Result<f64, NormalizationError> {
    let invalid = || NormalizationError::InvalidCoordinate {
        record: record.to_owned(),
        reason: format!("`{field}` is {value}, not a decimal degree value"),
    };
    match value {
        Value::String(text) => text.trim().parse().map_err(|_| invalid()),
        Value::Number(number) => number.as_f64().ok_or_else(invalid),
        Value::Null => Err(NormalizationError::MissingField {
            record: record.to_owned(),
            field: field.to_owned(),
        }),
        _ => Err(invalid()),
    }
}
