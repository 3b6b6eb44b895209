//! Map-server feature arrays.
//!
//! Esri JSON elements look like
//! `{"attributes": {..}, "geometry": {"x": .., "y": ..}}`; GeoJSON elements
//! look like `{"type": "Feature", "properties": {..}, "geometry":
//! {"type": "Point", "coordinates": [x, y]}}`. Both are accepted in the same
//! response. Coordinates stay in the reference system the server reports,
//! falling back to the one the query requested.

use geo::Coord;
use geoharvest_core::{Crs, Feature, NormalizationError, Properties, SourceKind};
use serde_json::{Map, Value};

use super::{Normalized, build_feature, numeric_coordinate, required, scalar_properties};

const NON_POINT_GEOMETRY_KEYS: [&str; 3] = ["paths", "rings", "points"];

pub(super) fn normalize(out_sr: Crs, raw: &Value) -> Normalized {
    let Some(elements) = raw.get("features").and_then(Value::as_array) else {
        return Normalized::unusable(NormalizationError::UnexpectedShape {
            kind: SourceKind::MapServer,
            expected: "an object with a `features` array",
        });
    };
    let crs = reported_crs(raw).unwrap_or(out_sr);
    elements
        .iter()
        .enumerate()
        .map(|(index, element)| element_to_feature(&format!("features[{index}]"), crs, element))
        .collect()
}

/// Reference system declared by the response itself, if any.
fn reported_crs(raw: &Value) -> Option<Crs> {
    if let Some(reference) = raw.get("spatialReference") {
        let wkid = reference
            .get("latestWkid")
            .or_else(|| reference.get("wkid"))
            .and_then(Value::as_u64)?;
        return u32::try_from(wkid).ok().map(Crs::from_wkid);
    }
    let name = raw.pointer("/crs/properties/name")?.as_str()?;
    let (_, code) = name.rsplit_once(':')?;
    code.parse().ok().map(Crs::from_wkid)
}

fn element_to_feature(record: &str, crs: Crs, element: &Value) -> Result<Feature, NormalizationError> {
    let Some(fields) = element.as_object() else {
        return Err(NormalizationError::UnexpectedShape {
            kind: SourceKind::MapServer,
            expected: "feature elements to be objects",
        });
    };
    let (location, properties) = if fields.contains_key("attributes") {
        esri_element(record, fields)?
    } else {
        geojson_element(record, fields)?
    };
    build_feature(record, crs, location, properties)
}

fn attribute_map(
    record: &str,
    fields: &Map<String, Value>,
    key: &str,
) -> Result<Properties, NormalizationError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(Properties::new()),
        Some(Value::Object(attributes)) => scalar_properties(record, attributes),
        Some(_) => Err(NormalizationError::NonScalarProperty {
            record: record.to_owned(),
            key: key.to_owned(),
        }),
    }
}

fn geometry<'v>(
    record: &str,
    fields: &'v Map<String, Value>,
) -> Result<&'v Map<String, Value>, NormalizationError> {
    match required(record, fields, "geometry")? {
        Value::Object(geometry) => Ok(geometry),
        Value::Null => Err(NormalizationError::MissingField {
            record: record.to_owned(),
            field: "geometry".to_owned(),
        }),
        other => Err(NormalizationError::InvalidCoordinate {
            record: record.to_owned(),
            reason: format!("geometry {other} is not an object"),
        }),
    }
}

fn esri_element(
    record: &str,
    fields: &Map<String, Value>,
) -> Result<(Coord<f64>, Properties), NormalizationError> {
    let properties = attribute_map(record, fields, "attributes")?;
    let geometry = geometry(record, fields)?;
    if !geometry.contains_key("x")
        && NON_POINT_GEOMETRY_KEYS
            .iter()
            .any(|key| geometry.contains_key(*key))
    {
        return Err(NormalizationError::InvalidCoordinate {
            record: record.to_owned(),
            reason: "geometry is not a point".to_owned(),
        });
    }
    let x = numeric_coordinate(record, "geometry.x", required(record, geometry, "x")?)?;
    let y = numeric_coordinate(record, "geometry.y", required(record, geometry, "y")?)?;
    Ok((Coord { x, y }, properties))
}

fn geojson_element(
    record: &str,
    fields: &Map<String, Value>,
) -> Result<(Coord<f64>, Properties), NormalizationError> {
    let properties = attribute_map(record, fields, "properties")?;
    let geometry = geometry(record, fields)?;
    let geometry_type = geometry.get("type").and_then(Value::as_str);
    if geometry_type != Some("Point") {
        return Err(NormalizationError::InvalidCoordinate {
            record: record.to_owned(),
            reason: format!(
                "geometry type {} is not Point",
                geometry_type.unwrap_or("(missing)")
            ),
        });
    }
    let position = required(record, geometry, "coordinates")?;
    match position.as_array().map(Vec::as_slice) {
        Some([x, y, ..]) => Ok((
            Coord {
                x: numeric_coordinate(record, "coordinates[0]", x)?,
                y: numeric_coordinate(record, "coordinates[1]", y)?,
            },
            properties,
        )),
        _ => Err(NormalizationError::InvalidCoordinate {
            record: record.to_owned(),
            reason: format!("position {position} needs at least two members"),
        }),
    }
}
