use std::collections::BTreeMap;
use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::NormalizationError;

/// Feature properties keyed by the source's own field names.
///
/// A sorted map keeps emitted artefacts stable between runs.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A scalar property value: text, number, boolean or null.
///
/// # Examples
/// ```
/// use geoharvest_core::PropertyValue;
///
/// let value = PropertyValue::from("Available");
/// assert_eq!(value.as_str(), Some("Available"));
/// assert_eq!(PropertyValue::from(7_i64).as_f64(), Some(7.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number, kept in its original integer or float form.
    Number(Number),
    /// JSON string.
    Text(String),
}

impl PropertyValue {
    /// Build a numeric value from a float, rejecting NaN and infinities.
    #[must_use]
    pub fn from_f64(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Self::Number)
    }

    /// Borrow the text content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric content as `f64`, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => number.as_f64(),
            _ => None,
        }
    }

    /// Whether this is JSON `null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Conversion from decoded JSON; arrays and objects are refused.
impl TryFrom<&Value> for PropertyValue {
    type Error = ();

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(flag) => Ok(Self::Bool(*flag)),
            Value::Number(number) => Ok(Self::Number(number.clone())),
            Value::String(text) => Ok(Self::Text(text.clone())),
            Value::Array(_) | Value::Object(_) => Err(()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Canonical point feature.
///
/// The location uses `x = longitude` (or easting) and `y = latitude` (or
/// northing), in whatever reference system the source returned. Construction
/// guarantees both components are finite; [`Feature::geographic`] additionally
/// enforces WGS-84 ranges.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use geoharvest_core::{Feature, Properties};
///
/// # fn main() -> Result<(), geoharvest_core::NormalizationError> {
/// let feature = Feature::geographic("station 1", Coord { x: 25.3, y: 54.7 }, Properties::new())?;
/// assert_eq!(feature.longitude(), 25.3);
/// assert_eq!(feature.latitude(), 54.7);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    location: Coord<f64>,
    properties: Properties,
}

impl Feature {
    /// Construct a feature whose coordinates only need to be finite.
    ///
    /// Used for projected reference systems where WGS-84 ranges do not apply.
    /// `record` labels the source record in any error.
    pub fn new(
        record: &str,
        location: Coord<f64>,
        properties: Properties,
    ) -> Result<Self, NormalizationError> {
        if !location.x.is_finite() || !location.y.is_finite() {
            return Err(NormalizationError::InvalidCoordinate {
                record: record.to_owned(),
                reason: format!("({}, {}) is not finite", location.x, location.y),
            });
        }
        Ok(Self {
            location,
            properties,
        })
    }

    /// Construct a feature with WGS-84 longitude/latitude coordinates.
    pub fn geographic(
        record: &str,
        location: Coord<f64>,
        properties: Properties,
    ) -> Result<Self, NormalizationError> {
        let feature = Self::new(record, location, properties)?;
        let in_range =
            (-180.0..=180.0).contains(&location.x) && (-90.0..=90.0).contains(&location.y);
        if in_range {
            Ok(feature)
        } else {
            Err(NormalizationError::OutOfRange {
                record: record.to_owned(),
                longitude: location.x,
                latitude: location.y,
            })
        }
    }

    /// Point location (`x` first, `y` second).
    #[must_use]
    pub const fn location(&self) -> Coord<f64> {
        self.location
    }

    /// Longitude, or easting for projected sources.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.location.x
    }

    /// Latitude, or northing for projected sources.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.location.y
    }

    /// Borrow the property map.
    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Look up a single property.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// Ordered sequence of features; order is fetch/normalise order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    /// Append a feature, keeping insertion order.
    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over the features in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    /// Borrow the features as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Feature] {
        &self.features
    }

    /// Keep only the features matching `predicate`, returning how many were removed.
    pub fn retain<F>(&mut self, predicate: F) -> usize
    where
        F: FnMut(&Feature) -> bool,
    {
        let before = self.features.len();
        self.features.retain(predicate);
        before.saturating_sub(self.features.len())
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl Extend<Feature> for FeatureCollection {
    fn extend<I: IntoIterator<Item = Feature>>(&mut self, iter: I) {
        self.features.extend(iter);
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
