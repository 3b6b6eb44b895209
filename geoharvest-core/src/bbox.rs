//! Geographic bounding boxes used by the spatial filter.

use std::fmt;
use std::str::FromStr;

use geo::{Coord, Intersects, Rect};
use serde::{Deserialize, Serialize};

use crate::ConfigurationError;

/// Latitude/longitude rectangle, inclusive on every edge.
///
/// Invariants: all edges are finite, `min_lat <= max_lat` and
/// `min_lon <= max_lon`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use geoharvest_core::BoundingBox;
///
/// # fn main() -> Result<(), geoharvest_core::ConfigurationError> {
/// let bbox: BoundingBox = "54.49,54.88,24.89,25.55".parse()?;
/// assert!(bbox.contains(Coord { x: 25.3, y: 54.7 }));
/// assert!(!bbox.contains(Coord { x: 21.1, y: 55.7 }));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundsRepr", into = "BoundsRepr")]
pub struct BoundingBox {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

#[derive(Serialize, Deserialize)]
struct BoundsRepr {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

impl BoundingBox {
    /// Approximate extent of the Vilnius metropolitan area.
    pub const VILNIUS: Self = Self {
        min_lat: 54.490_148,
        max_lat: 54.883_089,
        min_lon: 24.892_593,
        max_lon: 25.551_067,
    };

    /// Validate and construct a bounding box.
    pub fn new(
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    ) -> Result<Self, ConfigurationError> {
        for (edge, value) in [
            ("min_lat", min_lat),
            ("max_lat", max_lat),
            ("min_lon", min_lon),
            ("max_lon", max_lon),
        ] {
            if !value.is_finite() {
                return Err(ConfigurationError::NonFiniteBound { edge });
            }
        }
        if min_lat > max_lat {
            return Err(ConfigurationError::InvertedBounds {
                axis: "latitude",
                min: min_lat.to_string(),
                max: max_lat.to_string(),
            });
        }
        if min_lon > max_lon {
            return Err(ConfigurationError::InvertedBounds {
                axis: "longitude",
                min: min_lon.to_string(),
                max: max_lon.to_string(),
            });
        }
        Ok(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }

    /// Southern edge.
    #[must_use]
    pub const fn min_lat(&self) -> f64 {
        self.min_lat
    }

    /// Northern edge.
    #[must_use]
    pub const fn max_lat(&self) -> f64 {
        self.max_lat
    }

    /// Western edge.
    #[must_use]
    pub const fn min_lon(&self) -> f64 {
        self.min_lon
    }

    /// Eastern edge.
    #[must_use]
    pub const fn max_lon(&self) -> f64 {
        self.max_lon
    }

    /// The box as a `geo` rectangle with `x = longitude`, `y = latitude`.
    #[must_use]
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_lon,
                y: self.min_lat,
            },
            Coord {
                x: self.max_lon,
                y: self.max_lat,
            },
        )
    }

    /// Whether `location` lies inside the box or on its boundary.
    #[must_use]
    pub fn contains(&self, location: Coord<f64>) -> bool {
        // `Intersects` treats boundary points as inside the rectangle.
        self.to_rect().intersects(&location)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::VILNIUS
    }
}

impl TryFrom<BoundsRepr> for BoundingBox {
    type Error = ConfigurationError;

    fn try_from(repr: BoundsRepr) -> Result<Self, Self::Error> {
        Self::new(repr.min_lat, repr.max_lat, repr.min_lon, repr.max_lon)
    }
}

impl From<BoundingBox> for BoundsRepr {
    fn from(bbox: BoundingBox) -> Self {
        Self {
            min_lat: bbox.min_lat,
            max_lat: bbox.max_lat,
            min_lon: bbox.min_lon,
            max_lon: bbox.max_lon,
        }
    }
}

/// Parses `minLat,maxLat,minLon,maxLon`.
impl FromStr for BoundingBox {
    type Err = ConfigurationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let unparsable = || ConfigurationError::UnparsableBounds {
            input: input.to_owned(),
        };
        let values = input
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| unparsable())?;
        match values.as_slice() {
            [min_lat, max_lat, min_lon, max_lon] => {
                Self::new(*min_lat, *max_lat, *min_lon, *max_lon)
            }
            _ => Err(unparsable()),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lat, self.max_lat, self.min_lon, self.max_lon
        )
    }
}
