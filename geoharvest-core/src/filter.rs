//! Bounding-box containment filter.

use crate::{BoundingBox, FeatureCollection};

/// Return the features of `features` that lie inside `bbox`.
///
/// A feature is kept iff `min_lat <= lat <= max_lat` and
/// `min_lon <= lon <= max_lon`. Relative order is preserved and the input is
/// left untouched. An empty result is not an error.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use geoharvest_core::{filter_by_bbox, BoundingBox, Feature, FeatureCollection, Properties};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let inside = Feature::geographic("a", Coord { x: 25.3, y: 54.7 }, Properties::new())?;
/// let outside = Feature::geographic("b", Coord { x: 21.1, y: 55.7 }, Properties::new())?;
/// let features: FeatureCollection = [inside.clone(), outside].into_iter().collect();
///
/// let kept = filter_by_bbox(&features, &BoundingBox::VILNIUS);
/// assert_eq!(kept.as_slice(), &[inside]);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn filter_by_bbox(features: &FeatureCollection, bbox: &BoundingBox) -> FeatureCollection {
    features
        .iter()
        .filter(|feature| bbox.contains(feature.location()))
        .cloned()
        .collect()
}

impl FeatureCollection {
    /// In-place variant of [`filter_by_bbox`], returning how many were removed.
    pub fn retain_within(&mut self, bbox: &BoundingBox) -> usize {
        self.retain(|feature| bbox.contains(feature.location()))
    }
}
