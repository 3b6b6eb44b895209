//! Map image export (`GET {base}/export?f=image`).
//!
//! The extent is expressed in the service's projected coordinates, not in
//! degrees, so it has its own type instead of reusing
//! [`geoharvest_core::BoundingBox`].

use std::fmt;

use geoharvest_core::{ConfigurationError, Crs};

/// Projected map extent as `xmin,ymin,xmax,ymax`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapExtent {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

impl MapExtent {
    /// Validate and construct an extent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NonFiniteBound`] for NaN or infinite
    /// edges and [`ConfigurationError::InvertedBounds`] when a minimum exceeds
    /// its maximum.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Result<Self, ConfigurationError> {
        for (edge, value) in [("xmin", xmin), ("ymin", ymin), ("xmax", xmax), ("ymax", ymax)] {
            if !value.is_finite() {
                return Err(ConfigurationError::NonFiniteBound { edge });
            }
        }
        for (axis, min, max) in [("x", xmin, xmax), ("y", ymin, ymax)] {
            if min > max {
                return Err(ConfigurationError::InvertedBounds {
                    axis,
                    min: min.to_string(),
                    max: max.to_string(),
                });
            }
        }
        Ok(Self {
            xmin,
            ymin,
            xmax,
            ymax,
        })
    }
}

impl fmt::Display for MapExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.xmin, self.ymin, self.xmax, self.ymax)
    }
}

/// Raster encoding of an exported map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// `png`
    #[default]
    Png,
    /// `png32`
    Png32,
    /// `jpg`
    Jpg,
    /// `gif`
    Gif,
}

impl ImageFormat {
    /// Value of the `format` parameter.
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Png32 => "png32",
            Self::Jpg => "jpg",
            Self::Gif => "gif",
        }
    }
}

/// Output image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    width: u32,
    height: u32,
}

impl ImageSize {
    /// 800 by 600 pixels.
    pub const DEFAULT: Self = Self {
        width: 800,
        height: 600,
    };

    /// Validate and construct a size.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EmptyImageSize`] when either side is zero.
    pub const fn new(width: u32, height: u32) -> Result<Self, ConfigurationError> {
        if width == 0 || height == 0 {
            return Err(ConfigurationError::EmptyImageSize { width, height });
        }
        Ok(Self { width, height })
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.width, self.height)
    }
}

/// Parameters of one map export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapExport {
    /// Area to render.
    pub extent: MapExtent,
    /// Reference system of `extent` and of the rendered image.
    pub crs: Crs,
    /// Pixel dimensions.
    pub size: ImageSize,
    /// Raster encoding.
    pub format: ImageFormat,
    /// Whether the background is transparent.
    pub transparent: bool,
}

impl MapExport {
    /// Transparent 800x600 PNG of `extent` in LKS-94.
    #[must_use]
    pub fn new(extent: MapExtent) -> Self {
        Self {
            extent,
            crs: Crs::default(),
            size: ImageSize::default(),
            format: ImageFormat::default(),
            transparent: true,
        }
    }

    /// Set the pixel dimensions.
    #[must_use]
    pub const fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    /// Set the raster encoding.
    #[must_use]
    pub const fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the reference system used for both the extent and the image.
    #[must_use]
    pub const fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }

    /// Toggle background transparency.
    #[must_use]
    pub const fn with_transparency(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn extent_renders_as_comma_list() {
        let extent = MapExtent::new(570_000.0, 6_040_000.0, 590_000.5, 6_070_000.0)
            .expect("valid extent");
        assert_eq!(extent.to_string(), "570000,6040000,590000.5,6070000");
    }

    #[rstest]
    fn inverted_extent_is_rejected() {
        let err = MapExtent::new(10.0, 0.0, 5.0, 1.0).expect_err("x is inverted");
        assert!(matches!(
            err,
            ConfigurationError::InvertedBounds { axis: "x", .. }
        ));
    }

    #[rstest]
    fn non_finite_extent_is_rejected() {
        assert_eq!(
            MapExtent::new(0.0, f64::NAN, 1.0, 1.0),
            Err(ConfigurationError::NonFiniteBound { edge: "ymin" })
        );
    }

    #[rstest]
    #[case(0, 600)]
    #[case(800, 0)]
    fn zero_sized_images_are_rejected(#[case] width: u32, #[case] height: u32) {
        assert_eq!(
            ImageSize::new(width, height),
            Err(ConfigurationError::EmptyImageSize { width, height })
        );
    }
}
