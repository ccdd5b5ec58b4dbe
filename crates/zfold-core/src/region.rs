use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, ZfoldError};
use crate::plane::StackDims;

/// A rectangle in image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The region covering the whole frame.
    pub fn full_frame(dims: &StackDims) -> Self {
        Self::new(0, 0, dims.size_x, dims.size_y)
    }

    /// Shape of a plane cropped to this region, as `(height, width)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Check that the region is non-empty and lies inside the frame.
    pub fn validated(&self, dims: &StackDims) -> Result<Region> {
        if self.width == 0 || self.height == 0 {
            return Err(ZfoldError::InvalidRegion(
                "Region width and height must be > 0".into(),
            ));
        }

        if self.x + self.width > dims.size_x || self.y + self.height > dims.size_y {
            return Err(ZfoldError::InvalidRegion(format!(
                "Region ({},{} {}x{}) exceeds frame dimensions ({}x{})",
                self.x, self.y, self.width, self.height, dims.size_x, dims.size_y
            )));
        }

        Ok(*self)
    }

    /// Intersect with the frame. `None` when nothing is left.
    pub fn clipped(&self, dims: &StackDims) -> Option<Region> {
        if self.x >= dims.size_x || self.y >= dims.size_y {
            return None;
        }
        let width = self.width.min(dims.size_x - self.x);
        let height = self.height.min(dims.size_y - self.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(Region::new(self.x, self.y, width, height))
    }
}

/// Candidate ROI shapes attached to an image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        #[serde(default)]
        z: usize,
        #[serde(default)]
        t: usize,
    },
    Point {
        x: f64,
        y: f64,
    },
    Polygon {
        points: Vec<[f64; 2]>,
    },
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rectangle { .. } => "rectangle",
            Self::Ellipse { .. } => "ellipse",
            Self::Point { .. } => "point",
            Self::Polygon { .. } => "polygon",
        }
    }

    /// Floor a rectangle's coordinates onto the pixel grid.
    ///
    /// Returns `None` for other kinds and for rectangles with negative or
    /// non-finite coordinates.
    pub fn to_region(&self) -> Option<Region> {
        match *self {
            Self::Rectangle {
                x,
                y,
                width,
                height,
            } => Some(Region::new(
                x.floor().to_usize()?,
                y.floor().to_usize()?,
                width.floor().to_usize()?,
                height.floor().to_usize()?,
            )),
            _ => None,
        }
    }
}

/// Derive the crop regions to project for one image.
///
/// Without `roi_only` the full frame is the only region. With it, every
/// rectangle becomes one region (clipped to the frame); other shape kinds are
/// ignored. Finding no usable rectangle is an error so the caller skips the
/// image instead of projecting the full frame.
pub fn select_regions(dims: &StackDims, roi_only: bool, shapes: &[Shape]) -> Result<Vec<Region>> {
    if !roi_only {
        return Ok(vec![Region::full_frame(dims)]);
    }

    let mut regions = Vec::new();
    for shape in shapes {
        let Some(region) = shape.to_region() else {
            debug!(kind = shape.kind(), "Ignoring non-rectangular shape");
            continue;
        };
        match region.clipped(dims) {
            Some(clipped) => {
                if clipped != region {
                    debug!(?region, ?clipped, "Rectangle clipped to frame");
                }
                regions.push(clipped);
            }
            None => warn!(?region, "Rectangle lies outside the frame, ignored"),
        }
    }

    if regions.is_empty() {
        return Err(ZfoldError::NoUsableRegion);
    }
    Ok(regions)
}
