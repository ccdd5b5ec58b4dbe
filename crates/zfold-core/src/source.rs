//! Boundary traits between the algorithms and whatever stores the pixels.

use std::collections::BTreeMap;

use ndarray::{s, Array2};

use crate::error::{Result, ZfoldError};
use crate::plane::{Plane, PlaneCoord, StackDims};
use crate::project::ProjectedPlane;
use crate::region::{Region, Shape};

/// Supplies single 2D planes of a stack.
pub trait PlaneSource {
    fn dims(&self) -> StackDims;

    /// Read the plane at `coord`, cropped to `region`.
    ///
    /// Implementations must fail with `PlaneUnavailable` rather than return
    /// partially filled data.
    fn plane(&self, coord: PlaneCoord, region: &Region) -> Result<Plane>;
}

/// Looks up the ROI shapes attached to an image.
pub trait ShapeCatalog {
    fn shapes_for(&self, image: &str) -> Result<Vec<Shape>>;
}

/// Sink for projected planes.
///
/// `write` is called once per (region, c, t) in projection order; `finish`
/// once after the last plane of an image.
pub trait StackWriter {
    fn write(&mut self, projected: &ProjectedPlane) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Per-time-point series for kinetics analysis, keyed by time index.
pub trait TimeSeriesSource {
    /// Seconds since the first time point.
    fn timestamps(&self, channel: usize) -> Result<BTreeMap<usize, f64>>;

    /// Average intensity of the measured region.
    fn intensities(&self, channel: usize) -> Result<BTreeMap<usize, f64>>;
}

/// A stack held fully in memory, planes stored in XYZCT order.
#[derive(Clone, Debug)]
pub struct InMemoryStack {
    dims: StackDims,
    planes: Vec<Array2<f64>>,
}

impl InMemoryStack {
    /// `planes` must contain `size_z * size_c * size_t` planes of shape
    /// `(size_y, size_x)`, z varying fastest.
    pub fn new(dims: StackDims, planes: Vec<Array2<f64>>) -> Result<Self> {
        if planes.len() != dims.plane_count() {
            return Err(ZfoldError::InvalidLayout {
                size_z: dims.size_z,
                size_c: dims.size_c,
                size_t: dims.size_t,
                frames: planes.len(),
            });
        }
        if let Some(bad) = planes.iter().find(|p| p.dim() != (dims.size_y, dims.size_x)) {
            return Err(ZfoldError::ShapeMismatch {
                expected: (dims.size_y, dims.size_x),
                found: bad.dim(),
            });
        }
        Ok(Self { dims, planes })
    }

    /// Single channel, single time point stack from a list of Z planes.
    pub fn from_z_planes(planes: Vec<Array2<f64>>) -> Result<Self> {
        let (h, w) = planes.first().map(|p| p.dim()).ok_or(ZfoldError::EmptySequence)?;
        let dims = StackDims {
            size_x: w,
            size_y: h,
            size_z: planes.len(),
            size_c: 1,
            size_t: 1,
        };
        Self::new(dims, planes)
    }
}

impl PlaneSource for InMemoryStack {
    fn dims(&self) -> StackDims {
        self.dims
    }

    fn plane(&self, coord: PlaneCoord, region: &Region) -> Result<Plane> {
        if !self.dims.contains(coord) {
            return Err(ZfoldError::PlaneIndexOutOfRange {
                z: coord.z,
                c: coord.c,
                t: coord.t,
            });
        }
        let region = region.validated(&self.dims)?;
        let index = coord.z + self.dims.size_z * (coord.c + self.dims.size_c * coord.t);
        let tile = self.planes[index]
            .slice(s![
                region.y..region.y + region.height,
                region.x..region.x + region.width
            ])
            .to_owned();
        Ok(Plane::new(tile))
    }
}

/// Writer that keeps every projected plane, for inspection and tests.
#[derive(Debug, Default)]
pub struct CollectingWriter {
    pub planes: Vec<ProjectedPlane>,
    pub finished: bool,
}

impl StackWriter for CollectingWriter {
    fn write(&mut self, projected: &ProjectedPlane) -> Result<()> {
        self.planes.push(projected.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

impl ShapeCatalog for BTreeMap<String, Vec<Shape>> {
    fn shapes_for(&self, image: &str) -> Result<Vec<Shape>> {
        Ok(self.get(image).cloned().unwrap_or_default())
    }
}
