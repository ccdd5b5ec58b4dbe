use std::collections::BTreeMap;

use num_traits::ToPrimitive;
use tracing::debug;

use crate::error::{Result, ZfoldError};
use crate::plane::PlaneCoord;
use crate::region::{Region, Shape};
use crate::source::PlaneSource;

/// An ellipse on the pixel grid, bound to one (z, t) plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ellipse {
    pub cx: i64,
    pub cy: i64,
    pub rx: i64,
    pub ry: i64,
    pub z: usize,
    pub t: usize,
}

impl Ellipse {
    /// Truncate an ellipse shape onto the pixel grid. Other kinds give `None`.
    pub fn from_shape(shape: &Shape) -> Option<Self> {
        match *shape {
            Shape::Ellipse {
                cx,
                cy,
                rx,
                ry,
                z,
                t,
            } => Some(Self {
                cx: cx.trunc().to_i64()?,
                cy: cy.trunc().to_i64()?,
                rx: rx.trunc().to_i64()?,
                ry: ry.trunc().to_i64()?,
                z,
                t,
            }),
            _ => None,
        }
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        let dx = (x - self.cx) as f64 / self.rx as f64;
        let dy = (y - self.cy) as f64 / self.ry as f64;
        dx * dx + dy * dy <= 1.0
    }

    /// Bounding box `[cx - rx, cx + rx) x [cy - ry, cy + ry)` clipped to a
    /// `width x height` frame.
    pub fn bounding_region(&self, width: usize, height: usize) -> Option<Region> {
        let x0 = (self.cx - self.rx).max(0);
        let y0 = (self.cy - self.ry).max(0);
        let x1 = (self.cx + self.rx).min(width as i64);
        let y1 = (self.cy + self.ry).min(height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Region::new(
            x0 as usize,
            y0 as usize,
            (x1 - x0) as usize,
            (y1 - y0) as usize,
        ))
    }
}

/// One ellipse per time point; when several share a time point the last wins.
pub fn ellipses_by_time(shapes: &[Shape]) -> BTreeMap<usize, Ellipse> {
    shapes
        .iter()
        .filter_map(Ellipse::from_shape)
        .map(|e| (e.t, e))
        .collect()
}

/// Mean sample value of the pixels inside `ellipse` on `channel`.
pub fn ellipse_mean<S: PlaneSource + ?Sized>(
    source: &S,
    ellipse: &Ellipse,
    channel: usize,
) -> Result<f64> {
    if ellipse.rx < 1 || ellipse.ry < 1 {
        return Err(ZfoldError::InvalidRegion(format!(
            "Ellipse radii must be >= 1 (rx={}, ry={})",
            ellipse.rx, ellipse.ry
        )));
    }
    let dims = source.dims();
    let region = ellipse
        .bounding_region(dims.size_x, dims.size_y)
        .ok_or_else(|| {
            ZfoldError::InvalidRegion(format!(
                "Ellipse at ({}, {}) lies outside the frame",
                ellipse.cx, ellipse.cy
            ))
        })?;

    let tile = source.plane(PlaneCoord::new(ellipse.z, channel, ellipse.t), &region)?;

    let mut sum = 0.0;
    let mut count = 0usize;
    for ((row, col), &v) in tile.data.indexed_iter() {
        let x = (region.x + col) as i64;
        let y = (region.y + row) as i64;
        if ellipse.contains(x, y) {
            sum += v;
            count += 1;
        }
    }

    if count == 0 {
        return Err(ZfoldError::EmptyRegion(format!(
            "ellipse at ({}, {}) t={}",
            ellipse.cx, ellipse.cy, ellipse.t
        )));
    }
    Ok(sum / count as f64)
}

/// Average intensity inside each ellipse, keyed by time index.
pub fn measure_ellipses<S: PlaneSource + ?Sized>(
    source: &S,
    ellipses: &BTreeMap<usize, Ellipse>,
    channel: usize,
) -> Result<BTreeMap<usize, f64>> {
    let mut out = BTreeMap::new();
    for (&t, ellipse) in ellipses {
        let mean = ellipse_mean(source, ellipse, channel)?;
        debug!(t, mean, "Ellipse measured");
        out.insert(t, mean);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_region_clipped() {
        let e = Ellipse {
            cx: 1,
            cy: 1,
            rx: 3,
            ry: 2,
            z: 0,
            t: 0,
        };
        assert_eq!(e.bounding_region(10, 10), Some(Region::new(0, 0, 4, 3)));
        assert_eq!(e.bounding_region(0, 10), None);
    }

    #[test]
    fn test_last_ellipse_per_time_wins() {
        let shapes = vec![
            Shape::Ellipse {
                cx: 5.0,
                cy: 5.0,
                rx: 2.0,
                ry: 2.0,
                z: 0,
                t: 1,
            },
            Shape::Rectangle {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
            },
            Shape::Ellipse {
                cx: 7.0,
                cy: 5.0,
                rx: 2.0,
                ry: 2.0,
                z: 0,
                t: 1,
            },
        ];
        let map = ellipses_by_time(&shapes);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&1].cx, 7);
    }
}
