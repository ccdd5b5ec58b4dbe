use ndarray::Array2;
use std::path::PathBuf;

/// A single 2D plane of intensity samples.
/// Values are kept in raw sample units (e.g. 0..=65535 for 16-bit data).
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    /// Sample data, row-major, shape = (height, width)
    pub data: Array2<f64>,
}

impl Plane {
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Shape as `(height, width)`.
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }
}

/// Dimensions of a five-axis image stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackDims {
    pub size_x: usize,
    pub size_y: usize,
    pub size_z: usize,
    pub size_c: usize,
    pub size_t: usize,
}

impl StackDims {
    /// Number of planes in the stack.
    pub fn plane_count(&self) -> usize {
        self.size_z * self.size_c * self.size_t
    }

    pub fn contains(&self, coord: PlaneCoord) -> bool {
        coord.z < self.size_z && coord.c < self.size_c && coord.t < self.size_t
    }
}

/// Zero-based plane coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlaneCoord {
    pub z: usize,
    pub c: usize,
    pub t: usize,
}

impl PlaneCoord {
    pub fn new(z: usize, c: usize, t: usize) -> Self {
        Self { z, c, t }
    }
}

/// Metadata about a source stack file.
#[derive(Clone, Debug)]
pub struct StackInfo {
    pub filename: PathBuf,
    pub dims: StackDims,
    pub bit_depth: u8,
    pub has_timestamps: bool,
    pub observer: Option<String>,
    pub telescope: Option<String>,
    pub instrument: Option<String>,
}
