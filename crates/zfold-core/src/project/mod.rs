pub mod engine;
pub mod reduce;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZfoldError};
use crate::plane::StackDims;
use crate::region::Region;

pub use engine::{project, project_into, skip_reason, ProjectedPlane, Projection, ProjectionOutcome, SkipReason};
pub use reduce::{reduce, Accumulator};

/// How planes along Z are combined into one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionMethod {
    #[default]
    Maximum,
    Minimum,
    Sum,
    Mean,
}

impl ProjectionMethod {
    /// Short tag used in output names, e.g. `cells_MAX`.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Maximum => "MAX",
            Self::Minimum => "MIN",
            Self::Sum => "SUM",
            Self::Mean => "MEAN",
        }
    }
}

impl std::fmt::Display for ProjectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Maximum => write!(f, "Maximum"),
            Self::Minimum => write!(f, "Minimum"),
            Self::Sum => write!(f, "Sum"),
            Self::Mean => write!(f, "Mean"),
        }
    }
}

/// One projection request for one image.
///
/// `z_start` and `z_end` are 1-based and inclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionSpec {
    pub method: ProjectionMethod,
    pub z_start: usize,
    pub z_end: usize,
    pub regions: Vec<Region>,
}

impl ProjectionSpec {
    /// Resolve optional user bounds against the stack: missing bounds default
    /// to the first and last plane.
    pub fn new(
        method: ProjectionMethod,
        first_z: Option<usize>,
        last_z: Option<usize>,
        regions: Vec<Region>,
        dims: &StackDims,
    ) -> Result<Self> {
        let spec = Self {
            method,
            z_start: first_z.unwrap_or(1),
            z_end: last_z.unwrap_or(dims.size_z),
            regions,
        };
        spec.validate(dims)?;
        Ok(spec)
    }

    /// Check the Z range and every region against the stack dimensions.
    pub fn validate(&self, dims: &StackDims) -> Result<()> {
        if self.z_start == 0 || self.z_start > self.z_end || self.z_end > dims.size_z {
            return Err(ZfoldError::InvalidZRange {
                z_start: self.z_start,
                z_end: self.z_end,
                size_z: dims.size_z,
            });
        }
        if self.regions.is_empty() {
            return Err(ZfoldError::NoUsableRegion);
        }
        for region in &self.regions {
            region.validated(dims)?;
        }
        Ok(())
    }

    /// Number of planes folded per output plane.
    pub fn depth(&self) -> usize {
        self.z_end - self.z_start + 1
    }

    /// Zero-based Z indices to fold, ascending.
    pub fn z_indices(&self) -> std::ops::RangeInclusive<usize> {
        (self.z_start - 1)..=(self.z_end - 1)
    }
}
