use tracing::{debug, info};

use crate::error::{Result, ZfoldError};
use crate::plane::{Plane, PlaneCoord, StackDims};
use crate::region::Region;
use crate::source::{PlaneSource, StackWriter};

use super::reduce::Accumulator;
use super::{ProjectionMethod, ProjectionSpec};

/// One reduced plane together with where it belongs in the output stack.
#[derive(Clone, Debug)]
pub struct ProjectedPlane {
    pub region_index: usize,
    pub region: Region,
    pub c: usize,
    pub t: usize,
    pub plane: Plane,
}

/// Why an image produced no output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The stack has a single Z plane and the range spans fewer than two.
    SinglePlane,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SinglePlane => write!(f, "single Z plane, nothing to project"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionOutcome {
    Completed { planes: usize },
    Skipped(SkipReason),
}

/// Per-image skip policy, evaluated before any plane is read.
pub fn skip_reason(dims: &StackDims, spec: &ProjectionSpec) -> Option<SkipReason> {
    if dims.size_z == 1 && spec.z_end.saturating_sub(spec.z_start) < 1 {
        Some(SkipReason::SinglePlane)
    } else {
        None
    }
}

/// Lazy projection over every (region, c, t) of one image.
///
/// Yields planes in region, channel, time order. Each `next()` streams the Z
/// range through the source and folds it, so at most one source plane and
/// one accumulator are alive at a time. Dropping the iterator mid-way
/// discards the partial fold. After an error the iterator is exhausted.
pub struct Projection<'a, S: PlaneSource + ?Sized> {
    source: &'a S,
    method: ProjectionMethod,
    z_range: std::ops::RangeInclusive<usize>,
    regions: Vec<Region>,
    size_c: usize,
    size_t: usize,
    region_index: usize,
    c: usize,
    t: usize,
    done: bool,
}

impl<'a, S: PlaneSource + ?Sized> Projection<'a, S> {
    /// Total number of planes this projection yields.
    pub fn len_planes(&self) -> usize {
        self.regions.len() * self.size_c * self.size_t
    }

    fn fold_current(&self) -> Result<Plane> {
        let region = &self.regions[self.region_index];
        let mut acc = Accumulator::new(self.method);
        for z in self.z_range.clone() {
            let coord = PlaneCoord::new(z, self.c, self.t);
            let plane = self
                .source
                .plane(coord, region)
                .map_err(|e| unavailable(coord, e))?;
            if plane.shape() != region.shape() {
                return Err(unavailable(
                    coord,
                    ZfoldError::ShapeMismatch {
                        expected: region.shape(),
                        found: plane.shape(),
                    },
                ));
            }
            acc.push(plane)?;
        }
        acc.finish()
    }

    fn advance(&mut self) {
        self.t += 1;
        if self.t == self.size_t {
            self.t = 0;
            self.c += 1;
            if self.c == self.size_c {
                self.c = 0;
                self.region_index += 1;
                if self.region_index == self.regions.len() {
                    self.done = true;
                }
            }
        }
    }
}

impl<S: PlaneSource + ?Sized> Iterator for Projection<'_, S> {
    type Item = Result<ProjectedPlane>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let (region_index, c, t) = (self.region_index, self.c, self.t);
        match self.fold_current() {
            Ok(plane) => {
                self.advance();
                Some(Ok(ProjectedPlane {
                    region_index,
                    region: self.regions[region_index],
                    c,
                    t,
                    plane,
                }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<S: PlaneSource + ?Sized> std::iter::FusedIterator for Projection<'_, S> {}

/// Start a projection of one image. The skip policy is not applied here.
pub fn project<'a, S: PlaneSource + ?Sized>(
    source: &'a S,
    spec: &ProjectionSpec,
) -> Result<Projection<'a, S>> {
    let dims = source.dims();
    spec.validate(&dims)?;

    let done = dims.size_c == 0 || dims.size_t == 0;
    Ok(Projection {
        source,
        method: spec.method,
        z_range: spec.z_indices(),
        regions: spec.regions.clone(),
        size_c: dims.size_c,
        size_t: dims.size_t,
        region_index: 0,
        c: 0,
        t: 0,
        done,
    })
}

/// Project one image into `writer`, applying the skip policy first.
///
/// Every produced plane is handed to the writer immediately and dropped.
/// A failure stops this image; planes already written stay written.
pub fn project_into<S, W>(
    source: &S,
    spec: &ProjectionSpec,
    writer: &mut W,
) -> Result<ProjectionOutcome>
where
    S: PlaneSource + ?Sized,
    W: StackWriter + ?Sized,
{
    let dims = source.dims();
    if let Some(reason) = skip_reason(&dims, spec) {
        info!(%reason, "Skipping image");
        return Ok(ProjectionOutcome::Skipped(reason));
    }

    let projection = project(source, spec)?;
    info!(
        method = %spec.method,
        z_start = spec.z_start,
        z_end = spec.z_end,
        regions = spec.regions.len(),
        planes = projection.len_planes(),
        "Projecting stack"
    );

    let mut written = 0;
    for item in projection {
        let projected = item?;
        debug!(
            region = projected.region_index,
            c = projected.c,
            t = projected.t,
            "Plane reduced"
        );
        writer.write(&projected)?;
        written += 1;
    }
    writer.finish()?;

    Ok(ProjectionOutcome::Completed { planes: written })
}

fn unavailable(coord: PlaneCoord, err: ZfoldError) -> ZfoldError {
    match err {
        e @ ZfoldError::PlaneUnavailable { .. } => e,
        other => ZfoldError::PlaneUnavailable {
            z: coord.z,
            c: coord.c,
            t: coord.t,
            reason: other.to_string(),
        },
    }
}
