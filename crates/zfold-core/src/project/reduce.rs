use ndarray::{Array2, Zip};

use crate::error::{Result, ZfoldError};
use crate::plane::Plane;

use super::ProjectionMethod;

/// Running fold of planes along Z.
///
/// Holds exactly one accumulator plane. The first pushed plane becomes the
/// accumulator; every later plane is folded in and dropped.
#[derive(Debug)]
pub struct Accumulator {
    method: ProjectionMethod,
    state: Option<Array2<f64>>,
    count: usize,
}

impl Accumulator {
    pub fn new(method: ProjectionMethod) -> Self {
        Self {
            method,
            state: None,
            count: 0,
        }
    }

    /// Number of planes folded so far.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn push(&mut self, plane: Plane) -> Result<()> {
        let Some(acc) = self.state.as_mut() else {
            self.state = Some(plane.data);
            self.count = 1;
            return Ok(());
        };

        if acc.dim() != plane.data.dim() {
            return Err(ZfoldError::ShapeMismatch {
                expected: acc.dim(),
                found: plane.data.dim(),
            });
        }

        self.count += 1;
        let zip = Zip::from(acc).and(&plane.data);
        match self.method {
            ProjectionMethod::Maximum => zip.for_each(|a, &v| {
                if v > *a {
                    *a = v;
                }
            }),
            ProjectionMethod::Minimum => zip.for_each(|a, &v| {
                if v < *a {
                    *a = v;
                }
            }),
            ProjectionMethod::Sum => zip.for_each(|a, &v| *a += v),
            ProjectionMethod::Mean => {
                let k = self.count as f64;
                zip.for_each(|a, &v| *a += (v - *a) / k);
            }
        }
        Ok(())
    }

    /// Consume the accumulator and return the reduced plane.
    pub fn finish(self) -> Result<Plane> {
        self.state.map(Plane::new).ok_or(ZfoldError::EmptySequence)
    }
}

/// Reduce an ordered sequence of same-shaped planes to one plane.
pub fn reduce<I>(method: ProjectionMethod, planes: I) -> Result<Plane>
where
    I: IntoIterator<Item = Plane>,
{
    let mut acc = Accumulator::new(method);
    for plane in planes {
        acc.push(plane)?;
    }
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mean_is_cumulative() {
        // The mean of [0, 0, 3] is 1, not the average of the last two partials.
        let planes = [0.0, 0.0, 3.0].map(|v| Plane::new(array![[v]]));
        let out = reduce(ProjectionMethod::Mean, planes).unwrap();
        assert!((out.data[[0, 0]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_count_tracks_pushes() {
        let mut acc = Accumulator::new(ProjectionMethod::Sum);
        assert_eq!(acc.count(), 0);
        acc.push(Plane::new(array![[1.0]])).unwrap();
        acc.push(Plane::new(array![[2.0]])).unwrap();
        assert_eq!(acc.count(), 2);
        assert_eq!(acc.finish().unwrap().data[[0, 0]], 3.0);
    }
}
