use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, Luma};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::consts::{MAX_OUTPUT_SAMPLE, MAX_PNG_SAMPLE};
use crate::error::{Result, ZfoldError};
use crate::plane::Plane;
use crate::project::ProjectedPlane;
use crate::source::StackWriter;

/// Image file format for per-plane output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaneFormat {
    #[default]
    Tiff,
    Png,
}

impl PlaneFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Tiff => "tiff",
            Self::Png => "png",
        }
    }
}

fn to_sample(v: f64, max: f64) -> f64 {
    v.round().clamp(0.0, max)
}

/// Save a plane as 16-bit grayscale TIFF. Samples are rounded and clamped.
pub fn save_tiff(plane: &Plane, path: &Path) -> Result<()> {
    let (h, w) = plane.shape();
    let pixels: Vec<u16> = plane
        .data
        .iter()
        .map(|&v| to_sample(v, MAX_OUTPUT_SAMPLE).to_u16().unwrap_or(0))
        .collect();

    let img = image::ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .ok_or_else(|| ZfoldError::InvalidDimensions {
            width: w as u32,
            height: h as u32,
        })?;
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save a plane as 8-bit grayscale PNG. Samples are rounded and clamped.
pub fn save_png(plane: &Plane, path: &Path) -> Result<()> {
    let (h, w) = plane.shape();

    let mut img = GrayImage::new(w as u32, h as u32);
    for ((row, col), &v) in plane.data.indexed_iter() {
        let val = to_sample(v, MAX_PNG_SAMPLE).to_u8().unwrap_or(0);
        img.put_pixel(col as u32, row as u32, Luma([val]));
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Stack writer producing one image file per (region, c, t).
pub struct ImageStackWriter {
    output_dir: PathBuf,
    stem: String,
    format: PlaneFormat,
    region_count: usize,
    written: Vec<PathBuf>,
}

impl ImageStackWriter {
    pub fn new(output_dir: &Path, stem: &str, format: PlaneFormat, region_count: usize) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            stem: stem.to_string(),
            format,
            region_count,
            written: Vec::new(),
        }
    }

    pub fn path_for(&self, region_index: usize, c: usize, t: usize) -> PathBuf {
        let roi = if self.region_count > 1 {
            format!("_roi{}", region_index + 1)
        } else {
            String::new()
        };
        self.output_dir.join(format!(
            "{}{}_c{}_t{}.{}",
            self.stem,
            roi,
            c,
            t,
            self.format.extension()
        ))
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl StackWriter for ImageStackWriter {
    fn write(&mut self, projected: &ProjectedPlane) -> Result<()> {
        let path = self.path_for(projected.region_index, projected.c, projected.t);
        let max = match self.format {
            PlaneFormat::Tiff => MAX_OUTPUT_SAMPLE,
            PlaneFormat::Png => MAX_PNG_SAMPLE,
        };
        if projected.plane.data.iter().any(|&v| v.round() > max) {
            warn!(output = %path.display(), "Samples above the output range were clamped");
        }
        match self.format {
            PlaneFormat::Tiff => save_tiff(&projected.plane, &path)?,
            PlaneFormat::Png => save_png(&projected.plane, &path)?,
        }
        self.written.push(path);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        info!(
            files = self.written.len(),
            output = %self.output_dir.display(),
            "Projected planes saved"
        );
        Ok(())
    }
}
