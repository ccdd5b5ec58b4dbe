use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use num_traits::ToPrimitive;
use tracing::{info, warn};

use crate::consts::{MAX_OUTPUT_SAMPLE, OUTPUT_PIXEL_DEPTH};
use crate::error::{Result, ZfoldError};
use crate::plane::Plane;
use crate::project::ProjectedPlane;
use crate::source::StackWriter;

use super::ser::{SerHeader, SER_HEADER_SIZE, SER_MAGIC};

/// Writes a valid SER file at the raw byte level.
pub struct SerWriter {
    writer: BufWriter<File>,
    header: SerHeader,
    frames_written: u32,
}

impl SerWriter {
    /// Create a new SER file and write the header.
    pub fn create(path: &Path, header: &SerHeader) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_header(&mut writer, header)?;
        Ok(Self {
            writer,
            header: header.clone(),
            frames_written: 0,
        })
    }

    /// Write a single raw frame (bytes must match the header's frame_byte_size).
    pub fn write_raw_frame(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != self.header.frame_byte_size() {
            return Err(ZfoldError::InvalidSer(format!(
                "Frame of {} bytes, expected {}",
                data.len(),
                self.header.frame_byte_size()
            )));
        }
        if self.frames_written >= self.header.frame_count {
            return Err(ZfoldError::InvalidSer(format!(
                "Header declares {} frames, refusing to write more",
                self.header.frame_count
            )));
        }
        self.writer.write_all(data)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Write a frame into slot `index`, leaving the sequential position
    /// wherever the seek put it. Every slot must be written exactly once.
    pub fn write_frame_at(&mut self, index: usize, data: &[u8]) -> Result<()> {
        if index >= self.header.frame_count as usize {
            return Err(ZfoldError::InvalidSer(format!(
                "Frame slot {} out of {} declared frames",
                index, self.header.frame_count
            )));
        }
        let offset = SER_HEADER_SIZE + index * self.header.frame_byte_size();
        self.writer.seek(SeekFrom::Start(offset as u64))?;
        self.write_raw_frame(data)
    }

    pub fn frames_written(&self) -> u32 {
        self.frames_written
    }

    /// Flush and finalize the file.
    pub fn finalize(mut self) -> Result<()> {
        if self.frames_written != self.header.frame_count {
            return Err(ZfoldError::InvalidSer(format!(
                "Wrote {} of {} declared frames",
                self.frames_written, self.header.frame_count
            )));
        }
        self.writer.flush()?;
        Ok(())
    }
}

fn write_header(w: &mut impl Write, header: &SerHeader) -> Result<()> {
    // Magic (14 bytes)
    w.write_all(SER_MAGIC)?;
    // LuID (4 bytes)
    w.write_all(&0i32.to_le_bytes())?;
    // ColorID (4 bytes)
    w.write_all(&header.color_id.to_le_bytes())?;
    // LittleEndian flag: 0 = little-endian (Siril convention)
    let le_flag: i32 = if header.little_endian { 0 } else { 1 };
    w.write_all(&le_flag.to_le_bytes())?;
    w.write_all(&(header.width as i32).to_le_bytes())?;
    w.write_all(&(header.height as i32).to_le_bytes())?;
    w.write_all(&(header.pixel_depth as i32).to_le_bytes())?;
    w.write_all(&(header.frame_count as i32).to_le_bytes())?;
    // Observer, Instrument, Telescope (40 bytes each)
    write_fixed_string(w, &header.observer, 40)?;
    write_fixed_string(w, &header.instrument, 40)?;
    write_fixed_string(w, &header.telescope, 40)?;
    // DateTime, DateTimeUTC (8 bytes each)
    w.write_all(&header.date_time.to_le_bytes())?;
    w.write_all(&header.date_time_utc.to_le_bytes())?;

    debug_assert_eq!(
        14 + 4 + 4 + 4 + 4 + 4 + 4 + 4 + 40 + 40 + 40 + 8 + 8,
        SER_HEADER_SIZE
    );
    Ok(())
}

fn write_fixed_string(w: &mut impl Write, s: &str, len: usize) -> Result<()> {
    let bytes = s.as_bytes();
    let to_write = bytes.len().min(len);
    w.write_all(&bytes[..to_write])?;
    w.write_all(&vec![0u8; len - to_write])?;
    Ok(())
}

/// Encode a plane as little-endian u16 samples, rounding and clamping.
///
/// Returns the bytes and the number of samples that had to be clamped.
pub fn encode_u16_le(plane: &Plane) -> (Vec<u8>, usize) {
    let mut bytes = Vec::with_capacity(plane.data.len() * 2);
    let mut clamped = 0;
    for &v in plane.data.iter() {
        let rounded = v.round();
        if !(0.0..=MAX_OUTPUT_SAMPLE).contains(&rounded) {
            clamped += 1;
        }
        let sample = rounded.clamp(0.0, MAX_OUTPUT_SAMPLE).to_u16().unwrap_or(0);
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    (bytes, clamped)
}

/// Stack writer producing one 16-bit SER file per region.
///
/// Each file holds `size_c * size_t` single-plane frames laid out like the
/// input (channel varying fastest), so it reads back with a `1xCxT` layout.
/// Frames go to a `.ser.part` file that is renamed once every slot is
/// written; a writer dropped mid-file removes its partial output.
pub struct SerStackWriter {
    output_dir: PathBuf,
    stem: String,
    size_c: usize,
    size_t: usize,
    region_count: usize,
    current: Option<(usize, SerWriter)>,
    written: Vec<PathBuf>,
    clamped: usize,
}

impl SerStackWriter {
    pub fn new(
        output_dir: &Path,
        stem: &str,
        size_c: usize,
        size_t: usize,
        region_count: usize,
    ) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            stem: stem.to_string(),
            size_c,
            size_t,
            region_count,
            current: None,
            written: Vec::new(),
            clamped: 0,
        }
    }

    /// Output path for one region.
    pub fn path_for(&self, region_index: usize) -> PathBuf {
        let name = if self.region_count > 1 {
            format!("{}_roi{}.ser", self.stem, region_index + 1)
        } else {
            format!("{}.ser", self.stem)
        };
        self.output_dir.join(name)
    }

    /// Path written while a region's file is still incomplete.
    pub fn partial_path_for(&self, region_index: usize) -> PathBuf {
        self.path_for(region_index).with_extension("ser.part")
    }

    /// Files completed so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Total samples clamped to the 16-bit range.
    pub fn clamped_samples(&self) -> usize {
        self.clamped
    }

    fn close_current(&mut self) -> Result<()> {
        if let Some((index, writer)) = self.current.take() {
            let partial = self.partial_path_for(index);
            if let Err(e) = writer.finalize() {
                discard_partial(&partial);
                return Err(e);
            }
            let path = self.path_for(index);
            std::fs::rename(&partial, &path)?;
            info!(output = %path.display(), "Projected stack saved");
            self.written.push(path);
        }
        Ok(())
    }
}

impl Drop for SerStackWriter {
    fn drop(&mut self) {
        if let Some((index, writer)) = self.current.take() {
            drop(writer);
            discard_partial(&self.partial_path_for(index));
        }
    }
}

fn discard_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => warn!(output = %path.display(), "Incomplete projected stack discarded"),
        Err(e) => warn!(output = %path.display(), error = %e, "Could not remove incomplete stack"),
    }
}

impl StackWriter for SerStackWriter {
    fn write(&mut self, projected: &ProjectedPlane) -> Result<()> {
        let needs_open = !matches!(self.current, Some((i, _)) if i == projected.region_index);
        if needs_open {
            self.close_current()?;
            let header = SerHeader::mono(
                projected.region.width as u32,
                projected.region.height as u32,
                OUTPUT_PIXEL_DEPTH,
                (self.size_c * self.size_t) as u32,
            );
            let path = self.partial_path_for(projected.region_index);
            let writer = SerWriter::create(&path, &header)?;
            self.current = Some((projected.region_index, writer));
        }

        let (bytes, clamped) = encode_u16_le(&projected.plane);
        if clamped > 0 {
            warn!(
                clamped,
                c = projected.c,
                t = projected.t,
                "Samples outside the 16-bit range were clamped"
            );
            self.clamped += clamped;
        }
        let slot = projected.c + self.size_c * projected.t;
        if let Some((_, writer)) = self.current.as_mut() {
            writer.write_frame_at(slot, &bytes)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.close_current()
    }
}
