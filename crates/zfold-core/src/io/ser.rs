use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::SER_TICKS_PER_SECOND;
use crate::error::{Result, ZfoldError};
use crate::plane::{Plane, PlaneCoord, StackDims, StackInfo};
use crate::region::Region;
use crate::source::PlaneSource;

pub const SER_HEADER_SIZE: usize = 178;
pub const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

/// Mono color id in the SER header.
pub const SER_COLOR_MONO: i32 = 0;

/// SER file header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
    pub observer: String,
    pub instrument: String,
    pub telescope: String,
    pub date_time: u64,
    pub date_time_utc: u64,
}

impl SerHeader {
    /// Header for a mono stack of the given geometry.
    pub fn mono(width: u32, height: u32, pixel_depth: u32, frame_count: u32) -> Self {
        Self {
            color_id: SER_COLOR_MONO,
            little_endian: true,
            width,
            height,
            pixel_depth,
            frame_count,
            observer: String::new(),
            instrument: String::new(),
            telescope: String::new(),
            date_time: 0,
            date_time_utc: 0,
        }
    }

    /// Bytes per sample (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_sample(&self) -> usize {
        if self.pixel_depth <= 8 { 1 } else { 2 }
    }

    /// Total bytes per frame.
    pub fn frame_byte_size(&self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(self.bytes_per_sample())
    }

    /// Bytes of frame data the header declares, or `None` if the geometry
    /// overflows the address space.
    pub fn data_byte_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.bytes_per_sample())?
            .checked_mul(self.frame_count as usize)
    }
}

/// How a flat SER frame sequence maps onto Z, C and T (z varies fastest).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackLayout {
    pub size_z: usize,
    #[serde(default = "one")]
    pub size_c: usize,
    #[serde(default = "one")]
    pub size_t: usize,
}

fn one() -> usize {
    1
}

impl StackLayout {
    /// Every frame is one Z plane of a single channel and time point.
    pub fn z_only(frames: usize) -> Self {
        Self {
            size_z: frames,
            size_c: 1,
            size_t: 1,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.size_z * self.size_c * self.size_t
    }

    pub fn frame_index(&self, coord: PlaneCoord) -> usize {
        coord.z + self.size_z * (coord.c + self.size_c * coord.t)
    }
}

/// Memory-mapped SER file read as a Z/C/T image stack.
pub struct SerStack {
    mmap: Mmap,
    pub header: SerHeader,
    pub layout: StackLayout,
}

impl SerStack {
    /// Open a SER file and parse its header.
    ///
    /// Without a layout every frame is treated as one Z plane.
    pub fn open(path: &Path, layout: Option<StackLayout>) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(ZfoldError::InvalidSer(
                "File too small for SER header".into(),
            ));
        }

        if &mmap[0..14] != SER_MAGIC {
            return Err(ZfoldError::InvalidSer(
                "Missing LUCAM-RECORDER magic".into(),
            ));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;
        if header.color_id != SER_COLOR_MONO {
            return Err(ZfoldError::InvalidSer(format!(
                "Unsupported color id {}; only mono stacks can be projected",
                header.color_id
            )));
        }

        let expected_data_size = header
            .data_byte_size()
            .and_then(|n| n.checked_add(SER_HEADER_SIZE))
            .ok_or_else(|| {
                ZfoldError::InvalidSer(format!(
                    "Header declares {} frames of {}x{} at {} bit, too large to address",
                    header.frame_count, header.width, header.height, header.pixel_depth
                ))
            })?;
        if mmap.len() < expected_data_size {
            return Err(ZfoldError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected_data_size,
                mmap.len()
            )));
        }

        let frames = header.frame_count as usize;
        let layout = layout.unwrap_or_else(|| StackLayout::z_only(frames));
        if layout.frame_count() != frames || frames == 0 {
            return Err(ZfoldError::InvalidLayout {
                size_z: layout.size_z,
                size_c: layout.size_c,
                size_t: layout.size_t,
                frames,
            });
        }

        debug!(
            width = header.width,
            height = header.height,
            depth = header.pixel_depth,
            frames,
            "Opened SER stack"
        );
        Ok(Self {
            mmap,
            header,
            layout,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    /// Raw bytes of one frame (zero-copy from mmap).
    fn frame_raw(&self, index: usize) -> &[u8] {
        let offset = SER_HEADER_SIZE + index * self.header.frame_byte_size();
        &self.mmap[offset..offset + self.header.frame_byte_size()]
    }

    /// Trailer timestamp of one frame, in 100 ns ticks.
    pub fn frame_timestamp(&self, index: usize) -> Option<u64> {
        let trailer_offset =
            SER_HEADER_SIZE + self.header.frame_byte_size() * self.frame_count();
        let ts_offset = trailer_offset + index * 8;
        if index < self.frame_count() && ts_offset + 8 <= self.mmap.len() {
            let bytes = &self.mmap[ts_offset..ts_offset + 8];
            Some(u64::from_le_bytes(bytes.try_into().ok()?))
        } else {
            None
        }
    }

    pub fn has_timestamps(&self) -> bool {
        self.frame_timestamp(self.frame_count() - 1).is_some()
    }

    /// Seconds since time point 0 for every time point of `channel`,
    /// read from the first Z plane of each time point.
    pub fn timestamps_secs(&self, channel: usize) -> Result<BTreeMap<usize, f64>> {
        if channel >= self.layout.size_c {
            return Err(ZfoldError::PlaneIndexOutOfRange {
                z: 0,
                c: channel,
                t: 0,
            });
        }
        let mut out = BTreeMap::new();
        let mut origin = None;
        for t in 0..self.layout.size_t {
            let index = self.layout.frame_index(PlaneCoord::new(0, channel, t));
            let ticks = self
                .frame_timestamp(index)
                .ok_or(ZfoldError::MissingTimestamp(t))?;
            let origin = *origin.get_or_insert(ticks);
            // Difference in integer ticks; absolute tick counts exceed f64 precision.
            let delta = i128::from(ticks) - i128::from(origin);
            out.insert(t, delta as f64 / SER_TICKS_PER_SECOND);
        }
        Ok(out)
    }

    /// Build StackInfo from the header.
    pub fn stack_info(&self, path: &Path) -> StackInfo {
        StackInfo {
            filename: path.to_path_buf(),
            dims: self.dims(),
            bit_depth: self.header.pixel_depth as u8,
            has_timestamps: self.has_timestamps(),
            observer: non_empty(&self.header.observer),
            telescope: non_empty(&self.header.telescope),
            instrument: non_empty(&self.header.instrument),
        }
    }

    fn read_tile(&self, coord: PlaneCoord, region: &Region) -> Result<Plane> {
        let dims = self.dims();
        if !dims.contains(coord) {
            return Err(ZfoldError::PlaneIndexOutOfRange {
                z: coord.z,
                c: coord.c,
                t: coord.t,
            });
        }
        let region = region.validated(&dims)?;
        let raw = self.frame_raw(self.layout.frame_index(coord));
        Ok(Plane::new(decode_tile(
            raw,
            self.header.width as usize,
            &region,
            self.header.bytes_per_sample(),
            self.header.little_endian,
        )))
    }
}

impl PlaneSource for SerStack {
    fn dims(&self) -> StackDims {
        StackDims {
            size_x: self.header.width as usize,
            size_y: self.header.height as usize,
            size_z: self.layout.size_z,
            size_c: self.layout.size_c,
            size_t: self.layout.size_t,
        }
    }

    fn plane(&self, coord: PlaneCoord, region: &Region) -> Result<Plane> {
        self.read_tile(coord, region)
            .map_err(|e| ZfoldError::PlaneUnavailable {
                z: coord.z,
                c: coord.c,
                t: coord.t,
                reason: e.to_string(),
            })
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()? as u32;
    let height = cursor.read_i32::<LittleEndian>()? as u32;
    let pixel_depth = cursor.read_i32::<LittleEndian>()? as u32;
    let frame_count = cursor.read_i32::<LittleEndian>()? as u32;

    let observer = read_fixed_string(&buf[42..82]);
    let instrument = read_fixed_string(&buf[82..122]);
    let telescope = read_fixed_string(&buf[122..162]);

    let mut cursor = std::io::Cursor::new(&buf[162..]);
    let date_time = cursor.read_u64::<LittleEndian>()?;
    let date_time_utc = cursor.read_u64::<LittleEndian>()?;

    if width == 0 || height == 0 {
        return Err(ZfoldError::InvalidDimensions { width, height });
    }
    if pixel_depth == 0 || pixel_depth > 16 {
        return Err(ZfoldError::InvalidSer(format!(
            "Unsupported pixel depth {pixel_depth}"
        )));
    }

    // Follow Siril's convention: 0 means little-endian.
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width,
        height,
        pixel_depth,
        frame_count,
        observer,
        instrument,
        telescope,
        date_time,
        date_time_utc,
    })
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// Decode the samples of `region` from a raw frame, in raw sample units.
fn decode_tile(
    raw: &[u8],
    frame_width: usize,
    region: &Region,
    bytes_per_sample: usize,
    little_endian: bool,
) -> Array2<f64> {
    let row_stride = frame_width * bytes_per_sample;
    let mut data = Array2::<f64>::zeros(region.shape());

    for row in 0..region.height {
        let start = (region.y + row) * row_stride + region.x * bytes_per_sample;
        let src = &raw[start..start + region.width * bytes_per_sample];
        for (col, sample) in src.chunks_exact(bytes_per_sample).enumerate() {
            data[[row, col]] = match sample {
                [v] => f64::from(*v),
                [a, b] if little_endian => f64::from(u16::from_le_bytes([*a, *b])),
                [a, b] => f64::from(u16::from_be_bytes([*a, *b])),
                _ => unreachable!("SER samples are one or two bytes"),
            };
        }
    }

    data
}
