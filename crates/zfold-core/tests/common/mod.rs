#![allow(dead_code)]

use ndarray::Array2;
use zfold_core::io::ser::SER_HEADER_SIZE;

/// Build a SER file header for mono 8-bit frames.
///
/// Returns a `Vec<u8>` containing just the 178-byte header.
/// Append frame pixel data after calling this function.
pub fn build_ser_header(width: u32, height: u32, num_frames: usize) -> Vec<u8> {
    build_ser_header_full(width, height, 8, num_frames, 0)
}

/// Build a SER file header with configurable bit depth and color id.
pub fn build_ser_header_full(
    width: u32,
    height: u32,
    bit_depth: u32,
    num_frames: usize,
    color_id: i32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    // Magic (14 bytes)
    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID (4 bytes)
    buf.extend_from_slice(&0i32.to_le_bytes());
    // ColorID (4 bytes)
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian = 0 (little-endian per Siril convention)
    buf.extend_from_slice(&0i32.to_le_bytes());
    // Width
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    // Height
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    // PixelDepth
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    // FrameCount
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Observer (40 bytes)
    buf.extend_from_slice(&[0u8; 40]);
    // Instrument (40 bytes)
    buf.extend_from_slice(&[0u8; 40]);
    // Telescope (40 bytes)
    buf.extend_from_slice(&[0u8; 40]);
    // DateTime (8 bytes)
    buf.extend_from_slice(&0u64.to_le_bytes());
    // DateTimeUTC (8 bytes)
    buf.extend_from_slice(&0u64.to_le_bytes());

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Build a complete synthetic mono 8-bit SER file with the given frame data.
pub fn build_ser_with_frames(width: u32, height: u32, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = build_ser_header(width, height, frames.len());
    for frame in frames {
        buf.extend_from_slice(frame);
    }
    buf
}

/// Build a mono 16-bit SER file from sample values (little-endian).
pub fn build_ser_16bit(width: u32, height: u32, frames: &[Vec<u16>]) -> Vec<u8> {
    let mut buf = build_ser_header_full(width, height, 16, frames.len(), 0);
    for frame in frames {
        for v in frame {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }
    buf
}

/// Append a timestamp trailer, one tick count per frame.
pub fn append_timestamps(buf: &mut Vec<u8>, ticks: &[u64]) {
    for t in ticks {
        buf.extend_from_slice(&t.to_le_bytes());
    }
}

/// 8-bit frames where every pixel of frame `i` equals `values[i]`.
pub fn uniform_frames(width: u32, height: u32, values: &[u8]) -> Vec<Vec<u8>> {
    values
        .iter()
        .map(|&v| vec![v; (width * height) as usize])
        .collect()
}

/// Write a SER buffer to a temporary file and return the temp file handle.
///
/// The file stays alive as long as the returned `NamedTempFile` is not dropped.
pub fn write_test_ser(data: &[u8]) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut f = tempfile::NamedTempFile::new().expect("create temp file");
    f.write_all(data).expect("write SER data");
    f.flush().expect("flush");
    f
}

/// Read a written TIFF or PNG back as raw sample values.
pub fn load_image_plane(path: &std::path::Path) -> Array2<f64> {
    let gray = image::open(path).expect("open image").to_luma16();
    let (w, h) = gray.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        f64::from(gray.get_pixel(col as u32, row as u32).0[0])
    })
}

/// Write a SER buffer to `dir/name`, for tests that depend on the file stem.
pub fn write_named_ser(dir: &std::path::Path, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).expect("write SER data");
    path
}
