use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZfoldError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Stack layout {size_z}x{size_c}x{size_t} (ZxCxT) does not match {frames} frames")]
    InvalidLayout {
        size_z: usize,
        size_c: usize,
        size_t: usize,
        frames: usize,
    },

    #[error("Plane z={z} c={c} t={t} out of range")]
    PlaneIndexOutOfRange { z: usize, c: usize, t: usize },

    #[error("Plane z={z} c={c} t={t} unavailable: {reason}")]
    PlaneUnavailable {
        z: usize,
        c: usize,
        t: usize,
        reason: String,
    },

    #[error("Invalid Z range {z_start}..={z_end} for a stack of {size_z} planes")]
    InvalidZRange {
        z_start: usize,
        z_end: usize,
        size_z: usize,
    },

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("No rectangular region of interest to project")]
    NoUsableRegion,

    #[error("Region contains no pixels: {0}")]
    EmptyRegion(String),

    #[error("Plane shape {found:?} does not match accumulator shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Empty plane sequence")]
    EmptySequence,

    #[error("Need at least 2 time points, got {0}")]
    InsufficientData(usize),

    #[error("Bleach detected at the first time point (t={0}); no pre-bleach sample")]
    NoPreBleachSample(usize),

    #[error("Pre-bleach and bleach intensities are equal ({0})")]
    DegenerateBleach(f64),

    #[error("Intensity never reaches half recovery ({target}) after the bleach")]
    RecoveryIncomplete { target: f64 },

    #[error("No timestamp for time point {0}")]
    MissingTimestamp(usize),

    #[error("Non-finite sample at time point {0}")]
    NonFiniteSample(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, ZfoldError>;
