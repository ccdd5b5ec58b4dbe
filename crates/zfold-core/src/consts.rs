/// SER trailer timestamps count 100 ns ticks.
pub const SER_TICKS_PER_SECOND: f64 = 10_000_000.0;

/// Bit depth of projected SER and TIFF output.
pub const OUTPUT_PIXEL_DEPTH: u32 = 16;

/// Largest sample value representable in 16-bit output.
pub const MAX_OUTPUT_SAMPLE: f64 = u16::MAX as f64;

/// Largest sample value representable in 8-bit PNG output.
pub const MAX_PNG_SAMPLE: f64 = u8::MAX as f64;

/// Minimum number of images to fan out over the rayon pool.
pub const PARALLEL_IMAGE_THRESHOLD: usize = 2;

/// Default file name of the recovery report.
pub const DEFAULT_REPORT_NAME: &str = "FRAP.csv";
