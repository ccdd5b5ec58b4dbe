use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use zfold_core::io::ser::{SerStack, StackLayout};

use super::parse_layout;

#[derive(Args)]
pub struct InfoArgs {
    /// Input SER file
    pub file: PathBuf,

    /// Stack layout as ZxCxT (default: every frame is a Z plane)
    #[arg(long, value_parser = parse_layout)]
    pub layout: Option<StackLayout>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let stack = SerStack::open(&args.file, args.layout)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let info = stack.stack_info(&args.file);
    let dims = info.dims;

    println!("File:        {}", info.filename.display());
    println!("Frames:      {}", stack.frame_count());
    println!("Dimensions:  {}x{}", dims.size_x, dims.size_y);
    println!(
        "Layout:      Z={} C={} T={}",
        dims.size_z, dims.size_c, dims.size_t
    );
    println!("Bit depth:   {}", info.bit_depth);
    println!(
        "Timestamps:  {}",
        if info.has_timestamps { "yes" } else { "no" }
    );

    if let Some(ref obs) = info.observer {
        println!("Observer:    {}", obs);
    }
    if let Some(ref inst) = info.instrument {
        println!("Instrument:  {}", inst);
    }
    if let Some(ref tel) = info.telescope {
        println!("Telescope:   {}", tel);
    }

    let frame_bytes = stack.header.frame_byte_size();
    let total_mb = (frame_bytes * stack.frame_count()) as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    Ok(())
}
