mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "zfold", about = "Z-projection and FRAP analysis for microscopy stacks")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show SER stack metadata
    Info(commands::info::InfoArgs),
    /// Project stacks along Z
    Project(commands::project::ProjectArgs),
    /// Estimate FRAP half-time and mobile fraction
    Frap(commands::frap::FrapArgs),
    /// Print a default config file
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Project(args) => commands::project::run(args),
        Commands::Frap(args) => commands::frap::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
