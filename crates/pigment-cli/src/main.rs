//! pigment - spectral paint mixing from the command line
//!
//! Fits a two-flux pigment model from calibration measurements, predicts
//! mixtures and searches for recipes matching a target color.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod loader;

use config::Config;

#[derive(Parser)]
#[command(name = "pigment")]
#[command(author, version, about = "Spectral paint mixing and recipe search")]
#[command(long_about = "
Predicts the color of paint mixtures from measured reflectance spectra and
searches for paint recipes matching a target color.

Calibration files are JSON arrays with a wavelength grid and reflectance
measurements in percent (see the loader documentation).

Examples:
  pigment fit masstone.json mix1.json                 # Fit and check the model
  pigment mix masstone.json mix1.json -p blue=1 -p white=3
  pigment solve masstone.json mix1.json -t 4a7b9d     # Best recipes for #4a7b9d
  pigment solve data/*.json -t 4a7b9d --paints blue,yellow,white --max-paints 2
  pigment -vv --config pigment.yaml solve data/*.json -t 808080
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the pigment model and report how well it reproduces the data
    Fit(FitArgs),

    /// Predict the color of a mixture
    #[command(visible_alias = "m")]
    Mix(MixArgs),

    /// Search for recipes matching a target color
    #[command(visible_alias = "s")]
    Solve(SolveArgs),
}

/// Options shared by every command that fits a model.
#[derive(Args)]
struct ModelArgs {
    /// Calibration files (JSON), merged in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Reference white masstone
    #[arg(short, long)]
    white: Option<String>,

    /// Fail when a calibration sample is not reproduced within tolerance
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct FitArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Consistency tolerance on sum |predicted - measured|
    #[arg(long)]
    tolerance: Option<f64>,

    /// Print fitted K and S per wavelength
    #[arg(long)]
    parameters: bool,
}

#[derive(Args)]
struct MixArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Paint and amount as name=weight (repeatable)
    #[arg(short, long = "paint", required = true, value_parser = commands::parse_component)]
    paints: Vec<pigment_mixing::MixComponent>,

    /// Print the mixed reflectance per wavelength
    #[arg(long)]
    spectrum: bool,
}

#[derive(Args)]
struct SolveArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Target color as RRGGBB hex
    #[arg(short, long, value_parser = commands::parse_hex_color)]
    target: [u8; 3],

    /// Candidate paints (default: every fitted paint)
    #[arg(short, long, value_delimiter = ',')]
    paints: Vec<String>,

    /// Largest number of paints in a recipe
    #[arg(short = 'k', long)]
    max_paints: Option<usize>,

    /// Recipes shown per recipe size
    #[arg(short = 'n', long)]
    top: Option<usize>,

    /// Color space for the match error: linear-rgb, encoded-rgb, lab
    #[arg(short, long, value_parser = commands::parse_error_space)]
    error_space: Option<pigment_recipe::ErrorSpace>,
}

/// Installs the stderr log subscriber; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Fit(args) => commands::fit::run(args, config, cli.verbose),
        Commands::Mix(args) => commands::mix::run(args, config, cli.verbose),
        Commands::Solve(args) => commands::solve::run(args, config, cli.verbose),
    }
}
