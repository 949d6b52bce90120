//! irtdeck CLI — evaluate fitted IRT models and render their artifacts.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "irtdeck",
    version,
    about = "Graded response model curves, reports and slide decks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a model and write report artifacts
    Evaluate {
        /// Model parameter TOML file (built-in cladribine/EDSS preset if omitted)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Lower end of the latent-trait grid
        #[arg(long, allow_hyphen_values = true)]
        theta_min: Option<f64>,

        /// Upper end of the latent-trait grid
        #[arg(long, allow_hyphen_values = true)]
        theta_max: Option<f64>,

        /// Number of latent-trait grid points
        #[arg(long)]
        points: Option<usize>,

        /// Exposure for the symptomatic offset of the progression curves
        #[arg(long)]
        reference_exposure: Option<f64>,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, deck, csv, all (comma-separated)
        #[arg(long)]
        format: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate model parameter TOML files
    Validate {
        /// Path to a model file or directory
        #[arg(long)]
        model: PathBuf,
    },

    /// List the items of a model with thresholds and discrimination
    Items {
        /// Model parameter TOML file (built-in preset if omitted)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Sort by discrimination, most discriminating first
        #[arg(long)]
        ranked: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and the example model file
    Init,
}

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("irtdeck=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            model,
            theta_min,
            theta_max,
            points,
            reference_exposure,
            output,
            format,
            config,
        } => commands::evaluate::execute(
            model,
            theta_min,
            theta_max,
            points,
            reference_exposure,
            output,
            format,
            config,
        ),
        Commands::Validate { model } => commands::validate::execute(model),
        Commands::Items {
            model,
            ranked,
            config,
        } => commands::items::execute(model, ranked, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
