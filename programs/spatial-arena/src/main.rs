//! Spatial Arena - spatially iterated Prisoner's Dilemma runner
//!
//! Builds a grid population from a TOML file and command-line flags,
//! advances it epoch by epoch and prints the per-epoch metrics.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::{ArenaConfig, OutputFormat, Overrides, PresetArg};

#[derive(Parser)]
#[command(name = "spatial-arena")]
#[command(author, version, about = "Spatially iterated Prisoner's Dilemma", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation and print one snapshot per epoch
    Run {
        /// TOML file with [simulation] and [run] tables
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of epochs to run
        #[arg(short, long)]
        epochs: Option<u64>,

        /// Random seed (clock-derived when absent everywhere)
        #[arg(short, long)]
        seed: Option<u64>,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        /// Games per neighbor visit
        #[arg(short, long)]
        games: Option<u32>,

        /// Replace the strategy weights with a preset
        #[arg(short, long, value_enum)]
        preset: Option<PresetArg>,

        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Print the final grid of strategy codes
        #[arg(long)]
        show_grid: bool,
    },

    /// List available strategies
    Strategies,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            epochs,
            seed,
            width,
            height,
            games,
            preset,
            format,
            show_grid,
        } => {
            let mut arena = ArenaConfig::load(config.as_deref())?;
            arena.apply(Overrides {
                epochs,
                seed,
                width,
                height,
                games_per_round: games,
                preset,
                format,
                show_grid,
            });
            commands::run::run(arena)
        }
        Commands::Strategies => commands::strategies::strategies(),
    }
}
