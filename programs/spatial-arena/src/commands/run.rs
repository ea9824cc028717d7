//! Advance a simulation epoch by epoch and print its metrics

use std::io::{self, BufWriter, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use dilemma_logic::Engine;
use tracing::info;

use crate::config::{ArenaConfig, OutputFormat};
use crate::output::{write_grid, write_json, write_table_header, write_table_row};

pub fn run(mut config: ArenaConfig) -> Result<()> {
    if config.simulation.seed.is_none() {
        let seed = clock_seed();
        info!(seed, "no seed configured, using clock");
        config.simulation.seed = Some(seed);
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    run_to(&config, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Drive the engine for `config.run.epochs` epochs, writing to `out`.
pub fn run_to(config: &ArenaConfig, out: &mut impl Write) -> Result<Engine> {
    let mut engine = Engine::new(config.simulation.clone()).context("Failed to build simulation")?;

    if config.run.format == OutputFormat::Table {
        write_table_header(out)?;
    }

    for _ in 0..config.run.epochs {
        engine
            .advance_epoch()
            .with_context(|| format!("Epoch {} failed", engine.epoch()))?;

        if let Some(snapshot) = engine.latest_snapshot() {
            match config.run.format {
                OutputFormat::Json => write_json(out, snapshot)?,
                OutputFormat::Table => write_table_row(out, snapshot)?,
            }
        }
    }

    if config.run.show_grid {
        writeln!(out)?;
        write_grid(out, &engine)?;
    }

    info!(epochs = engine.epoch(), "run complete");
    Ok(engine)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}
