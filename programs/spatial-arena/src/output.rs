//! Snapshot and grid rendering for the terminal

use std::io::Write;

use anyhow::Result;
use dilemma_logic::{Engine, Snapshot, StrategyKind};

pub fn write_json(out: &mut impl Write, snapshot: &Snapshot) -> Result<()> {
    serde_json::to_writer(&mut *out, snapshot)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_table_header(out: &mut impl Write) -> Result<()> {
    write!(out, "{:>6} {:>8}", "epoch", "coop")?;
    for kind in StrategyKind::ALL {
        write!(out, " {:>5}", kind.abbreviation())?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn write_table_row(out: &mut impl Write, snapshot: &Snapshot) -> Result<()> {
    write!(out, "{:>6} {:>8.4}", snapshot.epoch, snapshot.cooperation_ratio)?;
    for kind in StrategyKind::ALL {
        write!(out, " {:>5}", snapshot.count(kind))?;
    }
    writeln!(out)?;
    Ok(())
}

/// One row of two-letter codes per grid row
pub fn write_grid(out: &mut impl Write, engine: &Engine) -> Result<()> {
    let width = engine.width() as usize;
    for row in engine.portrayals().chunks(width) {
        let line: Vec<&str> = row.iter().map(|p| p.abbreviation.as_str()).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    Ok(())
}

pub fn write_catalog(out: &mut impl Write) -> Result<()> {
    for kind in StrategyKind::ALL {
        writeln!(
            out,
            "{:<16} {}  {:<17} {}",
            kind.name(),
            kind.abbreviation(),
            kind.css_color(),
            kind.description()
        )?;
    }
    Ok(())
}
