//! List the strategy catalog

use std::io::{self, Write};

use anyhow::Result;

use crate::output::write_catalog;

pub fn strategies() -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_catalog(&mut out)?;
    out.flush()?;
    Ok(())
}
