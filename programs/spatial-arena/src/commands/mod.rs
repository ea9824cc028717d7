//! Runner subcommands

pub mod run;
pub mod strategies;
