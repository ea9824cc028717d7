//! Engine for the Spatial Arena
//!
//! A spatially iterated Prisoner's Dilemma: agents on a grid play their
//! Moore neighbors every epoch, then imitate the best-scoring strategy
//! around them. This crate is compiled to:
//! - Native (for the `spatial-arena` runner)
//! - WASM (for browser display of a running simulation)

mod agent;
mod config;
mod engine;
mod error;
mod grid;
mod metrics;
mod payoff;
mod random;
mod strategy;

#[cfg(feature = "wasm")]
mod wasm;

pub use agent::{Agent, AgentId, History, Interaction, Position, StrategyHandle, HISTORY_CAPACITY};
pub use config::{Activation, Preset, SimulationConfig, DEFAULT_GAMES_PER_ROUND, DEFAULT_HEIGHT, DEFAULT_SEED, DEFAULT_WIDTH};
pub use engine::{AgentPortrayal, Engine};
pub use error::{ConfigError, EngineError};
pub use grid::{Grid, Topology};
pub use metrics::{MetricsCollector, Snapshot};
pub use payoff::PayoffMatrix;
pub use random::SeededRng;
pub use strategy::{Action, Strategy, StrategyKind, UnknownStrategy};
