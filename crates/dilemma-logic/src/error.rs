//! Error types for engine construction and epoch execution

use thiserror::Error;

/// Invalid simulation parameters, reported at construction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Total strategy weight is zero")]
    ZeroTotalWeight,

    #[error("Payoff matrix is not a prisoner's dilemma: {0}")]
    NotADilemma(&'static str),

    #[error("Layout holds {actual} strategies for a grid of {expected} cells")]
    LayoutMismatch { expected: usize, actual: usize },
}

/// Errors surfaced by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("No games were played in epoch {epoch}; cooperation ratio is undefined")]
    DegenerateMetric { epoch: u64 },
}
