//! Simulation parameters

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::grid::{checked_cell_count, Topology};
use crate::payoff::PayoffMatrix;
use crate::strategy::StrategyKind;

/// Games each neighbor pair plays per visit unless configured otherwise
pub const DEFAULT_GAMES_PER_ROUND: u32 = 10;

/// Seed used when none is configured
pub const DEFAULT_SEED: u64 = 0;

/// Default visual grid
pub const DEFAULT_WIDTH: u32 = 30;
pub const DEFAULT_HEIGHT: u32 = 20;

/// Order in which agents take their play-phase turns
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Fresh seeded shuffle every play phase
    #[default]
    Random,
    /// Ascending agent id
    Sequential,
}

/// Named starting populations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Weight 1 for every slider strategy
    Uniform,
    /// Mostly reactive strategies with a few unconditional ones
    EqualStatics,
}

impl Preset {
    pub fn weights(self) -> BTreeMap<String, u32> {
        let pairs: &[(StrategyKind, u32)] = match self {
            Preset::Uniform => &[
                (StrategyKind::AlwaysCooperate, 1),
                (StrategyKind::AlwaysDefect, 1),
                (StrategyKind::FavorCooperate, 1),
                (StrategyKind::FavorDefect, 1),
                (StrategyKind::TitForTat, 1),
                (StrategyKind::LoseShift, 1),
            ],
            Preset::EqualStatics => &[
                (StrategyKind::AlwaysCooperate, 1),
                (StrategyKind::AlwaysDefect, 1),
                (StrategyKind::LoseShift, 5),
                (StrategyKind::TitForTat, 5),
            ],
        };
        pairs
            .iter()
            .map(|(kind, weight)| (kind.name().to_string(), *weight))
            .collect()
    }
}

/// Everything needed to build an [`Engine`](crate::Engine)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub width: u32,
    pub height: u32,
    pub games_per_round: u32,
    /// Strategy name (or two-letter code) to relative weight
    pub strategy_weights: BTreeMap<String, u32>,
    pub seed: Option<u64>,
    pub payoffs: PayoffMatrix,
    pub topology: Topology,
    pub activation: Activation,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            games_per_round: DEFAULT_GAMES_PER_ROUND,
            strategy_weights: Preset::Uniform.weights(),
            seed: None,
            payoffs: PayoffMatrix::default(),
            topology: Topology::default(),
            activation: Activation::default(),
        }
    }
}

impl SimulationConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_games_per_round(mut self, games_per_round: u32) -> Self {
        self.games_per_round = games_per_round;
        self
    }

    pub fn with_weight(mut self, kind: StrategyKind, weight: u32) -> Self {
        self.strategy_weights.insert(kind.name().to_string(), weight);
        self
    }

    /// Replace all weights at once
    pub fn with_weights<I>(mut self, weights: I) -> Self
    where
        I: IntoIterator<Item = (StrategyKind, u32)>,
    {
        self.strategy_weights = weights
            .into_iter()
            .map(|(kind, weight)| (kind.name().to_string(), weight))
            .collect();
        self
    }

    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.strategy_weights = preset.weights();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_payoffs(mut self, payoffs: PayoffMatrix) -> Self {
        self.payoffs = payoffs;
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Resolved (kind, weight) pairs in catalog order.
    ///
    /// Unknown names are skipped with a warning; zero weights are dropped.
    pub fn resolved_weights(&self) -> Vec<(StrategyKind, u32)> {
        let mut resolved: BTreeMap<StrategyKind, u32> = BTreeMap::new();
        for (name, &weight) in &self.strategy_weights {
            match name.parse::<StrategyKind>() {
                Ok(kind) => *resolved.entry(kind).or_insert(0) += weight,
                Err(err) => warn!(name = %name, "ignoring strategy weight: {}", err),
            }
        }
        resolved.into_iter().filter(|(_, weight)| *weight > 0).collect()
    }

    /// Checks shared by every construction path
    pub fn validate_shape(&self) -> Result<(), ConfigError> {
        self.cell_count()?;
        self.payoffs.validate()
    }

    /// Full validation for weighted random populations
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_shape()?;
        if self.resolved_weights().is_empty() {
            return Err(ConfigError::ZeroTotalWeight);
        }
        Ok(())
    }

    pub fn seed_or_default(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    pub fn cell_count(&self) -> Result<usize, ConfigError> {
        checked_cell_count(self.width, self.height)
    }
}
