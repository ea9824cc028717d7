//! Runner configuration: TOML file plus command-line overrides

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use dilemma_logic::{Preset, SimulationConfig};
use serde::{Deserialize, Serialize};

/// How snapshots are printed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One JSON object per epoch
    #[default]
    Json,
    /// Aligned columns
    Table,
}

/// Starting population presets selectable from the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    Uniform,
    EqualStatics,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Uniform => Preset::Uniform,
            PresetArg::EqualStatics => Preset::EqualStatics,
        }
    }
}

fn default_epochs() -> u64 { 100 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_epochs")]
    pub epochs: u64,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub show_grid: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            format: OutputFormat::default(),
            show_grid: false,
        }
    }
}

/// Contents of an arena TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub epochs: Option<u64>,
    pub seed: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub games_per_round: Option<u32>,
    pub preset: Option<PresetArg>,
    pub format: Option<OutputFormat>,
    pub show_grid: bool,
}

impl ArenaConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        let Overrides {
            epochs,
            seed,
            width,
            height,
            games_per_round,
            preset,
            format,
            show_grid,
        } = overrides;

        if let Some(epochs) = epochs {
            self.run.epochs = epochs;
        }
        if let Some(seed) = seed {
            self.simulation.seed = Some(seed);
        }
        if let Some(width) = width {
            self.simulation.width = width;
        }
        if let Some(height) = height {
            self.simulation.height = height;
        }
        if let Some(games) = games_per_round {
            self.simulation.games_per_round = games;
        }
        if let Some(preset) = preset {
            self.simulation.strategy_weights = Preset::from(preset).weights();
        }
        if let Some(format) = format {
            self.run.format = format;
        }
        self.run.show_grid |= show_grid;
    }
}
