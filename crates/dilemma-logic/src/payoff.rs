//! Payoff matrix for the Prisoner's Dilemma

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::strategy::Action;

/// Symmetric two-player payoff table.
///
/// Named after the classic entries: `reward` for mutual cooperation,
/// `sucker` for cooperating against a defector, `temptation` for defecting
/// against a cooperator and `punishment` for mutual defection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffMatrix {
    pub reward: u32,
    pub sucker: u32,
    pub temptation: u32,
    pub punishment: u32,
}

impl Default for PayoffMatrix {
    fn default() -> Self {
        Self {
            reward: 6,
            sucker: 0,
            temptation: 10,
            punishment: 1,
        }
    }
}

impl PayoffMatrix {
    /// Build a matrix, rejecting orderings that are not a dilemma.
    pub fn new(reward: u32, sucker: u32, temptation: u32, punishment: u32) -> Result<Self, ConfigError> {
        let matrix = Self { reward, sucker, temptation, punishment };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Check `temptation > reward > punishment >= sucker`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temptation <= self.reward {
            return Err(ConfigError::NotADilemma("temptation must exceed reward"));
        }
        if self.reward <= self.punishment {
            return Err(ConfigError::NotADilemma("reward must exceed punishment"));
        }
        if self.punishment < self.sucker {
            return Err(ConfigError::NotADilemma("sucker payoff must not exceed punishment"));
        }
        Ok(())
    }

    /// Returns (own payoff, opponent payoff)
    pub fn payoff(&self, own: Action, opponent: Action) -> (u32, u32) {
        match (own, opponent) {
            (Action::Cooperate, Action::Cooperate) => (self.reward, self.reward),
            (Action::Cooperate, Action::Defect) => (self.sucker, self.temptation),
            (Action::Defect, Action::Cooperate) => (self.temptation, self.sucker),
            (Action::Defect, Action::Defect) => (self.punishment, self.punishment),
        }
    }

    /// Payoffs at or below this value count as a lost game.
    pub fn loss_threshold(&self) -> u32 {
        self.punishment
    }
}
