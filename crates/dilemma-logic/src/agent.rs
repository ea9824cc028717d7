//! Agents and their bounded game history

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::strategy::Action;

/// Number of past games an agent remembers
pub const HISTORY_CAPACITY: usize = 3;

/// Stable agent identity; also the agent's index in the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Grid cell coordinates, `x` in [0, width), `y` in [0, height)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

/// Handle into the engine's strategy instance table.
///
/// Several agents hold the same handle after imitation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StrategyHandle(pub(crate) usize);

/// One completed game, seen from the recording agent's side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub opponent: AgentId,
    pub own: Action,
    pub theirs: Action,
}

/// Most-recent-first ring of the last [`HISTORY_CAPACITY`] games
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct History {
    entries: VecDeque<Interaction>,
}

impl History {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Push a game to the front, evicting the oldest when full
    pub fn record(&mut self, interaction: Interaction) {
        if self.entries.len() == HISTORY_CAPACITY {
            self.entries.pop_back();
        }
        self.entries.push_front(interaction);
    }

    pub fn latest(&self) -> Option<&Interaction> {
        self.entries.front()
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &Interaction> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A grid-bound player. Only the engine mutates agents.
#[derive(Clone, Debug)]
pub struct Agent {
    pub(crate) id: AgentId,
    pub(crate) position: Position,
    pub(crate) strategy: StrategyHandle,
    pub(crate) history: History,
    pub(crate) epoch_score: u64,
}

impl Agent {
    pub(crate) fn new(id: AgentId, position: Position, strategy: StrategyHandle) -> Self {
        Self {
            id,
            position,
            strategy,
            history: History::new(),
            epoch_score: 0,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn strategy(&self) -> StrategyHandle {
        self.strategy
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Payoff accumulated in the current play phase
    pub fn epoch_score(&self) -> u64 {
        self.epoch_score
    }
}
