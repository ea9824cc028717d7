//! Fixed-size 2-D lattice with Moore adjacency

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, Position};
use crate::error::ConfigError;

/// Edge behaviour of the lattice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Edge cells simply have fewer neighbors
    #[default]
    Bounded,
    /// Opposite edges are adjacent
    Torus,
}

/// Width x height cells, at most one agent per cell
#[derive(Clone, Debug)]
pub struct Grid {
    width: u32,
    height: u32,
    topology: Topology,
    cells: Vec<Option<AgentId>>,
}

/// Number of cells in a `width` x `height` lattice.
///
/// Agent ids are `u32`, so the count must fit in one.
pub(crate) fn checked_cell_count(width: u32, height: u32) -> Result<usize, ConfigError> {
    match width.checked_mul(height) {
        Some(cells) if cells > 0 => Ok(cells as usize),
        _ => Err(ConfigError::InvalidDimensions { width, height }),
    }
}

impl Grid {
    pub fn new(width: u32, height: u32, topology: Topology) -> Result<Self, ConfigError> {
        let cells = checked_cell_count(width, height)?;
        Ok(Self {
            width,
            height,
            topology,
            cells: vec![None; cells],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Row-major cell order; cell `i` holds agent `i` once populated.
    pub fn position_of(&self, index: usize) -> Position {
        let width = self.width as usize;
        Position {
            x: (index % width) as u32,
            y: (index / width) as u32,
        }
    }

    fn index_of(&self, position: Position) -> usize {
        position.y as usize * self.width as usize + position.x as usize
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    /// Put an agent into an empty cell.
    ///
    /// # Panics
    /// If the cell is outside the grid or already occupied.
    pub fn place(&mut self, agent: AgentId, position: Position) {
        assert!(self.contains(position), "{:?} is outside the grid", position);
        let index = self.index_of(position);
        assert!(self.cells[index].is_none(), "cell {:?} is already occupied", position);
        self.cells[index] = Some(agent);
    }

    pub fn agent_at(&self, position: Position) -> Option<AgentId> {
        if !self.contains(position) {
            return None;
        }
        self.cells[self.index_of(position)]
    }

    /// Moore neighborhood of `position`, excluding the cell itself.
    ///
    /// Cells come in a fixed order (column-major offsets from -1 to +1).
    /// On a torus, wrapped cells that coincide are listed once.
    pub fn neighborhood(&self, position: Position) -> Vec<Position> {
        let mut cells = Vec::with_capacity(8);
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let x = position.x as i64 + dx;
                let y = position.y as i64 + dy;
                let cell = match self.topology {
                    Topology::Bounded => {
                        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
                            continue;
                        }
                        Position { x: x as u32, y: y as u32 }
                    }
                    Topology::Torus => Position {
                        x: x.rem_euclid(self.width as i64) as u32,
                        y: y.rem_euclid(self.height as i64) as u32,
                    },
                };
                if cell != position && !cells.contains(&cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }

    /// Agents occupying the Moore neighborhood of `position`
    pub fn neighbors(&self, position: Position) -> Vec<AgentId> {
        self.neighborhood(position)
            .into_iter()
            .filter_map(|cell| self.agent_at(cell))
            .collect()
    }
}
