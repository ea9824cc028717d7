//! Per-epoch aggregate metrics

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::strategy::StrategyKind;

/// Aggregates taken right after an epoch's play phase
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub epoch: u64,
    /// cooperations / all actions played this epoch
    pub cooperation_ratio: f64,
    pub cooperate_count: u64,
    pub defect_count: u64,
    /// Population per strategy during the play phase, zero for extinct kinds
    pub population: BTreeMap<StrategyKind, usize>,
}

impl Snapshot {
    pub fn count(&self, kind: StrategyKind) -> usize {
        self.population.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_actions(&self) -> u64 {
        self.cooperate_count + self.defect_count
    }
}

/// Append-only time series of [`Snapshot`]s, one per epoch
#[derive(Clone, Debug, Default)]
pub struct MetricsCollector {
    snapshots: Vec<Snapshot>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the engine's current epoch counters.
    ///
    /// Must run after the play phase and before the counters reset.
    pub fn sample(&mut self, engine: &Engine) -> Result<&Snapshot, EngineError> {
        let cooperate_count = engine.cooperate_count();
        let defect_count = engine.defect_count();
        let total = cooperate_count + defect_count;
        if total == 0 {
            return Err(EngineError::DegenerateMetric { epoch: engine.epoch() });
        }

        let snapshot = Snapshot {
            epoch: engine.epoch(),
            cooperation_ratio: cooperate_count as f64 / total as f64,
            cooperate_count,
            defect_count,
            population: engine.population_by_kind(),
        };
        debug!(
            epoch = snapshot.epoch,
            cooperation_ratio = snapshot.cooperation_ratio,
            "sampled epoch"
        );

        self.snapshots.push(snapshot);
        Ok(&self.snapshots[self.snapshots.len() - 1])
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn get(&self, epoch: u64) -> Option<&Snapshot> {
        // Epochs are sampled in order without gaps
        self.snapshots
            .get(epoch as usize)
            .filter(|snapshot| snapshot.epoch == epoch)
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Cooperation ratio series for charting
    pub fn cooperation_series(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.cooperation_ratio).collect()
    }

    /// Population series of one strategy for charting
    pub fn population_series(&self, kind: StrategyKind) -> Vec<usize> {
        self.snapshots.iter().map(|s| s.count(kind)).collect()
    }
}
