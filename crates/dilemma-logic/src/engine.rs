//! Epoch engine: play phase, learn phase and metric sampling

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace};

use crate::agent::{Agent, AgentId, Interaction, Position, StrategyHandle};
use crate::config::{Activation, SimulationConfig};
use crate::error::{ConfigError, EngineError};
use crate::grid::Grid;
use crate::metrics::{MetricsCollector, Snapshot};
use crate::payoff::PayoffMatrix;
use crate::random::SeededRng;
use crate::strategy::{Action, Strategy, StrategyKind};

/// Per-agent visual attributes for a display layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentPortrayal {
    pub id: AgentId,
    pub position: Position,
    pub strategy: StrategyKind,
    pub name: String,
    pub color: String,
    pub abbreviation: String,
}

/// The whole simulation: grid, agents, strategy instances and counters.
///
/// Strategy instances live in a table owned by the engine. Agents hold
/// handles into it, so imitation shares the neighbor's instance (and any
/// state it carries) instead of starting a fresh one.
#[derive(Clone, Debug)]
pub struct Engine {
    grid: Grid,
    agents: Vec<Agent>,
    neighbors: Vec<Vec<AgentId>>,
    strategies: Vec<Strategy>,
    payoffs: PayoffMatrix,
    games_per_round: u32,
    activation: Activation,
    rng: SeededRng,
    cooperate_count: u64,
    defect_count: u64,
    in_play_phase: bool,
    epoch: u64,
    population: BTreeMap<StrategyKind, usize>,
    metrics: MetricsCollector,
}

impl Engine {
    /// Build a population by weighted random draw per cell.
    pub fn new(config: SimulationConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let mut rng = SeededRng::new(config.seed_or_default());
        let (kinds, weights): (Vec<StrategyKind>, Vec<u32>) =
            config.resolved_weights().into_iter().unzip();

        let cells = config.cell_count()?;
        let mut layout = Vec::with_capacity(cells);
        for _ in 0..cells {
            let index = rng.weighted_index(&weights).ok_or(ConfigError::ZeroTotalWeight)?;
            layout.push(kinds[index]);
        }

        Self::build(&config, layout, rng)
    }

    /// Build a population from explicit strategies in row-major cell order.
    ///
    /// Weights in `config` are ignored.
    pub fn from_layout(config: SimulationConfig, layout: Vec<StrategyKind>) -> Result<Self, EngineError> {
        config.validate_shape()?;
        let cells = config.cell_count()?;
        if layout.len() != cells {
            return Err(ConfigError::LayoutMismatch {
                expected: cells,
                actual: layout.len(),
            }
            .into());
        }

        let rng = SeededRng::new(config.seed_or_default());
        Self::build(&config, layout, rng)
    }

    fn build(config: &SimulationConfig, layout: Vec<StrategyKind>, rng: SeededRng) -> Result<Self, EngineError> {
        let mut grid = Grid::new(config.width, config.height, config.topology)?;
        let mut agents = Vec::with_capacity(layout.len());
        let mut strategies = Vec::with_capacity(layout.len());

        for (index, kind) in layout.into_iter().enumerate() {
            let id = AgentId(index as u32);
            let position = grid.position_of(index);
            grid.place(id, position);
            strategies.push(Strategy::new(kind));
            agents.push(Agent::new(id, position, StrategyHandle(index)));
        }

        let neighbors = agents
            .iter()
            .map(|agent| grid.neighbors(agent.position))
            .collect();

        let mut engine = Self {
            grid,
            agents,
            neighbors,
            strategies,
            payoffs: config.payoffs,
            games_per_round: config.games_per_round,
            activation: config.activation,
            rng,
            cooperate_count: 0,
            defect_count: 0,
            in_play_phase: true,
            epoch: 0,
            population: BTreeMap::new(),
            metrics: MetricsCollector::new(),
        };
        engine.population = engine.population_by_kind();

        info!(
            width = config.width,
            height = config.height,
            agents = engine.agents.len(),
            games_per_round = config.games_per_round,
            seed = config.seed_or_default(),
            "engine initialized"
        );
        Ok(engine)
    }

    /// Run one full epoch: play, sample, reset counters, learn.
    ///
    /// Fails without advancing when no game could be played.
    #[instrument(level = "debug", skip(self), fields(epoch = self.epoch))]
    pub fn advance_epoch(&mut self) -> Result<(), EngineError> {
        self.play_phase();

        let mut metrics = std::mem::take(&mut self.metrics);
        let sampled = metrics.sample(self).map(|_| ());
        self.metrics = metrics;
        sampled?;

        self.cooperate_count = 0;
        self.defect_count = 0;

        self.learn_phase();
        self.population = self.population_by_kind();
        self.epoch += 1;
        Ok(())
    }

    /// Every agent plays every neighbor `games_per_round` times.
    ///
    /// Pairs are visited from both sides, so each adjacent pair plays
    /// `2 * games_per_round` games per phase.
    pub(crate) fn play_phase(&mut self) {
        self.in_play_phase = true;

        let mut order: Vec<usize> = (0..self.agents.len()).collect();
        if self.activation == Activation::Random {
            self.rng.shuffle(&mut order);
        }

        for a in order {
            for slot in 0..self.neighbors[a].len() {
                let b = self.neighbors[a][slot].index();
                for _ in 0..self.games_per_round {
                    self.play_game(a, b);
                }
            }
        }
    }

    fn play_game(&mut self, a: usize, b: usize) {
        let id_a = self.agents[a].id;
        let id_b = self.agents[b].id;
        let handle_a = self.agents[a].strategy.0;
        let handle_b = self.agents[b].strategy.0;

        // Both sides decide before either history is touched
        let action_a = self.strategies[handle_a].decide(&self.agents[a].history, id_b, &self.payoffs, &mut self.rng);
        let action_b = self.strategies[handle_b].decide(&self.agents[b].history, id_a, &self.payoffs, &mut self.rng);

        self.tally(action_a);
        self.tally(action_b);

        let (payoff_a, payoff_b) = self.payoffs.payoff(action_a, action_b);
        self.agents[a].epoch_score += payoff_a as u64;
        self.agents[b].epoch_score += payoff_b as u64;

        self.agents[a].history.record(Interaction {
            opponent: id_b,
            own: action_a,
            theirs: action_b,
        });
        self.agents[b].history.record(Interaction {
            opponent: id_a,
            own: action_b,
            theirs: action_a,
        });
    }

    fn tally(&mut self, action: Action) {
        match action {
            Action::Cooperate => self.cooperate_count += 1,
            Action::Defect => self.defect_count += 1,
        }
    }

    /// Every agent adopts the strategy of the best scorer among itself and
    /// its neighbors, then all scores reset.
    ///
    /// Choices are made against one score snapshot and applied together.
    pub(crate) fn learn_phase(&mut self) {
        self.in_play_phase = false;

        let adopted: Vec<StrategyHandle> = (0..self.agents.len())
            .map(|a| self.best_strategy(a))
            .collect();

        for (agent, handle) in self.agents.iter_mut().zip(adopted) {
            if agent.strategy != handle {
                trace!(
                    agent = %agent.id,
                    from = %self.strategies[agent.strategy.0].kind(),
                    to = %self.strategies[handle.0].kind(),
                    "adopting neighbor strategy"
                );
                agent.strategy = handle;
            }
            agent.epoch_score = 0;
        }
    }

    /// Ties keep the current strategy; a neighbor must strictly beat the best so far.
    fn best_strategy(&self, a: usize) -> StrategyHandle {
        let agent = &self.agents[a];
        let mut best = agent.strategy;
        let mut best_score = agent.epoch_score;

        for id in &self.neighbors[a] {
            let neighbor = &self.agents[id.index()];
            if neighbor.epoch_score > best_score {
                best_score = neighbor.epoch_score;
                best = neighbor.strategy;
            }
        }
        best
    }

    /// Fresh count of agents per strategy, every catalog kind present
    pub fn population_by_kind(&self) -> BTreeMap<StrategyKind, usize> {
        let mut counts: BTreeMap<StrategyKind, usize> =
            StrategyKind::ALL.into_iter().map(|kind| (kind, 0)).collect();
        for agent in &self.agents {
            *counts.entry(self.strategies[agent.strategy.0].kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Population after the latest learn phase
    pub fn population(&self) -> &BTreeMap<StrategyKind, usize> {
        &self.population
    }

    /// Population after the latest learn phase, keyed by strategy name
    pub fn population_by_name(&self) -> BTreeMap<&'static str, usize> {
        self.population
            .iter()
            .map(|(kind, count)| (kind.name(), *count))
            .collect()
    }

    pub fn portrayals(&self) -> Vec<AgentPortrayal> {
        self.agents
            .iter()
            .map(|agent| {
                let kind = self.strategies[agent.strategy.0].kind();
                AgentPortrayal {
                    id: agent.id,
                    position: agent.position,
                    strategy: kind,
                    name: kind.name().to_string(),
                    color: kind.css_color(),
                    abbreviation: kind.abbreviation().to_string(),
                }
            })
            .collect()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    /// The strategy instance the agent currently plays
    pub fn strategy_of(&self, id: AgentId) -> Option<&Strategy> {
        self.agent(id).map(|agent| &self.strategies[agent.strategy.0])
    }

    pub fn kind_of(&self, id: AgentId) -> Option<StrategyKind> {
        self.strategy_of(id).map(Strategy::kind)
    }

    pub fn neighbors(&self, id: AgentId) -> &[AgentId] {
        self.neighbors.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of (agent, neighbor) pairs visited in one play phase
    pub fn ordered_neighbor_pairs(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    pub fn payoffs(&self) -> &PayoffMatrix {
        &self.payoffs
    }

    pub fn games_per_round(&self) -> u32 {
        self.games_per_round
    }

    /// Index of the epoch in progress (number of completed epochs)
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_play_phase(&self) -> bool {
        self.in_play_phase
    }

    /// Cooperations in the current epoch's play phase
    pub fn cooperate_count(&self) -> u64 {
        self.cooperate_count
    }

    /// Defections in the current epoch's play phase
    pub fn defect_count(&self) -> u64 {
        self.defect_count
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        self.metrics.snapshots()
    }

    pub fn latest_snapshot(&self) -> Option<&Snapshot> {
        self.metrics.latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Topology;
    use crate::strategy::Strategy;
    use proptest::prelude::{any, prop_assert, prop_assert_eq, prop_assume, proptest};

    fn layout_engine(kinds: Vec<StrategyKind>, width: u32, height: u32, games: u32) -> Engine {
        let config = SimulationConfig::new(width, height)
            .with_games_per_round(games)
            .with_seed(7);
        Engine::from_layout(config, kinds).unwrap()
    }

    fn kinds(engine: &Engine) -> Vec<StrategyKind> {
        engine
            .agents()
            .iter()
            .map(|agent| engine.kind_of(agent.id()).unwrap())
            .collect()
    }

    #[test]
    fn test_population_matches_cells() {
        let engine = Engine::new(SimulationConfig::new(6, 4).with_seed(3)).unwrap();
        assert_eq!(engine.agents().len(), 24);
        assert_eq!(engine.population().values().sum::<usize>(), 24);
        for (index, agent) in engine.agents().iter().enumerate() {
            assert_eq!(agent.id(), AgentId(index as u32));
            assert_eq!(engine.grid().agent_at(agent.position()), Some(agent.id()));
        }
    }

    #[test]
    fn test_only_weighted_kinds_appear() {
        let config = SimulationConfig::new(10, 10)
            .with_weights([(StrategyKind::TitForTat, 3), (StrategyKind::AlwaysDefect, 0)])
            .with_seed(1);
        let engine = Engine::new(config).unwrap();
        assert_eq!(engine.population()[&StrategyKind::TitForTat], 100);
        assert_eq!(engine.population()[&StrategyKind::AlwaysDefect], 0);
    }

    #[test]
    fn test_construction_errors() {
        let zero = SimulationConfig::new(3, 3).with_weights([(StrategyKind::AlwaysDefect, 0)]);
        assert_eq!(
            Engine::new(zero).unwrap_err(),
            EngineError::Config(ConfigError::ZeroTotalWeight)
        );

        let flat = SimulationConfig::new(3, 0);
        assert_eq!(
            Engine::new(flat).unwrap_err(),
            EngineError::Config(ConfigError::InvalidDimensions { width: 3, height: 0 })
        );

        let short = Engine::from_layout(SimulationConfig::new(2, 2), vec![StrategyKind::TitForTat; 3]);
        assert_eq!(
            short.unwrap_err(),
            EngineError::Config(ConfigError::LayoutMismatch { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn test_phase_flag() {
        let mut engine = layout_engine(vec![StrategyKind::AlwaysCooperate; 4], 2, 2, 1);
        engine.play_phase();
        assert!(engine.is_play_phase());
        engine.learn_phase();
        assert!(!engine.is_play_phase());
        engine.advance_epoch().unwrap();
        assert!(!engine.is_play_phase());
    }

    #[test]
    fn test_counters_reset_after_epoch() {
        let mut engine = layout_engine(vec![StrategyKind::FiftyFifty; 9], 3, 3, 2);
        engine.advance_epoch().unwrap();
        assert_eq!(engine.cooperate_count(), 0);
        assert_eq!(engine.defect_count(), 0);
        assert!(engine.agents().iter().all(|a| a.epoch_score() == 0));
        assert_eq!(engine.epoch(), 1);
    }

    #[test]
    fn test_two_agent_play_scores() {
        let mut engine = layout_engine(
            vec![StrategyKind::AlwaysDefect, StrategyKind::AlwaysCooperate],
            2,
            1,
            1,
        );
        engine.play_phase();

        // Visited from both sides: two games, temptation vs sucker each time
        assert_eq!(engine.agents()[0].epoch_score(), 20);
        assert_eq!(engine.agents()[1].epoch_score(), 0);
        assert_eq!(engine.agents()[0].history().len(), 2);

        engine.learn_phase();
        assert_eq!(kinds(&engine), vec![StrategyKind::AlwaysDefect; 2]);
    }

    #[test]
    fn test_tie_keeps_own_strategy() {
        let mut engine = layout_engine(
            vec![StrategyKind::AlwaysCooperate, StrategyKind::TitForTat],
            2,
            1,
            1,
        );
        engine.play_phase();
        assert_eq!(engine.agents()[0].epoch_score(), 12);
        assert_eq!(engine.agents()[1].epoch_score(), 12);

        engine.learn_phase();
        assert_eq!(engine.agents()[0].strategy(), StrategyHandle(0));
        assert_eq!(engine.agents()[1].strategy(), StrategyHandle(1));
    }

    #[test]
    fn test_history_records_both_sides() {
        let mut engine = layout_engine(
            vec![StrategyKind::AlwaysDefect, StrategyKind::AlwaysCooperate],
            2,
            1,
            1,
        );
        engine.play_phase();

        let latest = engine.agents()[1].history().latest().copied().unwrap();
        assert_eq!(
            latest,
            Interaction {
                opponent: AgentId(0),
                own: Action::Cooperate,
                theirs: Action::Defect,
            }
        );
    }

    #[test]
    fn test_learn_reads_pre_update_scores() {
        // AD(0) AC(1) AC(2): agent 1 must still see agent 0's 20 points even
        // though agent 0 is processed first
        let mut engine = layout_engine(
            vec![
                StrategyKind::AlwaysDefect,
                StrategyKind::AlwaysCooperate,
                StrategyKind::AlwaysCooperate,
            ],
            3,
            1,
            1,
        );
        engine.play_phase();
        let scores: Vec<u64> = engine.agents().iter().map(Agent::epoch_score).collect();
        assert_eq!(scores, vec![20, 12, 12]);

        engine.learn_phase();
        assert_eq!(
            kinds(&engine),
            vec![
                StrategyKind::AlwaysDefect,
                StrategyKind::AlwaysDefect,
                StrategyKind::AlwaysCooperate,
            ]
        );
    }

    #[test]
    fn test_imitation_shares_instance() {
        let mut engine = layout_engine(
            vec![StrategyKind::AlwaysDefect, StrategyKind::AlwaysCooperate],
            2,
            1,
            1,
        );
        engine.advance_epoch().unwrap();
        assert_eq!(engine.agents()[0].strategy(), engine.agents()[1].strategy());
    }

    #[test]
    fn test_winning_lose_shift_instance_spreads() {
        // AD(0) LS(1) AC(2), fixed order: LS loses to AD, shifts, then
        // cooperates with AC and ends on 13 against 11 and 12
        let config = SimulationConfig::new(3, 1)
            .with_games_per_round(1)
            .with_activation(Activation::Sequential)
            .with_seed(7);
        let mut engine = Engine::from_layout(
            config,
            vec![
                StrategyKind::AlwaysDefect,
                StrategyKind::LoseShift,
                StrategyKind::AlwaysCooperate,
            ],
        )
        .unwrap();

        engine.play_phase();
        let scores: Vec<u64> = engine.agents().iter().map(Agent::epoch_score).collect();
        assert_eq!(scores, vec![11, 13, 12]);

        engine.learn_phase();
        let shared = engine.agents()[1].strategy();
        assert!(engine.agents().iter().all(|agent| agent.strategy() == shared));
        assert_eq!(
            engine.strategy_of(AgentId(0)),
            Some(&Strategy::LoseShift { cooperating: true })
        );
    }

    #[test]
    fn test_sequential_runs_are_identical_without_randomness() {
        let config = SimulationConfig::new(3, 3)
            .with_games_per_round(2)
            .with_activation(Activation::Sequential);
        let layout = vec![
            StrategyKind::TitForTat,
            StrategyKind::AlwaysDefect,
            StrategyKind::LoseShift,
            StrategyKind::AlwaysCooperate,
            StrategyKind::TitForTat,
            StrategyKind::LoseShift,
            StrategyKind::AlwaysDefect,
            StrategyKind::AlwaysCooperate,
            StrategyKind::TitForTat,
        ];
        let mut a = Engine::from_layout(config.clone().with_seed(1), layout.clone()).unwrap();
        let mut b = Engine::from_layout(config.with_seed(2), layout).unwrap();
        for _ in 0..5 {
            a.advance_epoch().unwrap();
            b.advance_epoch().unwrap();
        }
        assert_eq!(a.snapshots(), b.snapshots());
    }

    #[test]
    fn test_torus_engine_counts() {
        let config = SimulationConfig::new(4, 4)
            .with_topology(Topology::Torus)
            .with_games_per_round(1)
            .with_seed(2);
        let mut engine = Engine::from_layout(config, vec![StrategyKind::AlwaysCooperate; 16]).unwrap();
        assert_eq!(engine.ordered_neighbor_pairs(), 16 * 8);
        engine.advance_epoch().unwrap();
        assert_eq!(engine.latest_snapshot().unwrap().total_actions(), 2 * 16 * 8);
    }

    #[test]
    fn test_portrayals() {
        let engine = layout_engine(
            vec![StrategyKind::AlwaysDefect, StrategyKind::TitForTat],
            2,
            1,
            1,
        );
        let portrayals = engine.portrayals();
        assert_eq!(portrayals.len(), 2);
        assert_eq!(portrayals[1].position, Position { x: 1, y: 0 });
        assert_eq!(portrayals[1].name, "TitForTat");
        assert_eq!(portrayals[1].abbreviation, "TT");
        assert_eq!(portrayals[0].color, "rgb(255,0,0)");
    }

    proptest! {
        #[test]
        fn prop_action_count_matches_pairs(
            width in 1u32..6,
            height in 1u32..6,
            games in 1u32..4,
            seed in any::<u64>(),
        ) {
            prop_assume!(width * height > 1);
            let config = SimulationConfig::new(width, height)
                .with_games_per_round(games)
                .with_weights(StrategyKind::ALL.map(|kind| (kind, 1)))
                .with_seed(seed);
            let mut engine = Engine::new(config).unwrap();
            let pairs = engine.ordered_neighbor_pairs() as u64;

            for _ in 0..3 {
                engine.advance_epoch().unwrap();
                let snapshot = engine.latest_snapshot().unwrap();
                prop_assert_eq!(snapshot.total_actions(), 2 * games as u64 * pairs);
                prop_assert!((0.0..=1.0).contains(&snapshot.cooperation_ratio));
            }
        }

        #[test]
        fn prop_same_seed_same_run(seed in any::<u64>()) {
            let config = SimulationConfig::new(5, 4)
                .with_games_per_round(3)
                .with_weights(StrategyKind::ALL.map(|kind| (kind, 1)))
                .with_seed(seed);
            let mut a = Engine::new(config.clone()).unwrap();
            let mut b = Engine::new(config).unwrap();
            for _ in 0..4 {
                a.advance_epoch().unwrap();
                b.advance_epoch().unwrap();
            }
            prop_assert_eq!(a.snapshots(), b.snapshots());
            prop_assert_eq!(a.portrayals(), b.portrayals());
        }

        #[test]
        fn prop_uniform_population_never_changes(
            kind in proptest::sample::select(StrategyKind::ALL.to_vec()),
            seed in any::<u64>(),
        ) {
            let config = SimulationConfig::new(4, 3).with_games_per_round(2).with_seed(seed);
            let mut engine = Engine::from_layout(config, vec![kind; 12]).unwrap();
            engine.advance_epoch().unwrap();
            prop_assert_eq!(engine.population()[&kind], 12);
        }
    }
}
