//! Strategy definitions and execution

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::{AgentId, History};
use crate::payoff::PayoffMatrix;
use crate::random::SeededRng;

/// A move in the Prisoner's Dilemma
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Cooperate,
    Defect,
}

impl Action {
    pub fn flipped(self) -> Self {
        match self {
            Action::Cooperate => Action::Defect,
            Action::Defect => Action::Cooperate,
        }
    }
}

/// Probability that a Favor* strategy deviates from its favored action.
const DEVIATION_PROBABILITY: f64 = 0.1;

/// Strategy variant, without per-instance state
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Always cooperate, never defect.
    AlwaysCooperate,
    /// Always defect, never cooperate.
    AlwaysDefect,
    /// Coin flip each game.
    FiftyFifty,
    /// Cooperate nine times out of ten.
    FavorCooperate,
    /// Defect nine times out of ten.
    FavorDefect,
    /// Replay the opponent's last move if we just played them. Otherwise cooperate.
    TitForTat,
    /// Win-stay, lose-shift.
    LoseShift,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::AlwaysCooperate,
        StrategyKind::AlwaysDefect,
        StrategyKind::FiftyFifty,
        StrategyKind::FavorCooperate,
        StrategyKind::FavorDefect,
        StrategyKind::TitForTat,
        StrategyKind::LoseShift,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::AlwaysCooperate => "AlwaysCooperate",
            StrategyKind::AlwaysDefect => "AlwaysDefect",
            StrategyKind::FiftyFifty => "FiftyFifty",
            StrategyKind::FavorCooperate => "FavorCooperate",
            StrategyKind::FavorDefect => "FavorDefect",
            StrategyKind::TitForTat => "TitForTat",
            StrategyKind::LoseShift => "LoseShift",
        }
    }

    /// Two-letter code drawn on grid cells
    pub fn abbreviation(self) -> &'static str {
        match self {
            StrategyKind::AlwaysCooperate => "AC",
            StrategyKind::AlwaysDefect => "AD",
            StrategyKind::FiftyFifty => "FF",
            StrategyKind::FavorCooperate => "FC",
            StrategyKind::FavorDefect => "FD",
            StrategyKind::TitForTat => "TT",
            StrategyKind::LoseShift => "LS",
        }
    }

    /// RGB components in [0, 1]
    pub fn color(self) -> [f32; 3] {
        match self {
            StrategyKind::AlwaysCooperate => [0.0, 1.0, 0.0],
            StrategyKind::AlwaysDefect => [1.0, 0.0, 0.0],
            StrategyKind::FiftyFifty => [0.1, 0.1, 1.0],
            StrategyKind::FavorCooperate => [0.0, 0.7, 0.7],
            StrategyKind::FavorDefect => [0.7, 0.0, 0.7],
            StrategyKind::TitForTat => [1.0, 0.6, 0.5],
            StrategyKind::LoseShift => [1.0, 0.6, 0.6],
        }
    }

    /// Color as a CSS `rgb(r,g,b)` string
    pub fn css_color(self) -> String {
        let [r, g, b] = self.color();
        let channel = |c: f32| (c * 255.0).round() as u8;
        format!("rgb({},{},{})", channel(r), channel(g), channel(b))
    }

    pub fn description(self) -> &'static str {
        match self {
            StrategyKind::AlwaysCooperate => "Never defects. Always cooperates.",
            StrategyKind::AlwaysDefect => "Never cooperates. Always defects.",
            StrategyKind::FiftyFifty => "Cooperates or defects with equal chance.",
            StrategyKind::FavorCooperate => "Cooperates 90% of the time.",
            StrategyKind::FavorDefect => "Defects 90% of the time.",
            StrategyKind::TitForTat => "Repeats the opponent's last move when rematched. Starts by cooperating.",
            StrategyKind::LoseShift => "Keeps its move after a good game, switches after a bad one.",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("Unknown strategy: {0}")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    /// Accepts the full name or the two-letter code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s || kind.abbreviation() == s)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// A live strategy instance, including any private state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    AlwaysCooperate,
    AlwaysDefect,
    FiftyFifty,
    FavorCooperate,
    FavorDefect,
    TitForTat,
    LoseShift { cooperating: bool },
}

impl Strategy {
    /// Fresh instance in its initial state
    pub fn new(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::AlwaysCooperate => Strategy::AlwaysCooperate,
            StrategyKind::AlwaysDefect => Strategy::AlwaysDefect,
            StrategyKind::FiftyFifty => Strategy::FiftyFifty,
            StrategyKind::FavorCooperate => Strategy::FavorCooperate,
            StrategyKind::FavorDefect => Strategy::FavorDefect,
            StrategyKind::TitForTat => Strategy::TitForTat,
            StrategyKind::LoseShift => Strategy::LoseShift { cooperating: true },
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::AlwaysCooperate => StrategyKind::AlwaysCooperate,
            Strategy::AlwaysDefect => StrategyKind::AlwaysDefect,
            Strategy::FiftyFifty => StrategyKind::FiftyFifty,
            Strategy::FavorCooperate => StrategyKind::FavorCooperate,
            Strategy::FavorDefect => StrategyKind::FavorDefect,
            Strategy::TitForTat => StrategyKind::TitForTat,
            Strategy::LoseShift { .. } => StrategyKind::LoseShift,
        }
    }

    /// Choose an action against `opponent`.
    ///
    /// # Arguments
    /// * `history` - The deciding agent's own recent games
    /// * `opponent` - Who we are about to play
    /// * `payoffs` - Used by LoseShift to score the previous game
    /// * `rng` - Shared random source
    pub fn decide(
        &mut self,
        history: &History,
        opponent: AgentId,
        payoffs: &PayoffMatrix,
        rng: &mut SeededRng,
    ) -> Action {
        match self {
            Strategy::AlwaysCooperate => Action::Cooperate,
            Strategy::AlwaysDefect => Action::Defect,
            Strategy::FiftyFifty => {
                if rng.next_bool() {
                    Action::Cooperate
                } else {
                    Action::Defect
                }
            }
            Strategy::FavorCooperate => decide_biased(Action::Cooperate, rng),
            Strategy::FavorDefect => decide_biased(Action::Defect, rng),
            Strategy::TitForTat => decide_tit_for_tat(history, opponent),
            Strategy::LoseShift { cooperating } => decide_lose_shift(cooperating, history, payoffs),
        }
    }
}

/// Play `favored` unless the 10% deviation fires
fn decide_biased(favored: Action, rng: &mut SeededRng) -> Action {
    if rng.next_f64() > DEVIATION_PROBABILITY {
        favored
    } else {
        favored.flipped()
    }
}

/// Tit-for-Tat: only remembers the single latest game
fn decide_tit_for_tat(history: &History, opponent: AgentId) -> Action {
    match history.latest() {
        Some(last) if last.opponent == opponent => last.theirs,
        _ => Action::Cooperate,
    }
}

/// LoseShift: flip the standing move after any game scored at or below
/// mutual defection, regardless of who that game was against
fn decide_lose_shift(cooperating: &mut bool, history: &History, payoffs: &PayoffMatrix) -> Action {
    if let Some(last) = history.latest() {
        let (own, _) = payoffs.payoff(last.own, last.theirs);
        if own <= payoffs.loss_threshold() {
            *cooperating = !*cooperating;
        }
    }

    if *cooperating {
        Action::Cooperate
    } else {
        Action::Defect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Interaction;

    fn make_rng() -> SeededRng {
        SeededRng::new(42)
    }

    fn opponent(id: u32) -> AgentId {
        AgentId(id)
    }

    #[test]
    fn test_always_defect() {
        let mut strategy = Strategy::new(StrategyKind::AlwaysDefect);
        let mut rng = make_rng();
        let history = History::new();

        for id in 0..10 {
            let m = strategy.decide(&history, opponent(id), &PayoffMatrix::default(), &mut rng);
            assert_eq!(m, Action::Defect);
        }
    }

    #[test]
    fn test_always_cooperate() {
        let mut strategy = Strategy::new(StrategyKind::AlwaysCooperate);
        let mut rng = make_rng();
        let history = History::new();

        for id in 0..10 {
            let m = strategy.decide(&history, opponent(id), &PayoffMatrix::default(), &mut rng);
            assert_eq!(m, Action::Cooperate);
        }
    }

    #[test]
    fn test_tit_for_tat_first_move() {
        let mut strategy = Strategy::new(StrategyKind::TitForTat);
        let mut rng = make_rng();

        let m = strategy.decide(&History::new(), opponent(1), &PayoffMatrix::default(), &mut rng);
        assert_eq!(m, Action::Cooperate);
    }

    #[test]
    fn test_tit_for_tat_copies_same_opponent() {
        let mut strategy = Strategy::new(StrategyKind::TitForTat);
        let mut rng = make_rng();
        let mut history = History::new();
        history.record(Interaction {
            opponent: opponent(1),
            own: Action::Cooperate,
            theirs: Action::Defect,
        });

        let m = strategy.decide(&history, opponent(1), &PayoffMatrix::default(), &mut rng);
        assert_eq!(m, Action::Defect);
    }

    #[test]
    fn test_tit_for_tat_forgets_other_opponents() {
        let mut strategy = Strategy::new(StrategyKind::TitForTat);
        let mut rng = make_rng();
        let mut history = History::new();
        history.record(Interaction {
            opponent: opponent(1),
            own: Action::Cooperate,
            theirs: Action::Defect,
        });
        // Latest game was against someone else
        history.record(Interaction {
            opponent: opponent(2),
            own: Action::Cooperate,
            theirs: Action::Cooperate,
        });

        let m = strategy.decide(&history, opponent(1), &PayoffMatrix::default(), &mut rng);
        assert_eq!(m, Action::Cooperate);
    }

    #[test]
    fn test_tit_for_tat_vs_always_defect() {
        let mut tft = Strategy::new(StrategyKind::TitForTat);
        let mut ad = Strategy::new(StrategyKind::AlwaysDefect);
        let payoffs = PayoffMatrix::default();
        let mut rng = make_rng();
        let mut tft_history = History::new();
        let mut ad_history = History::new();

        let mut moves = Vec::new();
        for _ in 0..6 {
            let a = tft.decide(&tft_history, opponent(1), &payoffs, &mut rng);
            let b = ad.decide(&ad_history, opponent(0), &payoffs, &mut rng);
            tft_history.record(Interaction { opponent: opponent(1), own: a, theirs: b });
            ad_history.record(Interaction { opponent: opponent(0), own: b, theirs: a });
            moves.push(a);
        }

        assert_eq!(moves[0], Action::Cooperate);
        assert!(moves[1..].iter().all(|m| *m == Action::Defect));
    }

    #[test]
    fn test_lose_shift_trace_vs_always_defect() {
        let mut ls = Strategy::new(StrategyKind::LoseShift);
        let payoffs = PayoffMatrix::default();
        let mut rng = make_rng();
        let mut history = History::new();

        let mut trace = Vec::new();
        for _ in 0..5 {
            let a = ls.decide(&history, opponent(1), &payoffs, &mut rng);
            history.record(Interaction { opponent: opponent(1), own: a, theirs: Action::Defect });
            match ls {
                Strategy::LoseShift { cooperating } => trace.push(cooperating),
                _ => unreachable!(),
            }
        }

        assert_eq!(trace, vec![true, false, true, false, true]);
    }

    #[test]
    fn test_lose_shift_stays_after_win() {
        let mut ls = Strategy::new(StrategyKind::LoseShift);
        let payoffs = PayoffMatrix::default();
        let mut rng = make_rng();
        let mut history = History::new();

        for _ in 0..5 {
            let a = ls.decide(&history, opponent(1), &payoffs, &mut rng);
            assert_eq!(a, Action::Cooperate);
            history.record(Interaction { opponent: opponent(1), own: a, theirs: Action::Cooperate });
        }
        assert_eq!(ls, Strategy::LoseShift { cooperating: true });
    }

    #[test]
    fn test_lose_shift_uses_any_opponent() {
        let mut ls = Strategy::new(StrategyKind::LoseShift);
        let mut rng = make_rng();
        let mut history = History::new();
        history.record(Interaction {
            opponent: opponent(5),
            own: Action::Cooperate,
            theirs: Action::Defect,
        });

        // Lost to 5, so the move against 9 is already flipped
        let m = ls.decide(&history, opponent(9), &PayoffMatrix::default(), &mut rng);
        assert_eq!(m, Action::Defect);
    }

    #[test]
    fn test_favor_cooperate_statistical() {
        let mut strategy = Strategy::new(StrategyKind::FavorCooperate);
        let mut rng = make_rng();
        let history = History::new();
        let payoffs = PayoffMatrix::default();

        let cooperations = (0..10_000)
            .filter(|_| strategy.decide(&history, opponent(1), &payoffs, &mut rng) == Action::Cooperate)
            .count();
        assert!(cooperations > 8_700 && cooperations < 9_300, "{} cooperations", cooperations);
    }

    #[test]
    fn test_favor_defect_statistical() {
        let mut strategy = Strategy::new(StrategyKind::FavorDefect);
        let mut rng = make_rng();
        let history = History::new();
        let payoffs = PayoffMatrix::default();

        let defections = (0..10_000)
            .filter(|_| strategy.decide(&history, opponent(1), &payoffs, &mut rng) == Action::Defect)
            .count();
        assert!(defections > 8_700 && defections < 9_300, "{} defections", defections);
    }

    #[test]
    fn test_fifty_fifty_uses_both_actions() {
        let mut strategy = Strategy::new(StrategyKind::FiftyFifty);
        let mut rng = make_rng();
        let history = History::new();
        let payoffs = PayoffMatrix::default();

        let cooperations = (0..1_000)
            .filter(|_| strategy.decide(&history, opponent(1), &payoffs, &mut rng) == Action::Cooperate)
            .count();
        assert!(cooperations > 400 && cooperations < 600, "{} cooperations", cooperations);
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(Strategy::new(kind).kind(), kind);
            assert_eq!(kind.name().parse::<StrategyKind>(), Ok(kind));
            assert_eq!(kind.abbreviation().parse::<StrategyKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(
            "GrimTrigger".parse::<StrategyKind>(),
            Err(UnknownStrategy("GrimTrigger".to_string()))
        );
    }

    #[test]
    fn test_css_color() {
        assert_eq!(StrategyKind::AlwaysDefect.css_color(), "rgb(255,0,0)");
        assert_eq!(StrategyKind::TitForTat.css_color(), "rgb(255,153,128)");
    }
}
