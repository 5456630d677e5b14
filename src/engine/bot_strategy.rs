//! Bot strategy trait and the reference opponents the predictor is measured against.

use std::collections::{HashMap, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::engine::models::*;

/// A strategy picks its move for the coming round given the opponent's
/// previous move (`None` on round one). Instances carry per-match state.
pub trait BotStrategy: Send {
    fn name(&self) -> &str;

    fn choose_move(&mut self, opponent_last: Option<Move>) -> Move;
}

/// Builds a fresh strategy for one match from that match's seed.
pub type StrategyFactory = Box<dyn Fn(u64) -> Box<dyn BotStrategy> + Send + Sync>;

pub fn factory<F>(build: F) -> StrategyFactory
where
    F: Fn(u64) -> Box<dyn BotStrategy> + Send + Sync + 'static,
{
    Box::new(build)
}

/// Most frequent move in `moves`; ties go to the earliest of R, P, S.
fn most_frequent<'a>(moves: impl Iterator<Item = &'a Move>) -> Option<Move> {
    let mut counts: HashMap<Move, usize> = HashMap::new();
    for m in moves {
        *counts.entry(*m).or_insert(0) += 1;
    }
    let mut best: Option<(Move, usize)> = None;
    for m in Move::ALL {
        let n = counts.get(&m).copied().unwrap_or(0);
        if n > 0 && best.map_or(true, |(_, b)| n > b) {
            best = Some((m, n));
        }
    }
    best.map(|(m, _)| m)
}

/// Picks uniformly at random from a seeded RNG.
pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl BotStrategy for RandomStrategy {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_move(&mut self, _opponent_last: Option<Move>) -> Move {
        *Move::ALL.choose(&mut self.rng).unwrap_or(&Move::Rock)
    }
}

/// Loops over a fixed pattern and ignores the opponent entirely.
#[derive(Debug, Clone)]
pub struct CycleStrategy {
    pattern: Vec<Move>,
    position: usize,
}

impl CycleStrategy {
    /// Returns `None` for an empty pattern.
    pub fn new(pattern: Vec<Move>) -> Option<Self> {
        if pattern.is_empty() {
            return None;
        }
        Some(Self { pattern, position: 0 })
    }
}

impl BotStrategy for CycleStrategy {
    fn name(&self) -> &str {
        "cycle"
    }

    fn choose_move(&mut self, _opponent_last: Option<Move>) -> Move {
        let m = self.pattern[self.position % self.pattern.len()];
        self.position += 1;
        m
    }
}

/// Plays whatever beats the opponent's previous move.
#[derive(Default)]
pub struct CounterLastStrategy;

impl BotStrategy for CounterLastStrategy {
    fn name(&self) -> &str {
        "counter_last"
    }

    fn choose_move(&mut self, opponent_last: Option<Move>) -> Move {
        opponent_last.unwrap_or(Move::Rock).counter()
    }
}

/// Assumed opponent move before anything has been observed.
pub const FREQUENCY_FALLBACK: Move = Move::Scissors;
pub const DEFAULT_LOOKBACK: usize = 10;

/// Counters the opponent's most frequent move over a sliding lookback.
pub struct FrequencyStrategy {
    lookback: usize,
    recent: VecDeque<Move>,
}

impl FrequencyStrategy {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback: lookback.max(1),
            // Grows on demand; the lookback can come from a profile file.
            recent: VecDeque::new(),
        }
    }
}

impl Default for FrequencyStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK)
    }
}

impl BotStrategy for FrequencyStrategy {
    fn name(&self) -> &str {
        "frequency"
    }

    fn choose_move(&mut self, opponent_last: Option<Move>) -> Move {
        if let Some(m) = opponent_last {
            if self.recent.len() == self.lookback {
                self.recent.pop_front();
            }
            self.recent.push_back(m);
        }
        most_frequent(self.recent.iter())
            .unwrap_or(FREQUENCY_FALLBACK)
            .counter()
    }
}

/// First-order transition model over the opponent's consecutive moves.
#[derive(Default)]
pub struct PairMarkovStrategy {
    transitions: HashMap<(Move, Move), u32>,
    last: Option<Move>,
}

impl PairMarkovStrategy {
    fn predict_after(&self, last: Move) -> Move {
        let mut best: Option<(Move, u32)> = None;
        for next in Move::ALL {
            if let Some(&n) = self.transitions.get(&(last, next)) {
                if best.map_or(true, |(_, b)| n > b) {
                    best = Some((next, n));
                }
            }
        }
        // Unseen context: assume the opponent repeats itself.
        best.map_or(last, |(m, _)| m)
    }
}

impl BotStrategy for PairMarkovStrategy {
    fn name(&self) -> &str {
        "pair_markov"
    }

    fn choose_move(&mut self, opponent_last: Option<Move>) -> Move {
        if let Some(current) = opponent_last {
            if let Some(prev) = self.last {
                *self.transitions.entry((prev, current)).or_insert(0) += 1;
            }
            self.last = Some(current);
        }
        self.predict_after(self.last.unwrap_or(Move::Rock)).counter()
    }
}
