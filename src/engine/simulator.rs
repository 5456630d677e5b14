//! Synchronous match simulator — advances a match one round at a time.
//! Used by the arena.

use crate::engine::bot_strategy::BotStrategy;
use crate::engine::models::*;

/// Mutable match state between rounds.
#[derive(Debug, Clone, Default)]
pub struct MatchState {
    pub rounds: Vec<Round>,
    pub p1_wins: usize,
    pub p2_wins: usize,
    pub ties: usize,
}

impl MatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    /// Score a round that has already been chosen by both sides.
    pub fn record(&mut self, p1_move: Move, p2_move: Move) -> Round {
        let outcome = p1_move.outcome_against(p2_move);
        match outcome {
            Outcome::Win => self.p1_wins += 1,
            Outcome::Loss => self.p2_wins += 1,
            Outcome::Tie => self.ties += 1,
        }
        let round = Round { p1_move, p2_move, outcome };
        self.rounds.push(round);
        round
    }

    pub fn finish(self) -> MatchRecord {
        MatchRecord {
            rounds: self.rounds,
            p1_wins: self.p1_wins,
            p2_wins: self.p2_wins,
            ties: self.ties,
        }
    }
}

/// Ask both strategies for a move, each seeing only the other's previous one.
pub fn play_round(
    state: &mut MatchState,
    p1: &mut dyn BotStrategy,
    p2: &mut dyn BotStrategy,
) -> Round {
    let (p1_prev, p2_prev) = match state.last_round() {
        Some(r) => (Some(r.p1_move), Some(r.p2_move)),
        None => (None, None),
    };
    let p1_move = p1.choose_move(p2_prev);
    let p2_move = p2.choose_move(p1_prev);
    state.record(p1_move, p2_move)
}
