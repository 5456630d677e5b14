//! Sequence-frequency predictor.
//!
//! Every call records the opponent's most recent window of `WINDOW_LEN` moves.
//! To predict the next move, the last `CONTEXT_LEN` moves are extended by each
//! of R, P, S and the extension seen most often so far wins the vote. The
//! returned move is the counter of that prediction.

use std::collections::HashMap;

use crate::engine::bot_strategy::BotStrategy;
use crate::engine::models::*;

/// Number of trailing opponent moves used as context for a prediction.
pub const CONTEXT_LEN: usize = 4;
/// Length of a recorded window: context plus the move that followed it.
pub const WINDOW_LEN: usize = CONTEXT_LEN + 1;
/// Stand-in for the opponent's move on round one, when none exists yet.
pub const OPENING_SEED: Move = Move::Rock;
/// Prediction used until a candidate window has been observed.
pub const DEFAULT_PREDICTION: Move = Move::Paper;

/// Predictor tuning knobs. The defaults are the constants above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictorParams {
    pub context_len: usize,
    pub opening_seed: Move,
    pub default_prediction: Move,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            context_len: CONTEXT_LEN,
            opening_seed: OPENING_SEED,
            default_prediction: DEFAULT_PREDICTION,
        }
    }
}

impl PredictorParams {
    pub fn window_len(&self) -> usize {
        self.context_len + 1
    }
}

/// Per-match predictor state. Build one per match; never share across matches.
#[derive(Debug, Clone)]
pub struct Predictor {
    params: PredictorParams,
    history: Vec<Move>,
    sequence_counts: HashMap<Vec<Move>, u32>,
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new()
    }
}

impl Predictor {
    pub fn new() -> Self {
        Self::with_params(PredictorParams::default())
    }

    pub fn with_params(params: PredictorParams) -> Self {
        Self {
            params,
            history: Vec::new(),
            sequence_counts: HashMap::new(),
        }
    }

    pub fn params(&self) -> &PredictorParams {
        &self.params
    }

    /// Record the opponent's previous move (`None` on round one) and return
    /// the move that counters the predicted next one.
    pub fn next_move(&mut self, previous_opponent_move: Option<Move>) -> Move {
        let observed = previous_opponent_move.unwrap_or(self.params.opening_seed);
        self.history.push(observed);

        let window_len = self.params.window_len();
        if self.history.len() >= window_len {
            let window = self.history[self.history.len() - window_len..].to_vec();
            *self.sequence_counts.entry(window).or_insert(0) += 1;
        }

        let predicted = self.prediction();
        let response = predicted.counter();
        tracing::debug!(
            round = self.history.len(),
            observed = %observed,
            predicted = %predicted,
            response = %response,
            "predictor move"
        );
        response
    }

    /// Code-level entry point: `""` opens the match, otherwise one of `R`, `P`, `S`.
    pub fn next_move_code(&mut self, previous_opponent_code: &str) -> Result<Move, MoveError> {
        let previous = if previous_opponent_code.is_empty() {
            None
        } else {
            Some(previous_opponent_code.parse::<Move>()?)
        };
        Ok(self.next_move(previous))
    }

    /// The opponent move the current state predicts, without recording anything.
    pub fn prediction(&self) -> Move {
        let context_len = self.params.context_len;
        if self.history.len() < self.params.window_len() {
            return self.params.default_prediction;
        }

        let mut candidate = self.history[self.history.len() - context_len..].to_vec();
        candidate.push(self.params.default_prediction);

        let mut best: Option<(Move, u32)> = None;
        for next in Move::ALL {
            candidate[context_len] = next;
            if let Some(&count) = self.sequence_counts.get(&candidate) {
                // Strictly greater keeps the earliest of R, P, S on ties.
                if best.map_or(true, |(_, best_count)| count > best_count) {
                    best = Some((next, count));
                }
            }
        }

        best.map_or(self.params.default_prediction, |(next, _)| next)
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Occurrences of `window` so far; 0 when never seen.
    pub fn sequence_count(&self, window: &[Move]) -> u32 {
        self.sequence_counts.get(window).copied().unwrap_or(0)
    }

    pub fn sequence_counts(&self) -> impl Iterator<Item = (&[Move], u32)> {
        self.sequence_counts.iter().map(|(w, &c)| (w.as_slice(), c))
    }

    /// Forget the current match; params are kept.
    pub fn reset(&mut self) {
        self.history.clear();
        self.sequence_counts.clear();
    }
}

impl BotStrategy for Predictor {
    fn name(&self) -> &str {
        "predictor"
    }

    fn choose_move(&mut self, opponent_last: Option<Move>) -> Move {
        self.next_move(opponent_last)
    }
}
