//! Bot-vs-bot arena runner.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use crate::engine::bot_strategy::{BotStrategy, StrategyFactory};
use crate::engine::models::*;
use crate::engine::simulator::{play_round, MatchState};

/// Aggregated results from an arena run.
#[derive(Debug, Clone, Serialize)]
pub struct ArenaResult {
    pub num_matches: usize,
    pub rounds_per_match: usize,
    /// Matches won, keyed by strategy name.
    pub wins: BTreeMap<String, usize>,
    pub draws: usize,
    /// Fraction of rounds won in each match, keyed by strategy name.
    pub round_win_rates: BTreeMap<String, Vec<f64>>,
    pub match_durations_ms: Vec<f64>,
}

impl ArenaResult {
    pub fn win_rate(&self, name: &str) -> f64 {
        *self.wins.get(name).unwrap_or(&0) as f64 / self.num_matches.max(1) as f64
    }

    pub fn avg_round_win_rate(&self, name: &str) -> f64 {
        match self.round_win_rates.get(name) {
            Some(r) if !r.is_empty() => r.iter().sum::<f64>() / r.len() as f64,
            _ => 0.0,
        }
    }

    pub fn round_win_rate_stddev(&self, name: &str) -> f64 {
        let rates = match self.round_win_rates.get(name) {
            Some(r) if r.len() >= 2 => r,
            _ => return 0.0,
        };
        let avg = self.avg_round_win_rate(name);
        let variance = rates.iter().map(|r| (r - avg).powi(2)).sum::<f64>() / (rates.len() - 1) as f64;
        variance.sqrt()
    }

    /// Wilson score interval on the match win rate.
    pub fn confidence_interval_95(&self, name: &str) -> (f64, f64) {
        let n = self.num_matches;
        if n == 0 {
            return (0.0, 0.0);
        }
        let p = self.win_rate(name);
        let z = 1.96_f64;
        let denom = 1.0 + z * z / n as f64;
        let center = (p + z * z / (2.0 * n as f64)) / denom;
        let margin = z * ((p * (1.0 - p) + z * z / (4.0 * n as f64)) / n as f64).sqrt() / denom;
        ((center - margin).max(0.0), (center + margin).min(1.0))
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Arena Results ({} matches x {} rounds)",
            self.num_matches, self.rounds_per_match
        )];
        lines.push("=".repeat(60));
        for (name, wins) in &self.wins {
            let wr = self.win_rate(name);
            let (ci_lo, ci_hi) = self.confidence_interval_95(name);
            lines.push(format!(
                "  {:>12}: {:3} wins ({:5.1}%)  [95% CI: {:.1}%-{:.1}%]  rounds won={:5.1}% +/- {:4.1}",
                name,
                wins,
                wr * 100.0,
                ci_lo * 100.0,
                ci_hi * 100.0,
                self.avg_round_win_rate(name) * 100.0,
                self.round_win_rate_stddev(name) * 100.0,
            ));
        }
        lines.push(format!("  {:>12}: {}", "Draws", self.draws));
        if !self.match_durations_ms.is_empty() {
            let total_ms = self.match_durations_ms.iter().sum::<f64>();
            let avg_ms = total_ms / self.match_durations_ms.len() as f64;
            lines.push(format!("  Avg match: {:.2}ms  |  Total: {:.2}s", avg_ms, total_ms / 1000.0));
        }
        lines.join("\n")
    }
}

/// Play `rounds` rounds between two strategies.
pub fn run_match(p1: &mut dyn BotStrategy, p2: &mut dyn BotStrategy, rounds: usize) -> MatchRecord {
    let mut state = MatchState::new();
    for _ in 0..rounds {
        play_round(&mut state, p1, p2);
    }
    state.finish()
}

/// Mixed into the match seed for player two so the sides never share a stream.
pub const P2_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seeds handed to the two factories for match `match_idx`: player one gets
/// `base_seed + match_idx`, player two gets that value XOR [`P2_SEED_MIX`].
pub fn match_seeds(base_seed: u64, match_idx: usize) -> (u64, u64) {
    let seed = base_seed.wrapping_add(match_idx as u64);
    (seed, seed ^ P2_SEED_MIX)
}

/// Run `num_matches` matches between exactly two named strategies.
///
/// `strategies[0]` plays as player one and `strategies[1]` as player two.
/// Every match builds fresh strategy instances, so matches are independent
/// and run on the rayon pool. Seeds follow [`match_seeds`]; results are
/// aggregated in match order.
///
/// Panics unless `strategies` holds exactly two entries with distinct names.
pub fn run_arena(
    strategies: &[(String, StrategyFactory)],
    num_matches: usize,
    base_seed: u64,
    rounds: usize,
    progress_callback: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> ArenaResult {
    let [(p1_name, p1_factory), (p2_name, p2_factory)] = strategies else {
        panic!("arena needs exactly two strategies, got {}", strategies.len());
    };
    assert_ne!(p1_name, p2_name, "arena strategies need distinct names");

    let completed = AtomicUsize::new(0);
    let outcomes: Vec<(MatchRecord, f64)> = (0..num_matches)
        .into_par_iter()
        .map(|match_idx| {
            let (p1_seed, p2_seed) = match_seeds(base_seed, match_idx);
            let mut p1 = p1_factory(p1_seed);
            let mut p2 = p2_factory(p2_seed);

            let t0 = Instant::now();
            let record = run_match(p1.as_mut(), p2.as_mut(), rounds);
            let elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;

            tracing::debug!(
                match_idx,
                p1_seed,
                p2_seed,
                p1 = %p1_name,
                p2 = %p2_name,
                p1_wins = record.p1_wins,
                p2_wins = record.p2_wins,
                ties = record.ties,
                "match finished"
            );
            if let Some(cb) = progress_callback {
                cb(completed.fetch_add(1, Ordering::Relaxed) + 1, num_matches);
            }
            (record, elapsed_ms)
        })
        .collect();

    let mut result = ArenaResult {
        num_matches,
        rounds_per_match: rounds,
        wins: [(p1_name.clone(), 0), (p2_name.clone(), 0)].into_iter().collect(),
        draws: 0,
        round_win_rates: [(p1_name.clone(), Vec::new()), (p2_name.clone(), Vec::new())]
            .into_iter()
            .collect(),
        match_durations_ms: Vec::with_capacity(num_matches),
    };

    for (record, elapsed_ms) in outcomes {
        result.match_durations_ms.push(elapsed_ms);
        for (side, name) in [(Side::P1, p1_name), (Side::P2, p2_name)] {
            if let Some(rates) = result.round_win_rates.get_mut(name) {
                rates.push(record.round_win_rate(side));
            }
        }
        match record.winner() {
            Some(Side::P1) => *result.wins.entry(p1_name.clone()).or_insert(0) += 1,
            Some(Side::P2) => *result.wins.entry(p2_name.clone()).or_insert(0) += 1,
            None => result.draws += 1,
        }
    }

    tracing::info!(
        matches = num_matches,
        rounds,
        p1 = %p1_name,
        p2 = %p2_name,
        draws = result.draws,
        "arena finished"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bot_strategy::{factory, CycleStrategy, FrequencyStrategy, RandomStrategy};
    use crate::engine::predictor::Predictor;
    use std::sync::{Arc, Mutex};

    fn factories(entries: Vec<(&str, StrategyFactory)>) -> Vec<(String, StrategyFactory)> {
        entries.into_iter().map(|(n, f)| (n.to_string(), f)).collect()
    }

    #[test]
    fn test_predictor_vs_constant_rock() {
        let mut predictor = Predictor::new();
        let mut rock = CycleStrategy::new(vec![Move::Rock]).unwrap();
        let record = run_match(&mut predictor, &mut rock, 100);

        // Rounds 1-4 fall back to Scissors; from round 5 the RRRRR window is known.
        assert_eq!(record.p2_wins, 4);
        assert_eq!(record.p1_wins, 96);
        assert!(record.rounds[..4].iter().all(|r| r.outcome == Outcome::Loss));
        assert_eq!(record.winner(), Some(Side::P1));
    }

    #[test]
    fn test_predictor_beats_cycle() {
        let mut predictor = Predictor::new();
        let mut cycle = CycleStrategy::new(parse_moves("RRPPS").unwrap()).unwrap();
        let record = run_match(&mut predictor, &mut cycle, 1000);
        assert!(record.p1_wins >= 950, "predictor won only {} rounds", record.p1_wins);
    }

    #[test]
    fn test_arena_random_vs_random() {
        let strategies = factories(vec![
            ("random_a", factory(|seed| Box::new(RandomStrategy::new(seed)))),
            ("random_b", factory(|seed| Box::new(RandomStrategy::new(seed)))),
        ]);

        let result = run_arena(&strategies, 5, 42, 50, None);

        assert_eq!(result.num_matches, 5);
        let total_outcomes = result.wins.values().sum::<usize>() + result.draws;
        assert_eq!(total_outcomes, 5);
        assert_eq!(result.round_win_rates["random_a"].len(), 5);
        assert_eq!(result.match_durations_ms.len(), 5);
    }

    #[test]
    fn test_arena_is_reproducible() {
        let strategies = factories(vec![
            ("predictor", factory(|_| Box::new(Predictor::new()))),
            ("random", factory(|seed| Box::new(RandomStrategy::new(seed)))),
        ]);

        let a = run_arena(&strategies, 4, 7, 200, None);
        let b = run_arena(&strategies, 4, 7, 200, None);
        assert_eq!(a.wins, b.wins);
        assert_eq!(a.round_win_rates, b.round_win_rates);
    }

    #[test]
    fn test_arena_reports_progress() {
        let strategies = factories(vec![
            ("predictor", factory(|_| Box::new(Predictor::new()))),
            ("rock", factory(|_| Box::new(CycleStrategy::new(vec![Move::Rock]).unwrap()))),
        ]);
        let calls = AtomicUsize::new(0);
        let cb = |_done: usize, total: usize| {
            assert_eq!(total, 3);
            calls.fetch_add(1, Ordering::Relaxed);
        };

        let result = run_arena(&strategies, 3, 0, 20, Some(&cb));
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(result.wins["predictor"], 3);
        assert!((result.win_rate("predictor") - 1.0).abs() < 1e-9);
        assert!(result.summary().contains("predictor"));
    }

    #[test]
    fn test_factories_receive_match_seeds() {
        let seen: Arc<Mutex<Vec<(&'static str, u64)>>> = Arc::new(Mutex::new(Vec::new()));
        let (seen_a, seen_b) = (seen.clone(), seen.clone());
        let strategies = factories(vec![
            ("b_first", factory(move |seed| {
                seen_a.lock().unwrap().push(("b_first", seed));
                Box::new(RandomStrategy::new(seed))
            })),
            ("a_second", factory(move |seed| {
                seen_b.lock().unwrap().push(("a_second", seed));
                Box::new(RandomStrategy::new(seed))
            })),
        ]);

        run_arena(&strategies, 3, 42, 1, None);

        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        let mut expected = vec![];
        for i in 0..3u64 {
            expected.push(("b_first", 42 + i));
            expected.push(("a_second", (42 + i) ^ P2_SEED_MIX));
        }
        expected.sort();
        assert_eq!(seen, expected);
        assert_eq!(match_seeds(42, 0), (42, 42 ^ P2_SEED_MIX));
    }

    #[test]
    fn test_sides_follow_caller_order() {
        // Names sort opposite to the caller's order.
        let strategies = factories(vec![
            ("zz_random", factory(|seed| Box::new(RandomStrategy::new(seed)))),
            ("aa_frequency", factory(|_| Box::new(FrequencyStrategy::default()))),
        ]);
        let result = run_arena(&strategies, 1, 9, 200, None);

        let (p1_seed, _) = match_seeds(9, 0);
        let mut p1 = RandomStrategy::new(p1_seed);
        let mut p2 = FrequencyStrategy::default();
        let record = run_match(&mut p1, &mut p2, 200);
        assert_eq!(result.round_win_rates["zz_random"], vec![record.round_win_rate(Side::P1)]);
        assert_eq!(result.round_win_rates["aa_frequency"], vec![record.round_win_rate(Side::P2)]);
    }

    #[test]
    #[should_panic(expected = "distinct names")]
    fn test_duplicate_names_rejected() {
        let strategies = factories(vec![
            ("same", factory(|_| Box::new(Predictor::new()))),
            ("same", factory(|_| Box::new(Predictor::new()))),
        ]);
        run_arena(&strategies, 1, 0, 1, None);
    }

    #[test]
    fn test_confidence_interval_bounds() {
        let result = ArenaResult {
            num_matches: 10,
            rounds_per_match: 100,
            wins: [("a".to_string(), 7), ("b".to_string(), 3)].into_iter().collect(),
            draws: 0,
            round_win_rates: BTreeMap::new(),
            match_durations_ms: vec![],
        };
        let (lo, hi) = result.confidence_interval_95("a");
        assert!(lo > 0.3 && lo < 0.7);
        assert!(hi > 0.7 && hi <= 1.0);
        assert!(result.confidence_interval_95("missing").0 < 1e-9);
    }
}
