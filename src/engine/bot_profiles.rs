//! Named bot profiles: a strategy type plus its settings.
//! Loaded from TOML at runtime for the arena CLI.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::engine::bot_strategy::*;
use crate::engine::models::{parse_moves, Move, MoveError};
use crate::engine::predictor::{Predictor, PredictorParams};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown strategy type {0:?}")]
    UnknownStrategy(String),
    #[error("profile {profile:?}: {source}")]
    InvalidMove {
        profile: String,
        #[source]
        source: MoveError,
    },
    #[error("profile {profile:?}: {reason}")]
    Invalid { profile: String, reason: String },
}

/// A named profile. Fields that do not apply to `strategy_type` are ignored.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BotProfile {
    pub description: Option<String>,
    #[serde(default = "default_strategy_type")]
    pub strategy_type: String,

    // Predictor params (defaults from PredictorParams::default())
    pub context_len: Option<usize>,
    pub opening_seed: Option<String>,
    pub default_prediction: Option<String>,

    /// Move codes for "cycle", e.g. "RRPPS".
    pub pattern: Option<String>,
    /// Window size for "frequency".
    pub lookback: Option<usize>,
}

fn default_strategy_type() -> String {
    "predictor".into()
}

/// Arena defaults; the CLI overrides each one.
#[derive(Debug, Deserialize, Clone)]
pub struct ArenaConfig {
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    #[serde(default = "default_matches")]
    pub matches: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_rounds() -> usize {
    1000
}

fn default_matches() -> usize {
    10
}

fn default_seed() -> u64 {
    42
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            matches: default_matches(),
            seed: default_seed(),
        }
    }
}

/// Top-level TOML file structure.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BotProfilesFile {
    #[serde(default)]
    pub profiles: HashMap<String, BotProfile>,
    #[serde(default)]
    pub arena: ArenaConfig,
}

impl BotProfile {
    pub fn of_type(strategy_type: &str) -> Self {
        Self {
            strategy_type: strategy_type.to_string(),
            ..Default::default()
        }
    }

    /// Convert to PredictorParams, using defaults for any unspecified fields.
    pub fn to_predictor_params(&self, name: &str) -> Result<PredictorParams, ProfileError> {
        let d = PredictorParams::default();
        let parse = |code: &Option<String>, fallback: Move| -> Result<Move, ProfileError> {
            match code {
                Some(c) => c.parse::<Move>().map_err(|source| ProfileError::InvalidMove {
                    profile: name.to_string(),
                    source,
                }),
                None => Ok(fallback),
            }
        };
        Ok(PredictorParams {
            context_len: self.context_len.unwrap_or(d.context_len),
            opening_seed: parse(&self.opening_seed, d.opening_seed)?,
            default_prediction: parse(&self.default_prediction, d.default_prediction)?,
        })
    }

    /// Validate the profile and return a factory for fresh per-match instances.
    pub fn build_factory(&self, name: &str) -> Result<StrategyFactory, ProfileError> {
        let invalid = |reason: &str| ProfileError::Invalid {
            profile: name.to_string(),
            reason: reason.to_string(),
        };

        let built = match self.strategy_type.as_str() {
            "predictor" => {
                let params = self.to_predictor_params(name)?;
                factory(move |_| Box::new(Predictor::with_params(params.clone())))
            }
            "random" => factory(|seed| Box::new(RandomStrategy::new(seed))),
            "cycle" => {
                let code = self.pattern.as_deref().unwrap_or("RRPPS");
                let pattern = parse_moves(code).map_err(|source| ProfileError::InvalidMove {
                    profile: name.to_string(),
                    source,
                })?;
                let template = CycleStrategy::new(pattern)
                    .ok_or_else(|| invalid("cycle pattern must not be empty"))?;
                factory(move |_| Box::new(template.clone()))
            }
            "counter_last" => factory(|_| Box::new(CounterLastStrategy)),
            "frequency" => {
                let lookback = self.lookback.unwrap_or(DEFAULT_LOOKBACK);
                if lookback == 0 {
                    return Err(invalid("lookback must be at least 1"));
                }
                factory(move |_| Box::new(FrequencyStrategy::new(lookback)))
            }
            "pair_markov" => factory(|_| Box::new(PairMarkovStrategy::default())),
            other => return Err(ProfileError::UnknownStrategy(other.to_string())),
        };
        Ok(built)
    }
}

/// Profiles available without a profile file.
pub fn builtin_profiles() -> HashMap<String, BotProfile> {
    let mut profiles = HashMap::new();
    profiles.insert("predictor".to_string(), BotProfile {
        description: Some("sequence-frequency predictor over 5-move windows".into()),
        ..BotProfile::of_type("predictor")
    });
    profiles.insert("cycle".to_string(), BotProfile {
        description: Some("repeats R R P P S".into()),
        pattern: Some("RRPPS".into()),
        ..BotProfile::of_type("cycle")
    });
    profiles.insert("constant_rock".to_string(), BotProfile {
        description: Some("always plays Rock".into()),
        pattern: Some("R".into()),
        ..BotProfile::of_type("cycle")
    });
    profiles.insert("counter_last".to_string(), BotProfile {
        description: Some("counters the opponent's previous move".into()),
        ..BotProfile::of_type("counter_last")
    });
    profiles.insert("frequency".to_string(), BotProfile {
        description: Some("counters the opponent's most frequent recent move".into()),
        lookback: Some(DEFAULT_LOOKBACK),
        ..BotProfile::of_type("frequency")
    });
    profiles.insert("pair_markov".to_string(), BotProfile {
        description: Some("counters the most likely successor of the opponent's last move".into()),
        ..BotProfile::of_type("pair_markov")
    });
    profiles.insert("random".to_string(), BotProfile {
        description: Some("uniform random, seeded per match".into()),
        ..BotProfile::of_type("random")
    });
    profiles
}

/// Parse profiles from TOML text. Built-in profiles fill in any name the file omits.
pub fn parse_profiles(content: &str, path: &Path) -> Result<BotProfilesFile, ProfileError> {
    let mut file: BotProfilesFile = toml::from_str(content).map_err(|source| ProfileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    for (name, profile) in builtin_profiles() {
        file.profiles.entry(name).or_insert(profile);
    }
    Ok(file)
}

/// Load profiles from a TOML file at the given path.
pub fn load_profiles(path: &Path) -> Result<BotProfilesFile, ProfileError> {
    let content = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_profiles(&content, path)
}

/// Try to load profiles from well-known paths, returning the built-ins if none found.
pub fn load_default_profiles() -> BotProfilesFile {
    let candidates = [
        "rps_profiles.toml",
        "../rps_profiles.toml",
        "/etc/rps/rps_profiles.toml",
    ];
    for path in &candidates {
        let p = Path::new(path);
        if p.exists() {
            match load_profiles(p) {
                Ok(profiles) => {
                    tracing::info!(path = %p.display(), count = profiles.profiles.len(), "loaded bot profiles");
                    return profiles;
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "failed to load bot profiles");
                }
            }
        }
    }
    tracing::info!("no rps_profiles.toml found, using built-in profiles");
    BotProfilesFile {
        profiles: builtin_profiles(),
        arena: ArenaConfig::default(),
    }
}

impl BotProfilesFile {
    /// Look up `name`, falling back to treating it as a bare strategy type.
    pub fn resolve(&self, name: &str) -> BotProfile {
        self.profiles
            .get(name)
            .cloned()
            .unwrap_or_else(|| BotProfile::of_type(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[arena]
rounds = 250
seed = 9

[profiles.long_memory]
description = "wider context"
strategy_type = "predictor"
context_len = 6
default_prediction = "R"

[profiles.quick_cycle]
strategy_type = "cycle"
pattern = "RPS"
"#;

    #[test]
    fn test_parse_sample() {
        let file = parse_profiles(SAMPLE, Path::new("sample.toml")).unwrap();
        assert_eq!(file.arena.rounds, 250);
        assert_eq!(file.arena.matches, 10);
        assert_eq!(file.arena.seed, 9);

        let params = file.profiles["long_memory"].to_predictor_params("long_memory").unwrap();
        assert_eq!(params.context_len, 6);
        assert_eq!(params.window_len(), 7);
        assert_eq!(params.opening_seed, Move::Rock);
        assert_eq!(params.default_prediction, Move::Rock);

        // Built-ins are merged in.
        assert!(file.profiles.contains_key("predictor"));
        assert!(file.profiles.contains_key("pair_markov"));
    }

    #[test]
    fn test_build_cycle_factory() {
        let file = parse_profiles(SAMPLE, Path::new("sample.toml")).unwrap();
        let build = file.profiles["quick_cycle"].build_factory("quick_cycle").unwrap();
        let mut bot = build(0);
        let moves: Vec<Move> = (0..4).map(|_| bot.choose_move(None)).collect();
        assert_eq!(moves, vec![Move::Rock, Move::Paper, Move::Scissors, Move::Rock]);
    }

    #[test]
    fn test_every_builtin_builds() {
        for (name, profile) in builtin_profiles() {
            let build = profile.build_factory(&name).unwrap();
            let mut bot = build(1);
            bot.choose_move(None);
            bot.choose_move(Some(Move::Paper));
        }
    }

    #[test]
    fn test_invalid_profiles() {
        let err = BotProfile::of_type("ensemble").build_factory("x").err().unwrap();
        assert!(matches!(err, ProfileError::UnknownStrategy(ref t) if t == "ensemble"));

        let bad_pattern = BotProfile { pattern: Some("RXP".into()), ..BotProfile::of_type("cycle") };
        assert!(matches!(
            bad_pattern.build_factory("bad").err().unwrap(),
            ProfileError::InvalidMove { .. }
        ));

        let empty_pattern = BotProfile { pattern: Some(String::new()), ..BotProfile::of_type("cycle") };
        assert!(matches!(
            empty_pattern.build_factory("empty").err().unwrap(),
            ProfileError::Invalid { .. }
        ));

        let zero_lookback = BotProfile { lookback: Some(0), ..BotProfile::of_type("frequency") };
        assert!(zero_lookback.build_factory("zero").is_err());

        // A huge lookback is valid and must not allocate up front.
        let huge_lookback = BotProfile { lookback: Some(1 << 62), ..BotProfile::of_type("frequency") };
        let build = huge_lookback.build_factory("huge").unwrap();
        let mut bot = build(0);
        assert_eq!(bot.choose_move(None), Move::Rock);
        assert_eq!(bot.choose_move(Some(Move::Paper)), Move::Scissors);

        let bad_seed = BotProfile { opening_seed: Some("Rock".into()), ..BotProfile::of_type("predictor") };
        assert!(bad_seed.to_predictor_params("seed").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let loaded = load_profiles(file.path()).unwrap();
        assert_eq!(loaded.profiles["quick_cycle"].pattern.as_deref(), Some("RPS"));

        let missing = load_profiles(Path::new("/nonexistent/rps_profiles.toml"));
        assert!(matches!(missing, Err(ProfileError::Read { .. })));
    }

    #[test]
    fn test_parse_error_names_path() {
        let err = parse_profiles("[profiles.x\n", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_resolve_falls_back_to_type() {
        let file = BotProfilesFile { profiles: builtin_profiles(), arena: ArenaConfig::default() };
        assert_eq!(file.resolve("constant_rock").pattern.as_deref(), Some("R"));
        assert_eq!(file.resolve("counter_last").strategy_type, "counter_last");
        assert_eq!(file.resolve("frequency_only").strategy_type, "frequency_only");
    }
}
