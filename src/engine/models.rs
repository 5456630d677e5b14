//! Core data types: moves, outcomes and rounds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Move {
    #[serde(rename = "R")]
    Rock,
    #[serde(rename = "P")]
    Paper,
    #[serde(rename = "S")]
    Scissors,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("invalid move code {0:?}, expected one of R, P, S")]
    InvalidCode(String),
}

impl Move {
    /// Canonical order. Every tie-break in this crate follows it.
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    pub fn code(self) -> char {
        match self {
            Move::Rock => 'R',
            Move::Paper => 'P',
            Move::Scissors => 'S',
        }
    }

    pub fn from_code(code: char) -> Result<Move, MoveError> {
        match code {
            'R' => Ok(Move::Rock),
            'P' => Ok(Move::Paper),
            'S' => Ok(Move::Scissors),
            other => Err(MoveError::InvalidCode(other.to_string())),
        }
    }

    /// The move that defeats `self`.
    pub fn counter(self) -> Move {
        match self {
            Move::Rock => Move::Paper,
            Move::Paper => Move::Scissors,
            Move::Scissors => Move::Rock,
        }
    }

    pub fn beats(self, other: Move) -> bool {
        other.counter() == self
    }

    pub fn outcome_against(self, other: Move) -> Outcome {
        if self == other {
            Outcome::Tie
        } else if self.beats(other) {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Move {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Move::from_code(c),
            _ => Err(MoveError::InvalidCode(s.to_string())),
        }
    }
}

/// Parse a run of move codes such as `"RRPPS"`.
pub fn parse_moves(codes: &str) -> Result<Vec<Move>, MoveError> {
    codes.chars().map(Move::from_code).collect()
}

pub fn format_moves(moves: &[Move]) -> String {
    moves.iter().map(|m| m.code()).collect()
}

/// Result of one move against another, from the first move's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub p1_move: Move,
    pub p2_move: Move,
    /// Outcome for player one.
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub rounds: Vec<Round>,
    pub p1_wins: usize,
    pub p2_wins: usize,
    pub ties: usize,
}

/// Which side took more rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    P1,
    P2,
}

impl MatchRecord {
    /// `None` when both sides won the same number of rounds.
    pub fn winner(&self) -> Option<Side> {
        match self.p1_wins.cmp(&self.p2_wins) {
            std::cmp::Ordering::Greater => Some(Side::P1),
            std::cmp::Ordering::Less => Some(Side::P2),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn round_win_rate(&self, side: Side) -> f64 {
        let wins = match side {
            Side::P1 => self.p1_wins,
            Side::P2 => self.p2_wins,
        };
        wins as f64 / self.rounds.len().max(1) as f64
    }
}
