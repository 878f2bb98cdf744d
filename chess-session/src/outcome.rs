use serde::{Deserialize, Serialize};
use std::fmt;

use crate::color::Color;

/// Outcome of a finished game from the human player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

impl GameResult {
    pub fn score(self) -> f64 {
        match self {
            GameResult::Win => 1.0,
            GameResult::Loss => 0.0,
            GameResult::Draw => 0.5,
        }
    }

    pub fn is_decisive(self) -> bool {
        !matches!(self, GameResult::Draw)
    }
}

impl std::str::FromStr for GameResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win" => Ok(GameResult::Win),
            "loss" => Ok(GameResult::Loss),
            "draw" => Ok(GameResult::Draw),
            _ => Err(format!("invalid result: {s}")),
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::Win => write!(f, "win"),
            GameResult::Loss => write!(f, "loss"),
            GameResult::Draw => write!(f, "draw"),
        }
    }
}

/// A board condition that ends the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    FiftyMoveRule,
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Checkmate => write!(f, "checkmate"),
            Terminal::Stalemate => write!(f, "stalemate"),
            Terminal::InsufficientMaterial => write!(f, "insufficient_material"),
            Terminal::ThreefoldRepetition => write!(f, "threefold_repetition"),
            Terminal::FiftyMoveRule => write!(f, "fifty_move_rule"),
        }
    }
}

/// How a game reached `gameover`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "terminal")]
pub enum Ending {
    Terminal(Terminal),
    Resignation,
}

/// Decide the player's result.
///
/// Resignation always loses. On checkmate the side to move is the one that
/// was mated, so the player wins exactly when it is not their move. Every
/// other terminal condition is a draw. Returns `None` while the game is
/// still in play.
pub fn classify(
    terminal: Option<Terminal>,
    side_to_move: Color,
    player_color: Color,
    resigned: bool,
) -> Option<GameResult> {
    if resigned {
        return Some(GameResult::Loss);
    }
    match terminal? {
        Terminal::Checkmate if side_to_move == player_color => Some(GameResult::Loss),
        Terminal::Checkmate => Some(GameResult::Win),
        Terminal::Stalemate
        | Terminal::InsufficientMaterial
        | Terminal::ThreefoldRepetition
        | Terminal::FiftyMoveRule => Some(GameResult::Draw),
    }
}
