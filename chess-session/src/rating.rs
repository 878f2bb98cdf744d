//! Elo-style rating against a fixed engine opponent.

use serde::{Deserialize, Serialize};

use crate::outcome::GameResult;

pub const K_FACTOR: f64 = 32.0;
/// The engine is treated as a 1200 player at every difficulty.
pub const OPPONENT_RATING: i32 = 1200;
pub const DEFAULT_RATING: i32 = 1200;

/// Rating and result counters of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub rating: i32,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            rating: DEFAULT_RATING,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }
}

impl Stats {
    pub fn games_played(&self) -> i32 {
        self.wins + self.losses + self.draws
    }

    /// Percentage score over all games, draws counting half. Zero before
    /// the first game.
    pub fn win_rate(&self) -> f64 {
        let played = self.games_played();
        if played == 0 {
            return 0.0;
        }
        (self.wins as f64 + 0.5 * self.draws as f64) / played as f64 * 100.0
    }

    /// Stats after one finished game. Exactly one counter moves; the rating
    /// moves on wins and losses only.
    pub fn apply(self, result: GameResult) -> Stats {
        let mut next = self;
        match result {
            GameResult::Win => next.wins += 1,
            GameResult::Loss => next.losses += 1,
            GameResult::Draw => next.draws += 1,
        }
        if result.is_decisive() {
            next.rating = rated(self.rating, result);
        }
        next
    }
}

/// Probability-like expected score of a player rated `rating` against the engine.
pub fn expected_score(rating: i32) -> f64 {
    1.0 / (1.0 + 10_f64.powf((OPPONENT_RATING - rating) as f64 / 400.0))
}

/// New rating after `result`, rounded half up. No floor or ceiling.
pub fn rated(rating: i32, result: GameResult) -> i32 {
    let delta = K_FACTOR * (result.score() - expected_score(rating));
    (rating as f64 + delta + 0.5).floor() as i32
}
