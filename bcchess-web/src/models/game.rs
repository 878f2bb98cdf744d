use chess_session::{Color, Difficulty, GameResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::DbPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Active,
    Completed,
}

impl GameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for GameStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GameStatus::Active),
            "completed" => Ok(GameStatus::Completed),
            _ => Err(format!("invalid status: {s}")),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Game {
    pub id: i64,
    pub user_id: Option<i64>,
    pub pgn: String,
    pub player_color: String,
    pub difficulty: String,
    pub status: String,
    pub result: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Every writable column of a game. Writes always replace the whole record.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub user_id: Option<i64>,
    pub pgn: String,
    pub player_color: Color,
    pub difficulty: Difficulty,
    pub status: GameStatus,
    pub result: Option<GameResult>,
}

impl GameRecord {
    /// `result` is present exactly when the game is completed.
    pub fn check_result_invariant(&self) -> Result<(), &'static str> {
        match (self.status, self.result) {
            (GameStatus::Completed, None) => Err("A completed game must have a result"),
            (GameStatus::Active, Some(_)) => Err("An active game cannot have a result"),
            _ => Ok(()),
        }
    }
}

impl Game {
    pub fn is_completed(&self) -> bool {
        self.status == GameStatus::Completed.as_str()
    }

    /// Typed view of the stored columns. Fails only on rows written
    /// outside the application.
    pub fn record(&self) -> Result<GameRecord, String> {
        Ok(GameRecord {
            user_id: self.user_id,
            pgn: self.pgn.clone(),
            player_color: self.player_color.parse()?,
            difficulty: self.difficulty.parse()?,
            status: self.status.parse()?,
            result: self.result.as_deref().map(str::parse).transpose()?,
        })
    }

    pub async fn find_by_id(
        executor: impl sqlx::PgExecutor<'_>,
        id: i64,
    ) -> Result<Game, sqlx::Error> {
        sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = $1")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    pub async fn list(pool: &DbPool, user_id: Option<i64>) -> Result<Vec<Game>, sqlx::Error> {
        match user_id {
            Some(uid) => {
                sqlx::query_as::<_, Game>(
                    "SELECT * FROM games WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
                )
                .bind(uid)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Game>("SELECT * FROM games ORDER BY created_at DESC, id DESC")
                    .fetch_all(pool)
                    .await
            }
        }
    }

    pub async fn create(
        executor: impl sqlx::PgExecutor<'_>,
        record: &GameRecord,
    ) -> Result<Game, sqlx::Error> {
        sqlx::query_as::<_, Game>(
            "INSERT INTO games (user_id, pgn, player_color, difficulty, status, result)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(record.user_id)
        .bind(&record.pgn)
        .bind(record.player_color.letter())
        .bind(record.difficulty.to_string())
        .bind(record.status.as_str())
        .bind(record.result.map(|r| r.to_string()))
        .fetch_one(executor)
        .await
    }

    /// Replace the record if it is still at `expected_version`, bumping the
    /// version. `None` means another writer got there first.
    pub async fn save(
        executor: impl sqlx::PgExecutor<'_>,
        id: i64,
        expected_version: i32,
        record: &GameRecord,
    ) -> Result<Option<Game>, sqlx::Error> {
        sqlx::query_as::<_, Game>(
            "UPDATE games
             SET user_id = $1, pgn = $2, player_color = $3, difficulty = $4, status = $5,
                 result = $6, version = version + 1, updated_at = NOW()
             WHERE id = $7 AND version = $8
             RETURNING *",
        )
        .bind(record.user_id)
        .bind(&record.pgn)
        .bind(record.player_color.letter())
        .bind(record.difficulty.to_string())
        .bind(record.status.as_str())
        .bind(record.result.map(|r| r.to_string()))
        .bind(id)
        .bind(expected_version)
        .fetch_optional(executor)
        .await
    }
}
