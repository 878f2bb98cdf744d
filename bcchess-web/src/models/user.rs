use chess_session::Stats;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::db::DbPool;

pub const LEADERBOARD_SIZE: i64 = 50;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn stats(&self) -> Stats {
        Stats {
            rating: self.rating,
            wins: self.wins,
            losses: self.losses,
            draws: self.draws,
        }
    }

    pub async fn find_by_id(
        executor: impl sqlx::PgExecutor<'_>,
        id: i64,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// Load a user and hold its row lock until the surrounding transaction ends.
    pub async fn lock(
        executor: impl sqlx::PgExecutor<'_>,
        id: i64,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_username(
        pool: &DbPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_or_create_by_username(
        pool: &DbPool,
        username: &str,
    ) -> Result<User, sqlx::Error> {
        if let Some(user) = Self::find_by_username(pool, username).await? {
            return Ok(user);
        }
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (username) VALUES ($1) RETURNING *",
        )
        .bind(username)
        .fetch_one(pool)
        .await;

        match result {
            Ok(user) => {
                tracing::info!(user_id = user.id, "Created user {username}");
                Ok(user)
            }
            // Lost a race with a concurrent first login.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Self::find_by_username(pool, username)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn top_by_rating(pool: &DbPool, limit: i64) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY rating DESC, id ASC LIMIT $1")
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Write rating and counters back as one row update.
    pub async fn update_stats(
        executor: impl sqlx::PgExecutor<'_>,
        id: i64,
        stats: &Stats,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET rating = $1, wins = $2, losses = $3, draws = $4, updated_at = NOW()
             WHERE id = $5 RETURNING *",
        )
        .bind(stats.rating)
        .bind(stats.wins)
        .bind(stats.losses)
        .bind(stats.draws)
        .bind(id)
        .fetch_one(executor)
        .await
    }
}
