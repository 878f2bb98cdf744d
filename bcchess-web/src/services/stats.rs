use chess_session::GameResult;
use sqlx::PgConnection;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::user::User;

/// Apply one game result to a user's rating and counters inside the
/// caller's transaction. The user row stays locked until it commits.
pub async fn record_result(
    conn: &mut PgConnection,
    user_id: i64,
    result: GameResult,
) -> Result<User, AppError> {
    let user = User::lock(&mut *conn, user_id).await.map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("User not found".to_string()),
        other => other.into(),
    })?;
    let before = user.stats();
    let after = before.apply(result);
    let updated = User::update_stats(&mut *conn, user_id, &after).await?;
    tracing::info!(
        user_id,
        %result,
        old_rating = before.rating,
        new_rating = after.rating,
        "Recorded game result"
    );
    Ok(updated)
}

/// Standalone rating update in its own transaction.
pub async fn update_stats(
    pool: &DbPool,
    user_id: i64,
    result: GameResult,
) -> Result<User, AppError> {
    let mut tx = pool.begin().await?;
    let user = record_result(&mut tx, user_id, result).await?;
    tx.commit().await?;
    Ok(user)
}
