use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::db::DbPool;

#[derive(Debug, Clone, FromRow)]
pub struct PushSubscription {
    pub id: i64,
    pub user_id: i64,
    /// Browser `PushSubscription` JSON, stored verbatim.
    pub subscription: String,
    pub created_at: DateTime<Utc>,
}

impl PushSubscription {
    /// Store a subscription unless the same payload is already stored.
    /// Returns whether a row was inserted.
    pub async fn save(
        pool: &DbPool,
        user_id: i64,
        subscription: &str,
    ) -> Result<bool, sqlx::Error> {
        let inserted = sqlx::query(
            "INSERT INTO push_subscriptions (user_id, subscription) VALUES ($1, $2)
             ON CONFLICT (subscription) DO NOTHING",
        )
        .bind(user_id)
        .bind(subscription)
        .execute(pool)
        .await?
        .rows_affected();
        Ok(inserted > 0)
    }

    pub async fn list_all(pool: &DbPool) -> Result<Vec<PushSubscription>, sqlx::Error> {
        sqlx::query_as::<_, PushSubscription>("SELECT * FROM push_subscriptions ORDER BY id")
            .fetch_all(pool)
            .await
    }
}
