use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

pub type DbPool = PgPool;

/// Schema scripts in apply order. Every script is idempotent, so all of
/// them run on each start.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial",
    include_str!("../migrations/001_initial.sql"),
)];

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    for (name, sql) in MIGRATIONS {
        sqlx::raw_sql(sql).execute(pool).await?;
        tracing::debug!("Applied migration {name}");
    }
    Ok(())
}
