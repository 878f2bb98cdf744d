use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;

/// Liveness probe. Also confirms the database answers.
pub async fn health_check(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::error!("Health check failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
