use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chess_session::{Color, Difficulty, GameResult, Session, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::AppState;
use crate::error::AppError;
use crate::extract::ValidJson;
use crate::models::game::{Game, GameRecord, GameStatus};
use crate::models::push_subscription::PushSubscription;
use crate::models::user::{LEADERBOARD_SIZE, User};
use crate::services::stats;

const USERNAME_MAX_LEN: usize = 30;

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserResponse {
    id: i64,
    username: String,
    rating: i32,
    wins: i32,
    losses: i32,
    draws: i32,
    games_played: i32,
    win_rate: f64,
    created_at: DateTime<Utc>,
}

impl UserResponse {
    pub(crate) fn from_user(u: &User) -> Self {
        let stats = u.stats();
        Self {
            id: u.id,
            username: u.username.clone(),
            rating: u.rating,
            wins: u.wins,
            losses: u.losses,
            draws: u.draws,
            games_played: stats.games_played(),
            win_rate: stats.win_rate(),
            created_at: u.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GameResponse {
    id: i64,
    user_id: Option<i64>,
    pgn: String,
    player_color: String,
    difficulty: String,
    status: String,
    result: Option<String>,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GameResponse {
    pub(crate) fn from_game(g: &Game) -> Self {
        Self {
            id: g.id,
            user_id: g.user_id,
            pgn: g.pgn.clone(),
            player_color: g.player_color.clone(),
            difficulty: g.difficulty.clone(),
            status: g.status.clone(),
            result: g.result.clone(),
            version: g.version,
            created_at: g.created_at,
            updated_at: g.updated_at,
        }
    }
}

// -- Request types --

#[derive(Deserialize)]
struct CreateUserRequest {
    username: String,
}

#[derive(Deserialize)]
struct StatsRequest {
    result: GameResult,
}

#[derive(Deserialize)]
struct PushRequest {
    subscription: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GamesQuery {
    user_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateGameRequest {
    user_id: Option<i64>,
    pgn: String,
    player_color: Color,
    difficulty: Difficulty,
    status: GameStatus,
    result: Option<GameResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateGameRequest {
    pgn: Option<String>,
    player_color: Option<Color>,
    difficulty: Option<Difficulty>,
    status: Option<GameStatus>,
    result: Option<GameResult>,
    expected_version: Option<i32>,
}

// -- Router --

pub fn router() -> Router<AppState> {
    Router::new()
        // Users
        .route("/users", get(leaderboard).post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/stats", post(update_user_stats))
        .route("/users/{id}/push", post(subscribe))
        // Games
        .route("/games", get(list_games).post(create_game))
        .route("/games/{id}", get(get_game).put(update_game))
        // Push
        .route("/push/public-key", get(push_public_key))
}

// -- User handlers --

async fn leaderboard(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = User::top_by_rating(&state.db, LEADERBOARD_SIZE).await?;
    Ok(Json(users.iter().map(UserResponse::from_user).collect()))
}

async fn create_user(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CreateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let username = validate_username(&body.username)?;
    let user = User::find_or_create_by_username(&state.db, username).await?;
    Ok(Json(UserResponse::from_user(&user)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let user = User::find_by_id(&state.db, id)
        .await
        .map_err(user_not_found)?;
    Ok(Json(UserResponse::from_user(&user)))
}

async fn update_user_stats(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(body): ValidJson<StatsRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = stats::update_stats(&state.db, id, body.result).await?;
    Ok(Json(UserResponse::from_user(&user)))
}

async fn subscribe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(body): ValidJson<PushRequest>,
) -> Result<Json<Value>, AppError> {
    let subscription = match &body.subscription {
        Value::Object(_) => body.subscription.to_string(),
        Value::String(s) if serde_json::from_str::<Value>(s).is_ok_and(|v| v.is_object()) => {
            s.clone()
        }
        _ => {
            return Err(AppError::Invalid {
                field: "subscription",
                message: "subscription must be a JSON object".to_string(),
            });
        }
    };

    User::find_by_id(&state.db, id)
        .await
        .map_err(user_not_found)?;
    let inserted = PushSubscription::save(&state.db, id, &subscription).await?;
    if inserted {
        tracing::info!(user_id = id, "Stored push subscription");
    }
    Ok(Json(json!({ "success": true })))
}

// -- Game handlers --

async fn list_games(
    State(state): State<AppState>,
    Query(query): Query<GamesQuery>,
) -> Result<Json<Vec<GameResponse>>, AppError> {
    let games = Game::list(&state.db, query.user_id).await?;
    Ok(Json(games.iter().map(GameResponse::from_game).collect()))
}

async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<GameResponse>, AppError> {
    let game = Game::find_by_id(&state.db, id)
        .await
        .map_err(game_not_found)?;
    Ok(Json(GameResponse::from_game(&game)))
}

async fn create_game(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameResponse>), AppError> {
    let record = GameRecord {
        user_id: body.user_id,
        pgn: body.pgn.trim().to_string(),
        player_color: body.player_color,
        difficulty: body.difficulty,
        status: body.status,
        result: body.result,
    };
    validate_record(&record)?;
    if let Some(uid) = record.user_id {
        User::find_by_id(&state.db, uid)
            .await
            .map_err(user_not_found)?;
    }

    let game = Game::create(&state.db, &record).await?;
    tracing::debug!(game_id = game.id, "Game record created");
    Ok((StatusCode::CREATED, Json(GameResponse::from_game(&game))))
}

/// Partial update of a game record. Completed games are frozen. This never
/// touches user stats; matches finish through the match endpoints.
async fn update_game(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(body): ValidJson<UpdateGameRequest>,
) -> Result<Json<GameResponse>, AppError> {
    let game = Game::find_by_id(&state.db, id)
        .await
        .map_err(game_not_found)?;
    if game.is_completed() {
        return Err(AppError::Conflict("Game is already completed".to_string()));
    }
    let version = body.expected_version.unwrap_or(game.version);
    if version != game.version {
        return Err(AppError::Conflict(
            "Game was modified by another request".to_string(),
        ));
    }

    let mut record = game.record().map_err(AppError::Internal)?;
    if let Some(pgn) = body.pgn {
        record.pgn = pgn.trim().to_string();
    }
    if let Some(color) = body.player_color {
        record.player_color = color;
    }
    if let Some(difficulty) = body.difficulty {
        record.difficulty = difficulty;
    }
    if let Some(status) = body.status {
        record.status = status;
    }
    if body.result.is_some() {
        record.result = body.result;
    }
    validate_record(&record)?;

    let game = Game::save(&state.db, id, version, &record)
        .await?
        .ok_or_else(|| AppError::Conflict("Game was modified by another request".to_string()))?;
    Ok(Json(GameResponse::from_game(&game)))
}

// -- Push handlers --

async fn push_public_key(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let key = state
        .vapid_public_key
        .as_deref()
        .ok_or_else(|| AppError::NotFound("Push notifications are not configured".to_string()))?;
    Ok(Json(json!({ "publicKey": key })))
}

// -- Helpers --

fn validate_username(raw: &str) -> Result<&str, AppError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(AppError::Invalid {
            field: "username",
            message: "Username is required".to_string(),
        });
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(AppError::Invalid {
            field: "username",
            message: format!("Username must be at most {USERNAME_MAX_LEN} characters"),
        });
    }
    Ok(username)
}

fn validate_record(record: &GameRecord) -> Result<(), AppError> {
    record
        .check_result_invariant()
        .map_err(|msg| AppError::Invalid {
            field: "result",
            message: msg.to_string(),
        })?;
    let session = Session::restore(record.player_color, record.difficulty, &record.pgn, None)
        .map_err(|e| AppError::Invalid {
            field: "pgn",
            message: e.to_string(),
        })?;
    // A finished board can only be stored as a completed game.
    if record.status == GameStatus::Active && session.stage() == Stage::Gameover {
        return Err(AppError::Invalid {
            field: "pgn",
            message: "The game is already over; store it as completed with a result".to_string(),
        });
    }
    Ok(())
}

fn user_not_found(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::NotFound("User not found".to_string()),
        other => other.into(),
    }
}

fn game_not_found(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Game not found".to_string()),
        other => other.into(),
    }
}
