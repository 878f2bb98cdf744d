use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chess_session::{Color, Difficulty, Ending, Stage, Terminal};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::AppState;
use crate::error::AppError;
use crate::extract::ValidJson;
use crate::routes::api::GameResponse;
use crate::services::game_actions::{self, MatchState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchResponse {
    #[serde(flatten)]
    game: GameResponse,
    stage: Stage,
    fen: String,
    turn: Color,
    is_player_turn: bool,
    terminal: Option<Terminal>,
    ending: Option<Ending>,
    moves: Vec<String>,
    last_move: Option<String>,
    engine_move: Option<String>,
}

impl MatchResponse {
    fn from_state(m: &MatchState) -> Self {
        let board = m.session.board();
        let playing = m.session.stage() == Stage::Playing;
        Self {
            game: GameResponse::from_game(&m.game),
            stage: m.session.stage(),
            fen: board.map(|b| b.fen()).unwrap_or_default(),
            turn: board.map(|b| b.side_to_move()).unwrap_or(Color::White),
            is_player_turn: playing && board.is_some_and(|b| b.is_player_turn()),
            terminal: board.and_then(|b| b.terminal()),
            ending: m.session.ending(),
            moves: board.map(|b| b.moves()).unwrap_or_default(),
            last_move: board.and_then(|b| b.last_move()).map(str::to_string),
            engine_move: m.engine_move.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartMatchRequest {
    user_id: Option<i64>,
    player_color: Color,
    #[serde(default)]
    difficulty: Difficulty,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveRequest {
    #[serde(rename = "move")]
    mv: String,
    expected_version: Option<i32>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct VersionRequest {
    expected_version: Option<i32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/matches", post(start_match))
        .route("/matches/{id}", get(get_match))
        .route("/matches/{id}/moves", post(play_move))
        .route("/matches/{id}/engine-move", post(engine_move))
        .route("/matches/{id}/resign", post(resign))
        .route("/matches/{id}/undo", post(undo))
        .route("/matches/{id}/hint", get(hint))
}

async fn start_match(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<StartMatchRequest>,
) -> Result<(StatusCode, Json<MatchResponse>), AppError> {
    let started =
        game_actions::start_match(&state, body.user_id, body.player_color, body.difficulty)
            .await?;
    Ok((StatusCode::CREATED, Json(MatchResponse::from_state(&started))))
}

async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MatchResponse>, AppError> {
    let current = game_actions::load_match(&state, id).await?;
    Ok(Json(MatchResponse::from_state(&current)))
}

async fn play_move(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(body): ValidJson<MoveRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let mv = body.mv.trim();
    if mv.is_empty() {
        return Err(AppError::Invalid {
            field: "move",
            message: "Move is required".to_string(),
        });
    }
    let next = game_actions::play_move(&state, id, mv, body.expected_version).await?;
    Ok(Json(MatchResponse::from_state(&next)))
}

async fn engine_move(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MatchResponse>, AppError> {
    let next = game_actions::request_engine_move(&state, id).await?;
    Ok(Json(MatchResponse::from_state(&next)))
}

async fn resign(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<MatchResponse>, AppError> {
    let body = optional_body::<VersionRequest>(&body)?;
    let next = game_actions::resign(&state, id, body.expected_version).await?;
    Ok(Json(MatchResponse::from_state(&next)))
}

async fn undo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<MatchResponse>, AppError> {
    let body = optional_body::<VersionRequest>(&body)?;
    let next = game_actions::undo(&state, id, body.expected_version).await?;
    Ok(Json(MatchResponse::from_state(&next)))
}

async fn hint(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let hint = game_actions::hint(&state, id).await?;
    Ok(Json(json!({ "hint": hint })))
}

/// Resign and undo accept an empty body.
fn optional_body<T: serde::de::DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(e.to_string()))
}
