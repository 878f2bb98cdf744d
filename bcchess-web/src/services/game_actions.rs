use chess_session::difficulty::HINT_DEPTH;
use chess_session::{Color, Difficulty, Match, Session, Stage};

use crate::AppState;
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::game::{Game, GameRecord, GameStatus};
use crate::models::user::User;
use crate::services::stats;

/// A persisted game together with the session rebuilt from it.
#[derive(Debug, Clone)]
pub struct MatchState {
    pub game: Game,
    pub session: Session,
    /// Move the engine played during this request, if any.
    pub engine_move: Option<String>,
}

impl MatchState {
    fn new(game: Game, session: Session) -> Self {
        MatchState {
            game,
            session,
            engine_move: None,
        }
    }
}

// -- Core match actions --
// Each action rebuilds the session from the stored game, applies one
// transition and writes the result back under the game's version check.
// Finishing a game completes the record and updates the owner's rating in
// the same transaction.

/// `setup → playing`. When the player takes Black the engine opens at once.
pub async fn start_match(
    state: &AppState,
    user_id: Option<i64>,
    player_color: Color,
    difficulty: Difficulty,
) -> Result<MatchState, AppError> {
    if let Some(uid) = user_id {
        User::find_by_id(&state.db, uid)
            .await
            .map_err(|e| not_found(e, "User not found"))?;
    }

    let session = Session::new().start(player_color, difficulty)?;
    let pgn = session.board().map(Match::pgn).unwrap_or_default();
    let record = GameRecord {
        user_id,
        pgn,
        player_color,
        difficulty,
        status: GameStatus::Active,
        result: None,
    };
    let game = Game::create(&state.db, &record).await?;
    tracing::info!(
        game_id = game.id,
        ?user_id,
        %player_color,
        %difficulty,
        "Match started"
    );

    let started = MatchState::new(game, session);
    if is_engine_turn(&started.session) {
        return engine_turn(state, started).await;
    }
    Ok(started)
}

pub async fn load_match(state: &AppState, game_id: i64) -> Result<MatchState, AppError> {
    let (game, session) = load(&state.db, game_id, None).await?;
    Ok(MatchState::new(game, session))
}

/// The player's move, followed by the engine's reply while the game is on.
pub async fn play_move(
    state: &AppState,
    game_id: i64,
    uci: &str,
    expected_version: Option<i32>,
) -> Result<MatchState, AppError> {
    let (game, session) = load(&state.db, game_id, expected_version).await?;
    let board = board_in_play(&session)?;
    if !board.is_player_turn() {
        return Err(AppError::BadRequest("Not your turn".to_string()));
    }

    let next = session.play(uci)?;
    let game = commit(&state.db, &game, &next).await?;
    tracing::debug!(game_id, uci, stage = %next.stage(), "Player moved");

    let played = MatchState::new(game, next);
    if is_engine_turn(&played.session) {
        return engine_turn(state, played).await;
    }
    Ok(played)
}

/// Ask the engine again, e.g. after its previous request failed.
pub async fn request_engine_move(state: &AppState, game_id: i64) -> Result<MatchState, AppError> {
    let current = load_match(state, game_id).await?;
    let board = board_in_play(&current.session)?;
    if board.is_player_turn() {
        return Err(AppError::BadRequest("It is the player's turn".to_string()));
    }
    engine_turn(state, current).await
}

pub async fn resign(
    state: &AppState,
    game_id: i64,
    expected_version: Option<i32>,
) -> Result<MatchState, AppError> {
    let (game, session) = load(&state.db, game_id, expected_version).await?;
    let next = session.resign()?;
    let game = commit(&state.db, &game, &next).await?;
    tracing::info!(game_id, "Player resigned");
    Ok(MatchState::new(game, next))
}

pub async fn undo(
    state: &AppState,
    game_id: i64,
    expected_version: Option<i32>,
) -> Result<MatchState, AppError> {
    let (game, session) = load(&state.db, game_id, expected_version).await?;
    let next = session.undo()?;
    let game = commit(&state.db, &game, &next).await?;
    Ok(MatchState::new(game, next))
}

/// Engine suggestion for the player's move. `None` when the engine is unavailable.
pub async fn hint(state: &AppState, game_id: i64) -> Result<Option<String>, AppError> {
    let (_, session) = load(&state.db, game_id, None).await?;
    let board = board_in_play(&session)?;
    if !board.is_player_turn() {
        return Err(AppError::BadRequest("Not your turn".to_string()));
    }
    Ok(state.engine.best_move(&board.fen(), HINT_DEPTH).await)
}

// -- Helpers --

/// Ask the engine for its move and apply it. A missing or unusable move is
/// not an error: the game stays with the engine to move.
async fn engine_turn(state: &AppState, current: MatchState) -> Result<MatchState, AppError> {
    let board = board_in_play(&current.session)?;
    let game_id = current.game.id;
    let Some(mv) = state
        .engine
        .best_move(&board.fen(), board.difficulty().depth())
        .await
    else {
        tracing::warn!(game_id, "No engine move available");
        return Ok(current);
    };

    let next = match current.session.play(&mv) {
        Ok(next) => next,
        Err(e) => {
            tracing::warn!(game_id, "Engine proposed unusable move {mv}: {e}");
            return Ok(current);
        }
    };

    let game = commit(&state.db, &current.game, &next).await?;
    tracing::debug!(game_id, %mv, stage = %next.stage(), "Engine moved");
    Ok(MatchState {
        game,
        session: next,
        engine_move: Some(mv),
    })
}

async fn load(
    pool: &DbPool,
    game_id: i64,
    expected_version: Option<i32>,
) -> Result<(Game, Session), AppError> {
    let game = Game::find_by_id(pool, game_id)
        .await
        .map_err(|e| not_found(e, "Game not found"))?;
    if expected_version.is_some_and(|v| v != game.version) {
        return Err(stale());
    }
    let session = session_of(&game)?;
    Ok((game, session))
}

fn session_of(game: &Game) -> Result<Session, AppError> {
    let record = game.record().map_err(AppError::Internal)?;
    Ok(Session::restore(
        record.player_color,
        record.difficulty,
        &record.pgn,
        record.result,
    )?)
}

/// Write the session back to its game. On `gameover` the game is completed
/// and the owner's stats updated in the same transaction; the version
/// check makes sure that happens once per game.
async fn commit(pool: &DbPool, game: &Game, next: &Session) -> Result<Game, AppError> {
    let mut record = game.record().map_err(AppError::Internal)?;
    let board = next
        .board()
        .ok_or_else(|| AppError::Internal("Session has no board".to_string()))?;
    record.pgn = board.pgn();
    let finished = next.result();
    if let Some(result) = finished {
        record.status = GameStatus::Completed;
        record.result = Some(result);
    }

    let mut tx = pool.begin().await?;
    let saved = Game::save(&mut *tx, game.id, game.version, &record)
        .await?
        .ok_or_else(stale)?;
    if let Some(result) = finished {
        tracing::info!(game_id = game.id, %result, "Game completed");
        if let Some(user_id) = saved.user_id {
            stats::record_result(&mut tx, user_id, result).await?;
        }
    }
    tx.commit().await?;
    Ok(saved)
}

fn board_in_play(session: &Session) -> Result<&Match, AppError> {
    match session {
        Session::Playing(board) => Ok(board),
        _ => Err(AppError::Conflict("Game is over".to_string())),
    }
}

fn is_engine_turn(session: &Session) -> bool {
    session.stage() == Stage::Playing && session.board().is_some_and(|b| !b.is_player_turn())
}

fn stale() -> AppError {
    AppError::Conflict("Game was modified by another request".to_string())
}

fn not_found(e: sqlx::Error, msg: &str) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::NotFound(msg.to_string()),
        other => other.into(),
    }
}
