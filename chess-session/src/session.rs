use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position};

use crate::color::Color;
use crate::difficulty::Difficulty;
use crate::error::SessionError;
use crate::outcome::{Ending, GameResult, Terminal, classify};
use crate::pgn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Setup,
    Playing,
    Gameover,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Setup => write!(f, "setup"),
            Stage::Playing => write!(f, "playing"),
            Stage::Gameover => write!(f, "gameover"),
        }
    }
}

#[derive(Debug, Clone)]
struct Ply {
    before: Chess,
    san: String,
    uci: String,
}

/// The board of one match: the human's color, the engine level and every
/// ply played from the initial position.
#[derive(Debug, Clone)]
pub struct Match {
    player_color: Color,
    difficulty: Difficulty,
    position: Chess,
    plies: Vec<Ply>,
}

impl Match {
    pub fn new(player_color: Color, difficulty: Difficulty) -> Self {
        Match {
            player_color,
            difficulty,
            position: Chess::default(),
            plies: Vec::new(),
        }
    }

    /// Rebuild a match from stored movetext.
    pub fn from_pgn(
        player_color: Color,
        difficulty: Difficulty,
        movetext: &str,
    ) -> Result<Self, SessionError> {
        let mut m = Match::new(player_color, difficulty);
        for (before, mv) in pgn::replay(movetext)? {
            m.push(before, &mv);
        }
        Ok(m)
    }

    // -- Accessors --

    pub fn player_color(&self) -> Color {
        self.player_color
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn side_to_move(&self) -> Color {
        self.position.turn().into()
    }

    pub fn is_player_turn(&self) -> bool {
        self.side_to_move() == self.player_color
    }

    pub fn ply_count(&self) -> usize {
        self.plies.len()
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn pgn(&self) -> String {
        let sans: Vec<&str> = self.plies.iter().map(|p| p.san.as_str()).collect();
        pgn::write_movetext(&sans)
    }

    /// SAN of every ply, in order.
    pub fn moves(&self) -> Vec<String> {
        self.plies.iter().map(|p| p.san.clone()).collect()
    }

    /// Coordinate notation of the last ply, if any.
    pub fn last_move(&self) -> Option<&str> {
        self.plies.last().map(|p| p.uci.as_str())
    }

    /// Board condition that ends the game, if one holds.
    pub fn terminal(&self) -> Option<Terminal> {
        if self.position.is_checkmate() {
            Some(Terminal::Checkmate)
        } else if self.position.is_stalemate() {
            Some(Terminal::Stalemate)
        } else if self.position.is_insufficient_material() {
            Some(Terminal::InsufficientMaterial)
        } else if self.repetitions() >= 3 {
            Some(Terminal::ThreefoldRepetition)
        } else if self.position.halfmoves() >= 100 {
            Some(Terminal::FiftyMoveRule)
        } else {
            None
        }
    }

    // -- Internals --

    /// Find the legal move written in coordinate notation (`e2e4`, `e7e8q`).
    /// A pawn reaching the last rank without a piece letter becomes a queen.
    fn find_move(&self, uci: &str) -> Result<Move, SessionError> {
        let uci = uci.trim();
        if !(4..=5).contains(&uci.len()) || !uci.is_ascii() {
            return Err(SessionError::InvalidMove(uci.to_string()));
        }
        let wanted = uci.to_ascii_lowercase();
        let legal = self.position.legal_moves();
        let find = |text: &str| {
            legal
                .iter()
                .find(|m| m.to_uci(CastlingMode::Standard).to_string() == text)
                .cloned()
        };
        find(&wanted)
            .or_else(|| {
                if wanted.len() == 4 {
                    find(&format!("{wanted}q"))
                } else {
                    None
                }
            })
            .ok_or_else(|| SessionError::IllegalMove(uci.to_string()))
    }

    fn push(&mut self, before: Chess, mv: &Move) {
        let uci = mv.to_uci(CastlingMode::Standard).to_string();
        let mut after = before.clone();
        let san = SanPlus::from_move_and_play_unchecked(&mut after, mv).to_string();
        self.plies.push(Ply { before, san, uci });
        self.position = after;
    }

    fn pop(&mut self) -> bool {
        match self.plies.pop() {
            Some(ply) => {
                self.position = ply.before;
                true
            }
            None => false,
        }
    }

    /// How often the current position has occurred, counting itself.
    fn repetitions(&self) -> usize {
        let current = position_key(&self.position);
        1 + self
            .plies
            .iter()
            .filter(|p| position_key(&p.before) == current)
            .count()
    }
}

/// The first four FEN fields: placement, side to move, castling rights and
/// en passant square. Clocks are ignored.
fn position_key(pos: &Chess) -> String {
    let fen = Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string();
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

/// Lifecycle of a single match. Every transition borrows the current
/// session and returns the next one, so callers keep the old value when a
/// transition is rejected.
#[derive(Debug, Clone, Default)]
pub enum Session {
    #[default]
    Setup,
    Playing(Match),
    Gameover {
        board: Match,
        result: GameResult,
        ending: Ending,
    },
}

impl Session {
    pub fn new() -> Self {
        Session::Setup
    }

    /// Restore a session from a stored record. A stored result on a board
    /// that is not terminal can only have come from resignation.
    pub fn restore(
        player_color: Color,
        difficulty: Difficulty,
        movetext: &str,
        stored_result: Option<GameResult>,
    ) -> Result<Self, SessionError> {
        let board = Match::from_pgn(player_color, difficulty, movetext)?;
        let session = Session::settle(board);
        match (session, stored_result) {
            (Session::Playing(board), Some(result)) => Ok(Session::Gameover {
                board,
                result,
                ending: Ending::Resignation,
            }),
            (session, _) => Ok(session),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Session::Setup => Stage::Setup,
            Session::Playing(_) => Stage::Playing,
            Session::Gameover { .. } => Stage::Gameover,
        }
    }

    pub fn board(&self) -> Option<&Match> {
        match self {
            Session::Setup => None,
            Session::Playing(board) | Session::Gameover { board, .. } => Some(board),
        }
    }

    pub fn result(&self) -> Option<GameResult> {
        match self {
            Session::Gameover { result, .. } => Some(*result),
            _ => None,
        }
    }

    pub fn ending(&self) -> Option<Ending> {
        match self {
            Session::Gameover { ending, .. } => Some(*ending),
            _ => None,
        }
    }

    // -- Transitions --

    /// `setup → playing`, or `gameover → setup → playing` in one step.
    pub fn start(&self, player_color: Color, difficulty: Difficulty) -> Result<Self, SessionError> {
        match self {
            Session::Playing(_) => Err(SessionError::MatchInProgress),
            Session::Setup | Session::Gameover { .. } => {
                Ok(Session::Playing(Match::new(player_color, difficulty)))
            }
        }
    }

    /// `gameover → setup`. Nothing carries over.
    pub fn reset(&self) -> Self {
        Session::Setup
    }

    /// Apply a legal move for the side to move.
    pub fn play(&self, uci: &str) -> Result<Self, SessionError> {
        let Session::Playing(board) = self else {
            return Err(SessionError::NotPlaying);
        };
        let mv = board.find_move(uci)?;
        let mut next = board.clone();
        next.push(board.position.clone(), &mv);
        Ok(Session::settle(next))
    }

    pub fn resign(&self) -> Result<Self, SessionError> {
        let Session::Playing(board) = self else {
            return Err(SessionError::NotPlaying);
        };
        let result = classify(None, board.side_to_move(), board.player_color, true)
            .unwrap_or(GameResult::Loss);
        Ok(Session::Gameover {
            board: board.clone(),
            result,
            ending: Ending::Resignation,
        })
    }

    /// Take back the last full turn: the engine's reply and the player's
    /// move when it is the player's turn, otherwise the player's last move.
    pub fn undo(&self) -> Result<Self, SessionError> {
        let Session::Playing(board) = self else {
            return Err(SessionError::NotPlaying);
        };
        if board.plies.is_empty() {
            return Err(SessionError::NothingToUndo);
        }
        let mut next = board.clone();
        if next.is_player_turn() {
            next.pop();
        }
        next.pop();
        Ok(Session::Playing(next))
    }

    fn settle(board: Match) -> Self {
        let terminal = board.terminal();
        let result = classify(terminal, board.side_to_move(), board.player_color, false);
        match (terminal, result) {
            (Some(terminal), Some(result)) => Session::Gameover {
                board,
                result,
                ending: Ending::Terminal(terminal),
            },
            _ => Session::Playing(board),
        }
    }
}
