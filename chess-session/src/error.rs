use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    NotPlaying,
    MatchInProgress,
    InvalidMove(String),
    IllegalMove(String),
    NothingToUndo,
    InvalidPgn { ply: usize, token: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotPlaying => write!(f, "no match in play"),
            SessionError::MatchInProgress => write!(f, "a match is already in progress"),
            SessionError::InvalidMove(mv) => write!(f, "invalid move: {mv}"),
            SessionError::IllegalMove(mv) => write!(f, "illegal move: {mv}"),
            SessionError::NothingToUndo => write!(f, "nothing to undo"),
            SessionError::InvalidPgn { ply, token } => {
                write!(f, "invalid pgn at ply {ply}: {token}")
            }
        }
    }
}

impl std::error::Error for SessionError {}
