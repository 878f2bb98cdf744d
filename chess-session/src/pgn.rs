//! PGN movetext (`1. e4 e5 2. Nf3`) as stored in game records.
//!
//! Only the movetext is written. Reading tolerates tag-pair lines, move
//! numbers in either `12.` or `12...` form, numbers glued to the move
//! (`12.e4`) and a trailing result token.

use std::str::FromStr;

use shakmaty::san::SanPlus;
use shakmaty::{Chess, Move, Position};

use crate::error::SessionError;

const RESULT_TOKENS: &[&str] = &["1-0", "0-1", "1/2-1/2", "*"];

/// Format SAN moves as numbered movetext.
pub fn write_movetext<S: AsRef<str>>(sans: &[S]) -> String {
    let mut out = String::new();
    for (i, san) in sans.iter().enumerate() {
        if i % 2 == 0 {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&format!("{}. ", i / 2 + 1));
        } else {
            out.push(' ');
        }
        out.push_str(san.as_ref());
    }
    out
}

/// Split movetext into bare SAN tokens.
pub fn san_tokens(pgn: &str) -> Vec<&str> {
    pgn.lines()
        .filter(|line| !line.trim_start().starts_with('['))
        .flat_map(str::split_whitespace)
        .map(strip_move_number)
        .filter(|t| !t.is_empty() && !RESULT_TOKENS.contains(t))
        .collect()
}

fn strip_move_number(token: &str) -> &str {
    let rest = token.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < token.len() && rest.starts_with('.') {
        rest.trim_start_matches('.')
    } else {
        token
    }
}

/// Replay movetext from the initial position, returning every move played
/// together with the position before it.
pub fn replay(pgn: &str) -> Result<Vec<(Chess, Move)>, SessionError> {
    let mut pos = Chess::default();
    let mut plies = Vec::new();
    for (ply, token) in san_tokens(pgn).into_iter().enumerate() {
        let invalid = || SessionError::InvalidPgn {
            ply,
            token: token.to_string(),
        };
        let san = SanPlus::from_str(token).map_err(|_| invalid())?;
        let mv = san.san.to_move(&pos).map_err(|_| invalid())?;
        let before = pos.clone();
        pos.play_unchecked(&mv);
        plies.push((before, mv));
    }
    Ok(plies)
}
