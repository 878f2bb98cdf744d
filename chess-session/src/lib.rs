pub mod color;
pub mod difficulty;
pub mod error;
pub mod outcome;
pub mod pgn;
pub mod rating;
pub mod session;

pub use color::Color;
pub use difficulty::Difficulty;
pub use error::SessionError;
pub use outcome::{Ending, GameResult, Terminal, classify};
pub use rating::Stats;
pub use session::{Match, Session, Stage};
