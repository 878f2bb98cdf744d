pub mod engine;
pub mod game_actions;
pub mod notify_sweep;
pub mod push;
pub mod stats;
