pub mod game;
pub mod push_subscription;
pub mod user;
