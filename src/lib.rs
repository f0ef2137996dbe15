//! Rules engine for a hidden-role quest game: match state machine, quest and
//! voting resolution, and role visibility.

pub mod config;
pub mod dto;
pub mod error;
pub mod game;
pub mod services;
pub mod state;

pub use config::GameConfig;
pub use error::GameError;
pub use game::Game;
