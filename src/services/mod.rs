/// Phase-handler operations of a match.
pub mod game_service;
/// Bots playing complete matches.
pub mod simulation;
