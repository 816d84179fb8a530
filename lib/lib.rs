/// The explosions of Atomic chess.
pub mod atomic;
/// Chess domain types.
pub mod chess;
/// The game loop.
pub mod game;
/// Turning squares picked by the player into moves.
pub mod input;
/// The Lichess board API.
pub mod lichess;
/// Keeping the board in agreement with the game server.
pub mod reconcile;
/// Credentials and game sessions.
pub mod session;
/// What the player is told about the game.
pub mod status;
/// Presenting the game to the player.
pub mod view;
