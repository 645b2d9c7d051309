//! Core of a two-player Othello app: the board and its move engine, a
//! compact board codec for share URLs, a heuristic move advisor, and a
//! state machine that keeps local input, AI replies, and a remote peer in
//! sync over one authoritative game.
//!
//! Pure rules live in [`game`]; [`session`] wraps them in an async driver
//! that serializes concurrent event sources; [`wire`] defines the tagged
//! messages crossing the transport boundary.

pub mod error;
pub mod game;
pub mod session;
pub mod wire;

pub use error::GameError;
pub use game::board::{Board, Cell, Disc, Position};
pub use game::{
    BoardUpdate, Effect, Game, GameAttrs, GameEvent, Outcome, Phase, Player, PlayerRole,
    RealtimeSession,
};
pub use session::{generate_game_id, GameSession};
pub use wire::{AiMoveRequest, AiMoveResponse, WireMessage};
