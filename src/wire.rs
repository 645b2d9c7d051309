//! Messages crossing the transport and AI-service boundaries.
//!
//! Raw transport frames are decoded into [`WireMessage`] exactly once, at
//! the boundary; the state machine only ever sees tagged variants, never
//! free text.

use serde::{Deserialize, Serialize};

/// One peer-synchronization message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WireMessage {
    /// Ask the relay to put this node into the room for `game_id`.
    #[serde(rename_all = "camelCase")]
    Join { game_id: String },
    /// A second peer entered the room; it becomes the remote seat.
    PeerJoined,
    /// Tells the joining peer which seat it controls.
    #[serde(rename_all = "camelCase")]
    SeatAssigned { seat: u8 },
    /// One move by one player.
    #[serde(rename_all = "camelCase")]
    Move { move_index: u8, player: u8 },
    /// The other peer went away.
    PeerDisconnected,
}

impl WireMessage {
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Request sent to the external move service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMoveRequest {
    /// Board in its codec token form.
    pub board: String,
    /// Seat index of the mover, 0 or 1.
    pub player: u8,
}

/// Reply from the external move service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMoveResponse {
    pub move_index: Option<i8>,
}

impl AiMoveResponse {
    /// The service signals "no move" either with a missing field or with a
    /// negative sentinel; both normalize to `None`.
    pub fn move_index(&self) -> Option<usize> {
        match self.move_index {
            Some(index) if index >= 0 => Some(index as usize),
            _ => None,
        }
    }
}
