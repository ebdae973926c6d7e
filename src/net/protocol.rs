//! Wire protocol
//!
//! Commands come in and events go out as JSON objects tagged by `"type"`,
//! one message per line on stream transports.

use serde::{Deserialize, Serialize};

use crate::game::commands::Command;
use crate::game::events::GameEvent;
use crate::game::leaderboard::{top_players, LeaderboardEntry};
use crate::game::state::{ArenaState, StatePatch};

/// Messages from the server to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Full state for a client that just attached
    Setup(ArenaSnapshot),
    /// A domain event from the arena
    Event(GameEvent),
}

/// Full arena state plus the current score table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "setup", rename_all = "camelCase")]
pub struct ArenaSnapshot {
    pub state: StatePatch,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl ArenaSnapshot {
    pub fn from_state(state: &ArenaState, leaderboard_size: usize) -> Self {
        Self {
            state: StatePatch::from(state.clone()),
            leaderboard: top_players(state, leaderboard_size),
        }
    }
}

/// Encode a message as a single JSON line (without the trailing newline)
pub fn encode<T: Serialize>(message: &T) -> Result<String, EncodeError> {
    serde_json::to_string(message).map_err(|e| EncodeError(e.to_string()))
}

/// Decode one command from a JSON line
pub fn decode_command(line: &str) -> Result<Command, DecodeError> {
    serde_json::from_str(line.trim()).map_err(|e| DecodeError(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
#[error("Encode error: {0}")]
pub struct EncodeError(String);

#[derive(Debug, thiserror::Error)]
#[error("Decode error: {0}")]
pub struct DecodeError(String);
