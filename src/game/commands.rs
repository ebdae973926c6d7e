//! Commands accepted by the arena
//!
//! `Command` is the wire shape delivered by a transport. Handlers work on the
//! stricter types below (`Direction`, `PlaceCrystalRequest`) after conversion.

use serde::{Deserialize, Serialize};

use crate::game::state::{crystal_id, CrystalId, PlayerId, StatePatch};

/// Messages from a transport to the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Command {
    AddPlayer {
        player_id: PlayerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_x: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_y: Option<i32>,
    },
    RemovePlayer {
        player_id: PlayerId,
    },
    /// `key_pressed` stays a raw string: unknown keys are echoed, then ignored
    MovePlayer {
        player_id: PlayerId,
        key_pressed: String,
    },
    AddCrystal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        crystal_id: Option<CrystalId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        crystal_x: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        crystal_y: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quantity: Option<u32>,
    },
    RemoveCrystal {
        crystal_id: CrystalId,
        player_id: PlayerId,
    },
    SetState(StatePatch),
}

impl Command {
    /// Wire name of the command
    pub fn kind(&self) -> &'static str {
        match self {
            Command::AddPlayer { .. } => "add-player",
            Command::RemovePlayer { .. } => "remove-player",
            Command::MovePlayer { .. } => "move-player",
            Command::AddCrystal { .. } => "add-crystal",
            Command::RemoveCrystal { .. } => "remove-crystal",
            Command::SetState(_) => "set-state",
        }
    }
}

/// One of the four grid directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Parse a browser key name. Anything but the four arrow keys is rejected.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Direction::Up),
            "ArrowRight" => Some(Direction::Right),
            "ArrowDown" => Some(Direction::Down),
            "ArrowLeft" => Some(Direction::Left),
            _ => None,
        }
    }

    /// Cell offset; y grows downward
    #[inline]
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }
}

/// Result of applying a direction to a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The step stays on the grid; new position
    Moved { x: i32, y: i32 },
    /// The step would leave the grid
    Blocked,
}

/// Where and how much to place when adding a crystal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceCrystalRequest {
    /// Random cell, configured auto-drop quantity, id derived from the cell
    Auto,
    Explicit {
        crystal_id: CrystalId,
        x: i32,
        y: i32,
        quantity: u32,
    },
}

impl PlaceCrystalRequest {
    /// Explicit placement keyed by the cell's derived id
    pub fn at(x: i32, y: i32, quantity: u32) -> Self {
        PlaceCrystalRequest::Explicit {
            crystal_id: crystal_id(x, y),
            x,
            y,
            quantity,
        }
    }

    /// Build a request from the optional fields of an `add-crystal` command.
    ///
    /// Both coordinates are needed for an explicit placement; without them the
    /// request falls back to `Auto`.
    pub fn from_fields(
        crystal_id: Option<CrystalId>,
        x: Option<i32>,
        y: Option<i32>,
        quantity: Option<u32>,
        default_quantity: u32,
    ) -> Self {
        match (x, y) {
            (Some(x), Some(y)) => PlaceCrystalRequest::Explicit {
                crystal_id: crystal_id.unwrap_or_else(|| crate::game::state::crystal_id(x, y)),
                x,
                y,
                quantity: quantity.unwrap_or(default_quantity),
            },
            _ => PlaceCrystalRequest::Auto,
        }
    }
}
