//! Arena state definitions
//!
//! Grid dimensions, tunables, and the two entity maps (players, crystals).
//! Everything here is plain data; the rules live in `game::arena` and `game::systems`.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::game::constants::{arena, scoring};

/// Player identifier as supplied by the transport
pub type PlayerId = String;

/// Crystal identifier, `"{x}-{y}"` when derived from coordinates
pub type CrystalId = String;

/// Grid dimensions in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub width: i32,
    pub height: i32,
    /// Presentation hint for renderers, ignored by the rules
    pub pixels_per_field: u32,
}

impl Screen {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            pixels_per_field: arena::PIXELS_PER_FIELD,
        }
    }

    /// Check whether a cell lies inside the grid
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new(arena::WIDTH, arena::HEIGHT)
    }
}

/// Gameplay tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaConfig {
    /// Radius (in cells) used for spawn-sound proximity and explosion scatter
    pub max_collision_distance: u32,
    /// Score lost by each player in a player-vs-player collision
    pub player_collision_cost: u32,
    /// Score lost when bumping into the grid border
    pub wall_collision_cost: u32,
    pub initial_score: u32,
    /// Quantity of each periodically spawned crystal
    pub auto_drop_crystal_value: u32,
    /// Presentation hint: renderers draw crystal quantities
    pub show_pots_value: bool,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            max_collision_distance: scoring::MAX_COLLISION_DISTANCE,
            player_collision_cost: scoring::PLAYER_COLLISION_COST,
            wall_collision_cost: scoring::WALL_COLLISION_COST,
            initial_score: scoring::INITIAL_SCORE,
            auto_drop_crystal_value: scoring::AUTO_DROP_CRYSTAL_VALUE,
            show_pots_value: true,
        }
    }
}

/// Player state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub player_id: PlayerId,
    pub nick_name: String,
    pub x: i32,
    pub y: i32,
    pub score: u32,
}

impl Player {
    pub fn new(player_id: PlayerId, x: i32, y: i32, score: u32) -> Self {
        Self {
            nick_name: player_id.clone(),
            player_id,
            x,
            y,
            score,
        }
    }

    /// A player with no score left is frozen in place
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.score > 0
    }

    /// Deduct up to `cost` points, never going below zero.
    /// Returns the amount actually deducted.
    pub fn deduct(&mut self, cost: u32) -> u32 {
        let lost = self.score.min(cost);
        self.score -= lost;
        lost
    }
}

/// Collectible crystal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crystal {
    pub x: i32,
    pub y: i32,
    pub quantity: u32,
}

/// Derive the id of a crystal placed at a cell
pub fn crystal_id(x: i32, y: i32) -> CrystalId {
    format!("{}-{}", x, y)
}

/// Complete arena state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaState {
    pub screen: Screen,
    pub config: ArenaConfig,
    pub players: HashMap<PlayerId, Player>,
    pub crystals: HashMap<CrystalId, Crystal>,
}

impl ArenaState {
    pub fn new(screen: Screen, config: ArenaConfig) -> Self {
        Self {
            screen,
            config,
            players: HashMap::new(),
            crystals: HashMap::new(),
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn crystal(&self, crystal_id: &str) -> Option<&Crystal> {
        self.crystals.get(crystal_id)
    }

    /// Sum of all crystal quantities on the grid
    pub fn total_crystal_quantity(&self) -> u64 {
        self.crystals.values().map(|c| c.quantity as u64).sum()
    }

    /// Shallow merge: every field present in the patch replaces the current one
    pub fn merge(&mut self, patch: StatePatch) {
        if let Some(screen) = patch.screen {
            self.screen = screen;
        }
        if let Some(config) = patch.config {
            self.config = config;
        }
        if let Some(players) = patch.players {
            self.players = players;
        }
        if let Some(crystals) = patch.crystals {
            self.crystals = crystals;
        }
    }
}

/// Partial arena shape accepted by `set-state`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<Screen>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ArenaConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<HashMap<PlayerId, Player>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crystals: Option<HashMap<CrystalId, Crystal>>,
}

impl From<ArenaState> for StatePatch {
    fn from(state: ArenaState) -> Self {
        Self {
            screen: Some(state.screen),
            config: Some(state.config),
            players: Some(state.players),
            crystals: Some(state.crystals),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = ArenaState::default();
        assert_eq!(state.screen.width, 25);
        assert_eq!(state.screen.height, 25);
        assert_eq!(state.config.initial_score, 500);
        assert!(state.players.is_empty());
        assert!(state.crystals.is_empty());
    }

    #[test]
    fn test_screen_contains() {
        let screen = Screen::new(10, 5);
        assert!(screen.contains(0, 0));
        assert!(screen.contains(9, 4));
        assert!(!screen.contains(10, 0));
        assert!(!screen.contains(0, 5));
        assert!(!screen.contains(-1, 2));
    }

    #[test]
    fn test_deduct_clamps_at_zero() {
        let mut player = Player::new("p1".to_string(), 0, 0, 80);
        assert_eq!(player.deduct(150), 80);
        assert_eq!(player.score, 0);
        assert!(!player.is_alive());
        assert_eq!(player.deduct(150), 0);
    }

    #[test]
    fn test_player_nickname_defaults_to_id() {
        let player = Player::new("alice".to_string(), 1, 2, 10);
        assert_eq!(player.nick_name, "alice");
    }

    #[test]
    fn test_crystal_id() {
        assert_eq!(crystal_id(3, 7), "3-7");
        assert_eq!(crystal_id(-1, 0), "-1-0");
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut state = ArenaState::default();
        state
            .players
            .insert("p1".to_string(), Player::new("p1".to_string(), 1, 1, 5));

        let mut crystals = HashMap::new();
        crystals.insert(crystal_id(2, 2), Crystal { x: 2, y: 2, quantity: 9 });
        state.merge(StatePatch {
            crystals: Some(crystals),
            ..Default::default()
        });

        // Untouched fields survive, patched ones are replaced
        assert_eq!(state.players.len(), 1);
        assert_eq!(state.crystals.len(), 1);
        assert_eq!(state.screen, Screen::default());
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let state = ArenaState::default();
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"pixelsPerField\":16"));
        assert!(json.contains("\"maxCollisionDistance\":4"));
    }
}
