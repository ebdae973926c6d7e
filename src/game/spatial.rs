//! Proximity queries
//!
//! "Nearby" uses `sqrt(dx * dy)`: the product of the two coordinate deltas,
//! not the sum of their squares. Clients depend on exactly which players hear
//! a crystal spawn, so the metric is kept as is. A negative product gives NaN,
//! which never compares as close.

use crate::game::state::{ArenaState, PlayerId};

/// Distance between two cells under the arena's proximity metric
#[inline]
pub fn proximity_distance(from: (i32, i32), to: (i32, i32)) -> f64 {
    let dx = f64::from(from.0) - f64::from(to.0);
    let dy = f64::from(from.1) - f64::from(to.1);
    (dx * dy).sqrt()
}

/// Ids of all players within `max_collision_distance` of a cell
pub fn players_around(state: &ArenaState, x: i32, y: i32) -> Vec<PlayerId> {
    let max_distance = state.config.max_collision_distance as f64;

    state
        .players
        .values()
        .filter(|player| proximity_distance((x, y), (player.x, player.y)) <= max_distance)
        .map(|player| player.player_id.clone())
        .collect()
}
