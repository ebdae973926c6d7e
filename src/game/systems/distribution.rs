//! Crystal distribution ("explosions")
//!
//! Lost score is never destroyed: it is split into random portions and put
//! back on the grid as crystals scattered around the point of impact.

use rand::Rng;

use crate::game::arena::Arena;
use crate::game::commands::PlaceCrystalRequest;
use crate::game::state::Screen;

/// Inclusive rectangle in which exploded crystals may land
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScatterBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl ScatterBounds {
    /// Rectangle of `radius` cells around a center, clamped to `[1, dimension - 1]`.
    ///
    /// Column and row 0 never receive exploded crystals. If clamping inverts
    /// an axis it collapses onto its upper bound.
    pub fn around(center_x: i32, center_y: i32, radius: u32, screen: &Screen) -> Self {
        let radius = i32::try_from(radius).unwrap_or(i32::MAX);
        let (min_x, max_x) = clamp_axis(center_x, radius, screen.width);
        let (min_y, max_y) = clamp_axis(center_y, radius, screen.height);
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }
}

fn clamp_axis(center: i32, radius: i32, dimension: i32) -> (i32, i32) {
    let max = center.saturating_add(radius).min(dimension - 1);
    let min = center.saturating_sub(radius).max(1);
    (min.min(max), max)
}

/// Convert `total` points into crystals around `(center_x, center_y)`.
///
/// Each round peels off a uniform random portion in `[1, remaining]` and drops
/// it on a random cell inside the scatter bounds. The quantities placed always
/// sum to `total`. Returns the number of placements.
pub fn explode_crystals(arena: &mut Arena, total: u32, center_x: i32, center_y: i32) -> usize {
    let bounds = ScatterBounds::around(
        center_x,
        center_y,
        arena.state.config.max_collision_distance,
        &arena.state.screen,
    );

    let mut remaining = total;
    let mut placements = 0;

    while remaining > 0 {
        let quantity = arena.rng.gen_range(1..=remaining);
        remaining -= quantity;

        let x = arena.rng.gen_range(bounds.min_x..=bounds.max_x);
        let y = arena.rng.gen_range(bounds.min_y..=bounds.max_y);
        arena.add_crystal(PlaceCrystalRequest::at(x, y, quantity));
        placements += 1;
    }

    tracing::debug!(
        total,
        placements,
        center_x,
        center_y,
        "Exploded score into crystals"
    );

    placements
}
