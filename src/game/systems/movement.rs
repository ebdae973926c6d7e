//! Grid movement
//!
//! A step either lands on a cell inside the grid or is blocked by the border.
//! Blocked steps never change the position; the caller turns them into a wall
//! collision.

use crate::game::commands::{Direction, MoveOutcome};
use crate::game::state::{Player, Screen};

/// Apply one step in `direction` to the player's position
pub fn apply_direction(direction: Direction, player: &Player, screen: &Screen) -> MoveOutcome {
    let (dx, dy) = direction.delta();
    // Positions from commands are not range-checked, so a step can overflow
    let (Some(x), Some(y)) = (player.x.checked_add(dx), player.y.checked_add(dy)) else {
        return MoveOutcome::Blocked;
    };

    // Only the axis that changes is bounds-checked
    let in_bounds = match direction {
        Direction::Left | Direction::Right => (0..screen.width).contains(&x),
        Direction::Up | Direction::Down => (0..screen.height).contains(&y),
    };

    if in_bounds {
        MoveOutcome::Moved { x, y }
    } else {
        MoveOutcome::Blocked
    }
}
