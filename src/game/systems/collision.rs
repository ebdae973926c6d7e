//! Collision detection and scoring
//!
//! Runs after a player's move resolves. All overlaps are exact cell matches.
//! Every point lost to a collision is redistributed as crystals.

use crate::game::arena::Arena;
use crate::game::events::{AudioCue, GameEvent};
use crate::game::state::{CrystalId, PlayerId};
use crate::game::systems::distribution::explode_crystals;

/// Penalty for a move that would leave the grid.
///
/// The player stays where they are, loses up to `wall_collision_cost` points,
/// and the lost points explode around their cell. Returns the points lost.
pub fn on_border_shock(arena: &mut Arena, player_id: &str) -> u32 {
    let cost = arena.state.config.wall_collision_cost;
    let Some(player) = arena.state.players.get_mut(player_id) else {
        return 0;
    };

    let lost = player.deduct(cost);
    let (x, y, score) = (player.x, player.y, player.score);

    explode_crystals(arena, lost, x, y);

    let audio = if score == 0 {
        AudioCue::Dying
    } else {
        AudioCue::WallCollision
    };
    arena.emit(GameEvent::play_audio(audio, [player_id.to_string()]));

    tracing::debug!(player_id, lost, score, audio = audio.as_str(), "Wall collision");
    lost
}

/// Consume every crystal on the player's cell.
///
/// Returns the total quantity added to the player's score.
pub fn check_crystal_collision(arena: &mut Arena, player_id: &str) -> u32 {
    let Some(player) = arena.state.players.get(player_id) else {
        return 0;
    };
    let (x, y) = (player.x, player.y);

    let hits: Vec<CrystalId> = arena
        .state
        .crystals
        .iter()
        .filter(|(_, crystal)| crystal.x == x && crystal.y == y)
        .map(|(id, _)| id.clone())
        .collect();

    let mut gained = 0u32;
    for crystal_id in hits {
        let Some(crystal) = arena.remove_crystal(&crystal_id, player_id) else {
            continue;
        };
        if let Some(player) = arena.state.players.get_mut(player_id) {
            player.score = player.score.saturating_add(crystal.quantity);
        }
        gained = gained.saturating_add(crystal.quantity);
    }

    if gained > 0 {
        tracing::debug!(player_id, gained, "Crystals collected");
    }
    gained
}

/// Resolve collisions between the moving player and everyone on the same cell.
///
/// Only targets with a positive score are hit. Each hit is resolved on its own,
/// in map iteration order: both players lose up to `player_collision_cost`
/// (each capped by their own score), both hear the cue, and the combined loss
/// explodes around the moving player. Returns the number of collisions.
pub fn check_player_collision(arena: &mut Arena, player_id: &str) -> usize {
    let others: Vec<PlayerId> = arena
        .state
        .players
        .keys()
        .filter(|id| id.as_str() != player_id)
        .cloned()
        .collect();

    let cost = arena.state.config.player_collision_cost;
    let mut collisions = 0;

    for other_id in others {
        let Some(player) = arena.state.players.get(player_id) else {
            break;
        };
        let (x, y) = (player.x, player.y);

        let hit = arena
            .state
            .players
            .get(&other_id)
            .map_or(false, |other| other.x == x && other.y == y && other.is_alive());
        if !hit {
            continue;
        }

        let other_lost = arena
            .state
            .players
            .get_mut(&other_id)
            .map_or(0, |other| other.deduct(cost));
        let (player_lost, player_score) = arena
            .state
            .players
            .get_mut(player_id)
            .map_or((0, 0), |player| (player.deduct(cost), player.score));

        let audio = if player_score == 0 {
            AudioCue::Dying
        } else {
            AudioCue::PlayerCollision
        };
        arena.emit(GameEvent::play_audio(
            audio,
            [player_id.to_string(), other_id.clone()],
        ));

        explode_crystals(arena, other_lost + player_lost, x, y);

        tracing::debug!(
            player_id,
            other_id = other_id.as_str(),
            player_lost,
            other_lost,
            "Player collision"
        );
        collisions += 1;
    }

    collisions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::commands::PlaceCrystalRequest;
    use crate::game::state::{ArenaConfig, Screen};
    use std::sync::{Arc, Mutex};

    fn test_arena() -> Arena {
        Arena::with_seed(Screen::new(25, 25), ArenaConfig::default(), 42)
    }

    fn recorded(arena: &mut Arena) -> Arc<Mutex<Vec<GameEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        arena.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        events
    }

    fn set_score(arena: &mut Arena, player_id: &str, score: u32) {
        arena.state.players.get_mut(player_id).unwrap().score = score;
    }

    fn placed_quantity(events: &[GameEvent]) -> u32 {
        events
            .iter()
            .map(|event| match event {
                GameEvent::AddCrystal { quantity, .. } => *quantity,
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn test_crystal_collision_adds_quantity() {
        let mut arena = test_arena();
        arena.add_player("p1", Some(5), Some(5));
        arena.add_crystal(PlaceCrystalRequest::at(5, 5, 20));
        let before = arena.state().player("p1").unwrap().score;

        let gained = check_crystal_collision(&mut arena, "p1");

        assert_eq!(gained, 20);
        assert_eq!(arena.state().player("p1").unwrap().score, before + 20);
        assert!(arena.state().crystal("5-5").is_none());
    }

    #[test]
    fn test_crystal_collision_consumes_all_on_cell() {
        let mut arena = test_arena();
        arena.add_player("p1", Some(5), Some(5));
        arena.add_crystal(PlaceCrystalRequest::at(5, 5, 20));
        arena.add_crystal(PlaceCrystalRequest::Explicit {
            crystal_id: "bonus".to_string(),
            x: 5,
            y: 5,
            quantity: 7,
        });
        arena.add_crystal(PlaceCrystalRequest::at(6, 5, 100));
        let events = recorded(&mut arena);

        assert_eq!(check_crystal_collision(&mut arena, "p1"), 27);
        assert_eq!(arena.state().crystals.len(), 1);

        let drinks = events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    GameEvent::PlayAudio {
                        audio: AudioCue::DrinkPot,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(drinks, 2);
    }

    #[test]
    fn test_crystal_collision_elsewhere_is_noop() {
        let mut arena = test_arena();
        arena.add_player("p1", Some(5), Some(5));
        arena.add_crystal(PlaceCrystalRequest::at(6, 6, 20));

        assert_eq!(check_crystal_collision(&mut arena, "p1"), 0);
        assert_eq!(arena.state().crystals.len(), 1);
        assert_eq!(check_crystal_collision(&mut arena, "ghost"), 0);
    }

    #[test]
    fn test_border_shock_clamps_score() {
        let mut arena = test_arena();
        arena.add_player("p1", Some(0), Some(3));
        set_score(&mut arena, "p1", 80);
        let events = recorded(&mut arena);

        let lost = on_border_shock(&mut arena, "p1");

        assert_eq!(lost, 80);
        assert_eq!(arena.state().player("p1").unwrap().score, 0);
        let events = events.lock().unwrap();
        assert_eq!(placed_quantity(&events), 80);
        assert_eq!(
            events.last(),
            Some(&GameEvent::play_audio(AudioCue::Dying, ["p1".to_string()]))
        );
    }

    #[test]
    fn test_border_shock_conserves_points() {
        let mut arena = test_arena();
        arena.add_player("p1", Some(0), Some(0));
        let events = recorded(&mut arena);

        assert_eq!(on_border_shock(&mut arena, "p1"), 150);
        assert_eq!(arena.state().player("p1").unwrap().score, 350);
        let events = events.lock().unwrap();
        assert_eq!(placed_quantity(&events), 150);
        assert_eq!(
            events.last(),
            Some(&GameEvent::play_audio(
                AudioCue::WallCollision,
                ["p1".to_string()]
            ))
        );
    }

    #[test]
    fn test_player_collision_both_die() {
        let mut arena = test_arena();
        arena.add_player("p1", Some(5), Some(5));
        arena.add_player("p2", Some(5), Some(5));
        set_score(&mut arena, "p1", 50);
        set_score(&mut arena, "p2", 50);
        let events = recorded(&mut arena);

        assert_eq!(check_player_collision(&mut arena, "p1"), 1);

        assert_eq!(arena.state().player("p1").unwrap().score, 0);
        assert_eq!(arena.state().player("p2").unwrap().score, 0);

        let events = events.lock().unwrap();
        assert_eq!(placed_quantity(&events), 100);
        assert_eq!(
            events[0],
            GameEvent::play_audio(AudioCue::Dying, ["p1".to_string(), "p2".to_string()])
        );
    }

    #[test]
    fn test_player_collision_independent_costs() {
        let mut arena = test_arena();
        arena.add_player("p1", Some(5), Some(5));
        arena.add_player("p2", Some(5), Some(5));
        set_score(&mut arena, "p2", 30);
        let events = recorded(&mut arena);

        check_player_collision(&mut arena, "p1");

        assert_eq!(arena.state().player("p1").unwrap().score, 400);
        assert_eq!(arena.state().player("p2").unwrap().score, 0);
        let events = events.lock().unwrap();
        assert_eq!(placed_quantity(&events), 130);
        assert_eq!(
            events[0],
            GameEvent::play_audio(
                AudioCue::PlayerCollision,
                ["p1".to_string(), "p2".to_string()]
            )
        );
    }

    #[test]
    fn test_dead_target_is_not_hit() {
        let mut arena = test_arena();
        arena.add_player("p1", Some(5), Some(5));
        arena.add_player("p2", Some(5), Some(5));
        set_score(&mut arena, "p2", 0);

        assert_eq!(check_player_collision(&mut arena, "p1"), 0);
        assert_eq!(arena.state().player("p1").unwrap().score, 500);
        assert!(arena.state().crystals.is_empty());
    }

    #[test]
    fn test_each_target_on_cell_is_hit() {
        let mut arena = test_arena();
        arena.add_player("p1", Some(5), Some(5));
        arena.add_player("p2", Some(5), Some(5));
        arena.add_player("p3", Some(5), Some(5));
        arena.add_player("p4", Some(9), Some(9));

        assert_eq!(check_player_collision(&mut arena, "p1"), 2);
        assert_eq!(arena.state().player("p1").unwrap().score, 300);
        assert_eq!(arena.state().player("p2").unwrap().score, 400);
        assert_eq!(arena.state().player("p3").unwrap().score, 400);
        assert_eq!(arena.state().player("p4").unwrap().score, 500);
        assert_eq!(arena.state().total_crystal_quantity(), 400);
    }
}
