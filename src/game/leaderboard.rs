//! Score table
//!
//! Ranks players by score for the client-side top list.

use serde::{Deserialize, Serialize};

use crate::game::state::{ArenaState, PlayerId};

/// One row of the score table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub player_id: PlayerId,
    pub nick_name: String,
    pub score: u32,
}

/// Top `limit` players, highest score first. Ties are broken by player id so
/// the table is stable between frames.
pub fn top_players(state: &ArenaState, limit: usize) -> Vec<LeaderboardEntry> {
    let mut players: Vec<_> = state.players.values().collect();
    players.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.player_id.cmp(&b.player_id))
    });

    players
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, player)| LeaderboardEntry {
            rank: (i + 1) as u32,
            player_id: player.player_id.clone(),
            nick_name: player.nick_name.clone(),
            score: player.score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Player;

    fn state_with_scores(scores: &[(&str, u32)]) -> ArenaState {
        let mut state = ArenaState::default();
        for (id, score) in scores {
            state
                .players
                .insert(id.to_string(), Player::new(id.to_string(), 0, 0, *score));
        }
        state
    }

    #[test]
    fn test_sorted_by_score() {
        let state = state_with_scores(&[("a", 10), ("b", 300), ("c", 45)]);
        let table = top_players(&state, 10);

        let ids: Vec<&str> = table.iter().map(|e| e.player_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(table[0].rank, 1);
        assert_eq!(table[2].rank, 3);
    }

    #[test]
    fn test_limit() {
        let scores: Vec<(String, u32)> = (0..15).map(|i| (format!("p{:02}", i), i)).collect();
        let refs: Vec<(&str, u32)> = scores.iter().map(|(id, s)| (id.as_str(), *s)).collect();
        let state = state_with_scores(&refs);

        let table = top_players(&state, 10);
        assert_eq!(table.len(), 10);
        assert_eq!(table[0].score, 14);
        assert_eq!(table[9].score, 5);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let state = state_with_scores(&[("zed", 50), ("amy", 50)]);
        let table = top_players(&state, 10);
        assert_eq!(table[0].player_id, "amy");
        assert_eq!(table[1].player_id, "zed");
    }

    #[test]
    fn test_empty_arena() {
        assert!(top_players(&ArenaState::default(), 10).is_empty());
    }
}
