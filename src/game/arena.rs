//! The arena: authoritative state plus every command handler
//!
//! An `Arena` is an owned value, not a global. Whoever drives it must serialize
//! access: each handler runs to completion, including nested collisions and
//! explosions, before the next command is applied.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::game::commands::{Command, Direction, MoveOutcome, PlaceCrystalRequest};
use crate::game::constants::spawn;
use crate::game::events::{AudioCue, EventBus, GameEvent};
use crate::game::spatial::players_around;
use crate::game::state::{
    crystal_id, ArenaConfig, ArenaState, Crystal, CrystalId, Player, PlayerId, Screen, StatePatch,
};
use crate::game::systems::{collision, movement};

pub struct Arena {
    pub(crate) state: ArenaState,
    pub(crate) bus: EventBus,
    pub(crate) rng: StdRng,
}

impl Arena {
    pub fn new(screen: Screen, config: ArenaConfig) -> Self {
        Self::with_rng(screen, config, StdRng::from_entropy())
    }

    /// Arena with a deterministic random source, for tests and replays
    pub fn with_seed(screen: Screen, config: ArenaConfig, seed: u64) -> Self {
        Self::with_rng(screen, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(screen: Screen, config: ArenaConfig, rng: StdRng) -> Self {
        Self {
            state: ArenaState::new(screen, config),
            bus: EventBus::new(),
            rng,
        }
    }

    /// Read-only view for renderers and transports
    pub fn state(&self) -> &ArenaState {
        &self.state
    }

    /// Register an observer for every event emitted from now on
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&GameEvent) + Send + 'static,
    {
        self.bus.subscribe(observer);
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.bus.notify_all(event);
    }

    /// Seed the opening crystals.
    ///
    /// The recurring spawn is driven from outside (see `GameLoop`), which calls
    /// `spawn_crystal` on its own schedule.
    pub fn start(&mut self) {
        self.seed_crystals(spawn::INITIAL_CRYSTALS);
    }

    pub fn seed_crystals(&mut self, count: usize) {
        for _ in 0..count {
            self.spawn_crystal();
        }
        info!(
            count,
            crystals = self.state.crystals.len(),
            "Arena started"
        );
    }

    /// Drop one auto-valued crystal on a random cell
    pub fn spawn_crystal(&mut self) -> Option<CrystalId> {
        self.add_crystal(PlaceCrystalRequest::Auto)
    }

    /// Shallow-merge a partial state (replay / test setup)
    pub fn set_state(&mut self, patch: StatePatch) {
        debug!(
            screen = patch.screen.is_some(),
            config = patch.config.is_some(),
            players = patch.players.as_ref().map(|p| p.len()),
            crystals = patch.crystals.as_ref().map(|c| c.len()),
            "Merging state"
        );
        self.state.merge(patch);
    }

    /// Full copy of the current state, in `set-state` shape
    pub fn snapshot(&self) -> StatePatch {
        StatePatch::from(self.state.clone())
    }

    /// Dispatch a wire command to its handler
    pub fn apply(&mut self, command: Command) {
        trace!(kind = command.kind(), "Applying command");
        match command {
            Command::AddPlayer {
                player_id,
                player_x,
                player_y,
            } => self.add_player(&player_id, player_x, player_y),
            Command::RemovePlayer { player_id } => {
                self.remove_player(&player_id);
            }
            Command::MovePlayer {
                player_id,
                key_pressed,
            } => self.move_player(&player_id, &key_pressed),
            Command::AddCrystal {
                crystal_id,
                crystal_x,
                crystal_y,
                quantity,
            } => {
                let request = PlaceCrystalRequest::from_fields(
                    crystal_id,
                    crystal_x,
                    crystal_y,
                    quantity,
                    self.state.config.auto_drop_crystal_value,
                );
                self.add_crystal(request);
            }
            Command::RemoveCrystal {
                crystal_id,
                player_id,
            } => {
                self.remove_crystal(&crystal_id, &player_id);
            }
            Command::SetState(patch) => self.set_state(patch),
        }
    }

    /// Create (or overwrite) a player. Missing coordinates are drawn at random.
    pub fn add_player(&mut self, player_id: &str, x: Option<i32>, y: Option<i32>) {
        let Screen { width, height, .. } = self.state.screen;
        let x = match x {
            Some(x) => x,
            None => self.random_coordinate(width),
        };
        let y = match y {
            Some(y) => y,
            None => self.random_coordinate(height),
        };
        let score = self.state.config.initial_score;

        let player = Player::new(player_id.to_string(), x, y, score);
        let nick_name = player.nick_name.clone();
        if self
            .state
            .players
            .insert(player_id.to_string(), player)
            .is_some()
        {
            debug!(player_id, "Overwriting existing player");
        }

        info!(player_id, x, y, "Player joined");
        self.emit(GameEvent::AddPlayer {
            player_id: player_id.to_string(),
            nick_name,
            player_x: x,
            player_y: y,
            score,
        });
    }

    /// Remove a player; absent ids are not an error
    pub fn remove_player(&mut self, player_id: &str) -> Option<Player> {
        let removed = self.state.players.remove(player_id);
        if removed.is_some() {
            info!(player_id, "Player left");
        }

        self.emit(GameEvent::RemovePlayer {
            player_id: player_id.to_string(),
        });
        removed
    }

    /// Echo the raw move, then resolve it.
    ///
    /// Unknown keys, unknown players and dead players are silently ignored
    /// after the echo.
    pub fn move_player(&mut self, player_id: &str, key_pressed: &str) {
        self.emit(GameEvent::MovePlayer {
            player_id: player_id.to_string(),
            key_pressed: key_pressed.to_string(),
        });

        let Some(direction) = Direction::from_key(key_pressed) else {
            debug!(player_id, key_pressed, "Ignoring unknown key");
            return;
        };
        let Some(player) = self.state.players.get(player_id) else {
            debug!(player_id, "Ignoring move for unknown player");
            return;
        };
        if !player.is_alive() {
            trace!(player_id, "Dead player cannot move");
            return;
        }

        match movement::apply_direction(direction, player, &self.state.screen) {
            MoveOutcome::Moved { x, y } => {
                if let Some(player) = self.state.players.get_mut(player_id) {
                    player.x = x;
                    player.y = y;
                }
            }
            MoveOutcome::Blocked => {
                collision::on_border_shock(self, player_id);
            }
        }

        collision::check_crystal_collision(self, player_id);
        collision::check_player_collision(self, player_id);
    }

    /// Place a crystal, accumulating onto any crystal already under that id.
    ///
    /// Announces the spawn sound to nearby players, then the placement with the
    /// quantity added by this call. Returns the id used, or `None` for an empty
    /// placement.
    pub fn add_crystal(&mut self, request: PlaceCrystalRequest) -> Option<CrystalId> {
        let (crystal_id, x, y, quantity) = match request {
            PlaceCrystalRequest::Auto => {
                let Screen { width, height, .. } = self.state.screen;
                let x = self.random_coordinate(width);
                let y = self.random_coordinate(height);
                (
                    crystal_id(x, y),
                    x,
                    y,
                    self.state.config.auto_drop_crystal_value,
                )
            }
            PlaceCrystalRequest::Explicit {
                crystal_id,
                x,
                y,
                quantity,
            } => (crystal_id, x, y, quantity),
        };

        if quantity == 0 {
            debug!(crystal_id = crystal_id.as_str(), "Ignoring empty crystal");
            return None;
        }

        let crystal = self
            .state
            .crystals
            .entry(crystal_id.clone())
            .and_modify(|crystal| {
                crystal.x = x;
                crystal.y = y;
                crystal.quantity = crystal.quantity.saturating_add(quantity);
            })
            .or_insert(Crystal { x, y, quantity });
        let total = crystal.quantity;

        let listeners = players_around(&self.state, x, y);
        trace!(
            crystal_id = crystal_id.as_str(),
            x,
            y,
            quantity,
            total,
            listeners = listeners.len(),
            "Crystal placed"
        );

        self.emit(GameEvent::play_audio(AudioCue::NewCrystal, listeners));
        self.emit(GameEvent::AddCrystal {
            crystal_id: crystal_id.clone(),
            crystal_x: x,
            crystal_y: y,
            quantity,
        });

        Some(crystal_id)
    }

    /// Remove a crystal on behalf of the player who drank it.
    ///
    /// Events are emitted even when the id is unknown.
    pub fn remove_crystal(&mut self, crystal_id: &str, player_id: &str) -> Option<Crystal> {
        let removed = self.state.crystals.remove(crystal_id);

        self.emit(GameEvent::play_audio(
            AudioCue::DrinkPot,
            [player_id.to_string()],
        ));
        self.emit(GameEvent::RemoveCrystal {
            crystal_id: crystal_id.to_string(),
        });
        removed
    }

    /// Players within `max_collision_distance` of a cell
    pub fn players_around(&self, x: i32, y: i32) -> Vec<PlayerId> {
        players_around(&self.state, x, y)
    }

    fn random_coordinate(&mut self, extent: i32) -> i32 {
        if extent > 0 {
            self.rng.gen_range(0..extent)
        } else {
            0
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(Screen::default(), ArenaConfig::default())
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("state", &self.state)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}
