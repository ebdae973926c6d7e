//! Domain events and the synchronous event bus
//!
//! Every state change the arena makes is announced here. Observers are invoked
//! synchronously, in registration order, once per event. Observers receive a
//! shared reference only: they cannot reach back into the arena while it is
//! resolving a command.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::state::{CrystalId, PlayerId};

/// Players targeted by an audio cue (almost always one or two)
pub type AudioTargets = SmallVec<[PlayerId; 2]>;

/// Sound intents emitted for clients; the arena never plays audio itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioCue {
    NewCrystal,
    DrinkPot,
    Dying,
    WallCollision,
    PlayerCollision,
}

impl AudioCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioCue::NewCrystal => "newCrystal",
            AudioCue::DrinkPot => "drinkPot",
            AudioCue::Dying => "dying",
            AudioCue::WallCollision => "wallCollision",
            AudioCue::PlayerCollision => "playerCollision",
        }
    }
}

/// Events pushed to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum GameEvent {
    AddPlayer {
        player_id: PlayerId,
        nick_name: String,
        player_x: i32,
        player_y: i32,
        score: u32,
    },
    RemovePlayer {
        player_id: PlayerId,
    },
    /// Raw echo of a move command, sent before it is resolved
    MovePlayer {
        player_id: PlayerId,
        key_pressed: String,
    },
    AddCrystal {
        /// Key the crystal is stored under. An explicit id from the command is
        /// echoed as given, so it need not equal `"{crystalX}-{crystalY}"`.
        crystal_id: CrystalId,
        crystal_x: i32,
        crystal_y: i32,
        /// Quantity added by this call, not the accumulated total
        quantity: u32,
    },
    RemoveCrystal {
        crystal_id: CrystalId,
    },
    PlayAudio {
        audio: AudioCue,
        players_id: AudioTargets,
    },
}

impl GameEvent {
    /// Wire name of the event, matching the serialized `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::AddPlayer { .. } => "add-player",
            GameEvent::RemovePlayer { .. } => "remove-player",
            GameEvent::MovePlayer { .. } => "move-player",
            GameEvent::AddCrystal { .. } => "add-crystal",
            GameEvent::RemoveCrystal { .. } => "remove-crystal",
            GameEvent::PlayAudio { .. } => "play-audio",
        }
    }

    pub(crate) fn play_audio<I>(audio: AudioCue, players: I) -> Self
    where
        I: IntoIterator<Item = PlayerId>,
    {
        GameEvent::PlayAudio {
            audio,
            players_id: players.into_iter().collect(),
        }
    }
}

/// Callback registered on the bus
pub type Observer = Box<dyn FnMut(&GameEvent) + Send>;

/// Fan-out of events to every registered observer.
///
/// Subscriptions are permanent; there is no unsubscribe.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Observer>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. It will see every event emitted after this call.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&GameEvent) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Deliver an event to all observers in registration order
    pub fn notify_all(&mut self, event: GameEvent) {
        tracing::trace!(kind = event.kind(), observers = self.observers.len(), "notify");
        for observer in self.observers.iter_mut() {
            observer(&event);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}
