//! Lock-free command buffer
//!
//! Transports push commands from any thread through crossbeam-channel; the
//! game loop drains them in arrival order and applies them one at a time.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::game::commands::Command;

/// Bounded MPSC queue of commands waiting for the arena
pub struct CommandBuffer {
    sender: Sender<Command>,
    receiver: Receiver<Command>,
}

impl CommandBuffer {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Clonable handle for a transport connection
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            sender: self.sender.clone(),
        }
    }

    /// Take every pending command, oldest first
    pub fn drain(&self) -> Vec<Command> {
        self.receiver.try_iter().collect()
    }
}

/// Sender handle held by each transport connection
#[derive(Clone)]
pub struct CommandSender {
    sender: Sender<Command>,
}

impl CommandSender {
    /// Queue a command without blocking
    #[inline]
    pub fn try_send(&self, command: Command) -> Result<(), CommandBufferError> {
        self.sender.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => CommandBufferError::Full,
            TrySendError::Disconnected(_) => CommandBufferError::Disconnected,
        })
    }
}

/// Command buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CommandBufferError {
    /// Buffer is full (backpressure)
    #[error("Command buffer is full")]
    Full,
    /// Game loop stopped
    #[error("Command buffer disconnected")]
    Disconnected,
}
