//! Stream connection bridge
//!
//! Connects one line-framed byte stream to the arena: inbound lines become
//! queued commands, outbound events become lines. Used by the host binary over
//! stdin/stdout; any tokio stream works.

use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::game::command_buffer::{CommandBufferError, CommandSender};
use crate::game::events::GameEvent;
use crate::net::framing::{read_message, write_message, FramingError};
use crate::net::protocol::{decode_command, encode, ServerMessage};

/// Totals for one inbound stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboundStats {
    /// Commands handed to the game loop
    pub accepted: u64,
    /// Lines that did not decode
    pub malformed: u64,
    /// Commands dropped because the buffer was full
    pub dropped: u64,
}

/// Read commands until the stream closes or the game loop goes away
pub async fn pump_commands<R: AsyncBufRead + Unpin>(
    mut reader: R,
    sender: CommandSender,
) -> Result<InboundStats, FramingError> {
    let mut stats = InboundStats::default();

    loop {
        let line = match read_message(&mut reader).await {
            Ok(line) => line,
            Err(FramingError::ConnectionClosed) => break,
            Err(e) => return Err(e),
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match decode_command(&line) {
            Ok(command) => command,
            Err(e) => {
                warn!("Ignoring malformed command: {}", e);
                stats.malformed += 1;
                continue;
            }
        };

        match sender.try_send(command) {
            Ok(()) => stats.accepted += 1,
            Err(CommandBufferError::Full) => {
                warn!("Command buffer full, dropping command");
                stats.dropped += 1;
            }
            Err(CommandBufferError::Disconnected) => {
                debug!("Game loop stopped, closing inbound stream");
                break;
            }
        }
    }

    Ok(stats)
}

/// Observer forwarding every arena event to an outbound channel.
///
/// Sending never blocks the arena; a closed channel is ignored.
pub fn event_forwarder(
    outbound: UnboundedSender<ServerMessage>,
) -> impl FnMut(&GameEvent) + Send + 'static {
    move |event| {
        let _ = outbound.send(ServerMessage::Event(event.clone()));
    }
}

/// Write outbound messages until every sender is dropped.
///
/// Returns the number of lines written.
pub async fn pump_messages<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut outbound: UnboundedReceiver<ServerMessage>,
) -> Result<u64, FramingError> {
    let mut written = 0;

    while let Some(message) = outbound.recv().await {
        let line = match encode(&message) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to encode outbound message: {}", e);
                continue;
            }
        };
        write_message(&mut writer, &line).await?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::command_buffer::CommandBuffer;
    use crate::game::commands::Command;
    use tokio::io::BufReader;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn test_pump_commands() {
        let buffer = CommandBuffer::new(10);
        let input: &[u8] = b"{\"type\":\"add-player\",\"playerId\":\"p1\",\"playerX\":1,\"playerY\":2}\n\
            garbage\n\
            \n\
            {\"type\":\"remove-player\",\"playerId\":\"p1\"}\n";

        let stats = pump_commands(BufReader::new(input), buffer.sender())
            .await
            .unwrap();

        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.malformed, 1);
        let commands = buffer.drain();
        assert_eq!(
            commands[0],
            Command::AddPlayer {
                player_id: "p1".to_string(),
                player_x: Some(1),
                player_y: Some(2),
            }
        );
        assert_eq!(commands[1].kind(), "remove-player");
    }

    #[tokio::test]
    async fn test_pump_commands_counts_drops() {
        let buffer = CommandBuffer::new(1);
        let input: &[u8] = b"{\"type\":\"remove-player\",\"playerId\":\"a\"}\n\
            {\"type\":\"remove-player\",\"playerId\":\"b\"}\n";

        let stats = pump_commands(BufReader::new(input), buffer.sender())
            .await
            .unwrap();

        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.dropped, 1);
    }

    #[tokio::test]
    async fn test_forward_and_write_events() {
        let (tx, rx) = unbounded_channel();
        let mut forward = event_forwarder(tx);

        forward(&GameEvent::RemovePlayer {
            player_id: "p1".to_string(),
        });
        drop(forward);

        let mut out = Vec::new();
        let written = pump_messages(&mut out, rx).await.unwrap();

        assert_eq!(written, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"type\":\"remove-player\",\"playerId\":\"p1\"}\n"
        );
    }
}
