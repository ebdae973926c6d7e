//! Line framing for the JSON protocol
//!
//! One message per `\n`-terminated line. Lines over `MAX_MESSAGE_SIZE` are
//! rejected rather than buffered without bound.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted line, in bytes (a full setup snapshot fits comfortably)
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Errors that can occur during message framing
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Message too large: {0} bytes (max {1})")]
    MessageTooLarge(usize, usize),
    #[error("Message is not valid UTF-8")]
    InvalidUtf8,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Read one line, without its terminator
pub async fn read_message<R: AsyncBufRead + Unpin>(stream: &mut R) -> Result<String, FramingError> {
    let mut buf = Vec::new();
    let read = (&mut *stream)
        .take(MAX_MESSAGE_SIZE as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;

    if read == 0 {
        return Err(FramingError::ConnectionClosed);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if buf.len() > MAX_MESSAGE_SIZE {
        return Err(FramingError::MessageTooLarge(buf.len(), MAX_MESSAGE_SIZE));
    }

    String::from_utf8(buf).map_err(|_| FramingError::InvalidUtf8)
}

/// Write one line and flush
pub async fn write_message<W: AsyncWrite + Unpin>(
    stream: &mut W,
    line: &str,
) -> Result<(), FramingError> {
    if line.len() > MAX_MESSAGE_SIZE {
        return Err(FramingError::MessageTooLarge(line.len(), MAX_MESSAGE_SIZE));
    }

    stream.write_all(line.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_read_lines() {
        let data: &[u8] = b"{\"a\":1}\r\n{\"b\":2}\nlast";
        let mut reader = BufReader::new(data);

        assert_eq!(read_message(&mut reader).await.unwrap(), "{\"a\":1}");
        assert_eq!(read_message(&mut reader).await.unwrap(), "{\"b\":2}");
        assert_eq!(read_message(&mut reader).await.unwrap(), "last");
        assert!(matches!(
            read_message(&mut reader).await,
            Err(FramingError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_oversized_line_rejected() {
        let data = vec![b'x'; MAX_MESSAGE_SIZE + 10];
        let mut reader = BufReader::new(data.as_slice());

        assert!(matches!(
            read_message(&mut reader).await,
            Err(FramingError::MessageTooLarge(_, MAX_MESSAGE_SIZE))
        ));
    }

    #[tokio::test]
    async fn test_write_appends_newline() {
        let mut out = Vec::new();
        write_message(&mut out, "hello").await.unwrap();
        write_message(&mut out, "world").await.unwrap();
        assert_eq!(out, b"hello\nworld\n");
    }
}
