//! Session handler: reads one framed message from a peer and echoes it back.
//!
//! A session owns its stream for the whole exchange. It reads fixed-size
//! chunks, accumulates them until the `<EOF>` marker appears, writes the
//! entire accumulated buffer back, and shuts the stream down. There is no
//! retry and no partial response: either the full message is echoed or the
//! session ends with nothing sent. No read timeout is applied; a silent peer
//! blocks the session indefinitely.

use crate::framing::{FrameState, MessageAssembler};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Read chunk size
pub const CHUNK_SIZE: usize = 1024;

/// Errors terminating a session without an echo (except `Write`, where the
/// echo may have been partially sent before the failure).
#[derive(Debug)]
pub enum SessionError {
    /// Transport-level failure while reading.
    Read(std::io::Error),
    /// Peer closed the connection before the end marker was observed.
    IncompleteMessage { received: usize },
    /// Failure while echoing the message back.
    Write(std::io::Error),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Read(e) => write!(f, "Failed to read from client: {e}"),
            SessionError::IncompleteMessage { received } => write!(
                f,
                "Client closed the connection after {received} bytes without sending <EOF>"
            ),
            SessionError::Write(e) => write!(f, "Failed to echo message back: {e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Read(e) | SessionError::Write(e) => Some(e),
            SessionError::IncompleteMessage { .. } => None,
        }
    }
}

/// Run one complete read/echo cycle on the given stream.
///
/// Returns the echoed message on success. The stream is consumed; on the
/// success path it is shut down gracefully before being dropped, on the
/// error path it is dropped without a response.
pub async fn serve<S>(mut stream: S) -> Result<Bytes, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut assembler = MessageAssembler::new();
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let n = stream.read(&mut chunk).await.map_err(SessionError::Read)?;
        if n == 0 {
            return Err(SessionError::IncompleteMessage {
                received: assembler.len(),
            });
        }

        trace!(bytes = n, total = assembler.len() + n, "Chunk received");

        if assembler.push(&chunk[..n]) == FrameState::Complete {
            break;
        }
    }

    let message = assembler.into_message();

    stream
        .write_all(&message)
        .await
        .map_err(SessionError::Write)?;
    stream.shutdown().await.map_err(SessionError::Write)?;

    Ok(message)
}
