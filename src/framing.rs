//! Message framing over a raw byte stream.
//!
//! A message ends when the literal marker `<EOF>` appears anywhere in the
//! accumulated stream. There is no length prefix and no escaping: a payload
//! that itself contains `<EOF>` ends the message early. The marker (and any
//! bytes that arrived after it in the same chunk) stays part of the message.

use bytes::{Bytes, BytesMut};

/// End-of-message marker.
pub const END_MARKER: &[u8] = b"<EOF>";

/// Framing state after appending a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Marker not seen yet; keep reading.
    Reading,
    /// Marker found; the accumulated buffer is the complete message.
    Complete,
}

/// Accumulates received chunks and detects the end marker.
///
/// Bytes are appended strictly in arrival order and never truncated; the
/// buffer is consumed whole once the message completes. Every append rescans
/// the entire accumulated buffer, so a marker split across reads is still
/// found.
#[derive(Debug, Default)]
pub struct MessageAssembler {
    buffer: BytesMut,
}

impl MessageAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        MessageAssembler {
            buffer: BytesMut::with_capacity(1024),
        }
    }

    /// Append one chunk of received bytes and rescan for the marker.
    pub fn push(&mut self, chunk: &[u8]) -> FrameState {
        self.buffer.extend_from_slice(chunk);
        if find_marker(&self.buffer).is_some() {
            FrameState::Complete
        } else {
            FrameState::Reading
        }
    }

    /// Number of bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True if nothing has been received yet.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Take the completed message, marker and any trailing bytes included.
    pub fn into_message(self) -> Bytes {
        self.buffer.freeze()
    }
}

/// Find the end marker, returning the offset of its first byte.
fn find_marker(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(END_MARKER.len())
        .position(|window| window == END_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_in_single_chunk() {
        let mut assembler = MessageAssembler::new();
        assert_eq!(assembler.push(b"hello world<EOF>"), FrameState::Complete);
        assert_eq!(&assembler.into_message()[..], b"hello world<EOF>");
    }

    #[test]
    fn test_no_marker_keeps_reading() {
        let mut assembler = MessageAssembler::new();
        assert_eq!(assembler.push(b"hello"), FrameState::Reading);
        assert_eq!(assembler.push(b" world"), FrameState::Reading);
        assert_eq!(assembler.len(), 11);
    }

    #[test]
    fn test_marker_split_across_chunks() {
        let mut assembler = MessageAssembler::new();
        assert_eq!(assembler.push(b"data<E"), FrameState::Reading);
        assert_eq!(assembler.push(b"OF>"), FrameState::Complete);
        assert_eq!(&assembler.into_message()[..], b"data<EOF>");
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut assembler = MessageAssembler::new();
        let payload = b"abc<EOF>";
        for (i, byte) in payload.iter().enumerate() {
            let state = assembler.push(std::slice::from_ref(byte));
            if i < payload.len() - 1 {
                assert_eq!(state, FrameState::Reading);
            } else {
                assert_eq!(state, FrameState::Complete);
            }
        }
        assert_eq!(&assembler.into_message()[..], payload);
    }

    #[test]
    fn test_trailing_bytes_after_marker_retained() {
        let mut assembler = MessageAssembler::new();
        assert_eq!(assembler.push(b"msg<EOF>extra"), FrameState::Complete);
        assert_eq!(&assembler.into_message()[..], b"msg<EOF>extra");
    }

    #[test]
    fn test_partial_marker_alone_is_not_complete() {
        let mut assembler = MessageAssembler::new();
        assert_eq!(assembler.push(b"<EOF"), FrameState::Reading);
        assert_eq!(assembler.push(b">"), FrameState::Complete);
    }

    #[test]
    fn test_empty_assembler() {
        let assembler = MessageAssembler::new();
        assert!(assembler.is_empty());
        assert_eq!(assembler.len(), 0);
    }
}
