//! Reassembly of chunked message payloads.
//!
//! A chunked payload starts with a varint index. Its meaning depends on the
//! fragment:
//! - `0`: the message is not actually fragmented; the rest is the payload.
//! - on a chunk-start fragment: the total size of the message being sent.
//!   The fragment's data lands at offset zero.
//! - on later fragments: the offset the fragment's data lands at.
//! - `>=` the buffer size: end of the sequence, normally with no data.
//!
//! Fragments must arrive in order. A fragment that starts past the bytes
//! received so far leaves a hole, and the completed message reports only the
//! contiguous prefix as filled.

use gipbridge_frame::{decode_varint, Header};
use tracing::{trace, warn};

/// Result of feeding one chunk-flagged payload to a [`ChunkAssembler`].
#[derive(Debug, PartialEq, Eq)]
pub enum ChunkOutcome<'a> {
    /// Index zero: handle `payload` as a normal message.
    ///
    /// `expected_len` is the payload length implied by the header.
    Single {
        payload: &'a [u8],
        expected_len: usize,
    },

    /// The sequence finished. `expected_len` is the length of the contiguous
    /// prefix fragments filled; it differs from `payload.len()` when a
    /// fragment was lost.
    Complete {
        payload: Vec<u8>,
        expected_len: usize,
    },

    /// Fragment stored; nothing to process until the sequence completes.
    Pending,

    /// Fragment rejected.
    Dropped,
}

#[derive(Debug)]
struct ReassemblyBuffer {
    data: Vec<u8>,
    /// End of the contiguous prefix written from offset zero.
    filled: usize,
}

/// Per-session reassembly state.
#[derive(Debug)]
pub struct ChunkAssembler {
    buffer: Option<ReassemblyBuffer>,
    max_message_size: usize,
}

impl ChunkAssembler {
    /// Create an assembler that refuses messages larger than `max_message_size`.
    pub fn new(max_message_size: usize) -> Self {
        Self {
            buffer: None,
            max_message_size,
        }
    }

    /// Returns true while a fragmented message is being assembled.
    pub fn in_progress(&self) -> bool {
        self.buffer.is_some()
    }

    /// Total size of the message being assembled.
    pub fn pending_len(&self) -> Option<usize> {
        self.buffer.as_ref().map(|buffer| buffer.data.len())
    }

    /// Drop any partially assembled message.
    pub fn reset(&mut self) {
        self.buffer = None;
    }

    /// Feed the payload of a message whose header carries the chunk flag.
    pub fn accept<'a>(&mut self, header: &Header, payload: &'a [u8]) -> ChunkOutcome<'a> {
        let (index, index_len) = match decode_varint(payload) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(command = %header.command, error = %err, "invalid chunk index");
                return ChunkOutcome::Dropped;
            }
        };
        let index = index as usize;
        let tail = &payload[index_len..];

        if index == 0 {
            return ChunkOutcome::Single {
                payload: tail,
                expected_len: header.data_length.saturating_sub(index_len),
            };
        }

        if let Some(buffer) = self.buffer.take_if(|buffer| index >= buffer.data.len()) {
            if !tail.is_empty() {
                warn!(
                    command = %header.command,
                    trailing = tail.len(),
                    "chunk completion carries unexpected data"
                );
            }
            trace!(command = %header.command, len = buffer.data.len(), "chunk sequence complete");
            return ChunkOutcome::Complete {
                expected_len: buffer.filled,
                payload: buffer.data,
            };
        }

        let offset = if header.is_chunk_start() {
            if index > self.max_message_size {
                warn!(
                    command = %header.command,
                    size = index,
                    max = self.max_message_size,
                    "chunked message too large"
                );
                self.buffer = None;
                return ChunkOutcome::Dropped;
            }
            if let Some(previous) = &self.buffer {
                warn!(
                    command = %header.command,
                    abandoned = previous.data.len(),
                    "chunk start while a sequence is in progress"
                );
            }
            self.buffer = Some(ReassemblyBuffer {
                data: vec![0; index],
                filled: 0,
            });
            0
        } else {
            index
        };

        let Some(buffer) = self.buffer.as_mut() else {
            warn!(command = %header.command, index, "chunk fragment without a chunk start");
            return ChunkOutcome::Dropped;
        };

        let end = offset + tail.len();
        if end > buffer.data.len() {
            warn!(
                command = %header.command,
                offset,
                len = tail.len(),
                size = buffer.data.len(),
                "chunk fragment overruns buffer"
            );
            return ChunkOutcome::Dropped;
        }

        if offset > buffer.filled {
            warn!(
                command = %header.command,
                offset,
                filled = buffer.filled,
                "chunk fragment leaves a gap"
            );
        } else {
            buffer.filled = buffer.filled.max(end);
        }
        buffer.data[offset..end].copy_from_slice(tail);
        ChunkOutcome::Pending
    }
}
