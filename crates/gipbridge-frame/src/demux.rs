use tracing::trace;

use crate::error::{FrameError, Result};
use crate::header::{decode_header, Header};

/// One message sliced out of a transport frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    pub header: Header,
    /// Bytes the header took on the wire. Longer than
    /// [`Header::wire_size`] when the length used a padded varint.
    pub header_len: usize,
    /// Exactly `header.data_length` bytes.
    pub payload: &'a [u8],
}

/// Splits a transport frame into its back-to-back messages.
///
/// Iteration stops at the first header that fails to decode or whose payload
/// runs past the end of the frame. Whatever is left at that point is
/// discarded; [`Messages::discarded`] reports how many bytes that was.
#[derive(Debug, Clone)]
pub struct Messages<'a> {
    remaining: &'a [u8],
    discarded: usize,
}

impl<'a> Messages<'a> {
    /// Start splitting `frame`.
    pub fn new(frame: &'a [u8]) -> Self {
        Self {
            remaining: frame,
            discarded: 0,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        self.remaining
    }

    /// Trailing bytes dropped because they did not hold a complete message.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    fn next_message(&self) -> Result<(Message<'a>, usize)> {
        let (header, header_len) = decode_header(self.remaining)?;
        let available = self.remaining.len() - header_len;
        if available < header.data_length {
            return Err(FrameError::PayloadTooShort {
                needed: header.data_length,
                available,
            });
        }

        let end = header_len + header.data_length;
        let payload = &self.remaining[header_len..end];
        Ok((
            Message {
                header,
                header_len,
                payload,
            },
            end,
        ))
    }
}

impl<'a> Iterator for Messages<'a> {
    type Item = Message<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }

        match self.next_message() {
            Ok((message, consumed)) => {
                self.remaining = &self.remaining[consumed..];
                Some(message)
            }
            Err(err) => {
                trace!(
                    bytes = self.remaining.len(),
                    error = %err,
                    "discarding incomplete frame tail"
                );
                self.discarded = self.remaining.len();
                self.remaining = &[];
                None
            }
        }
    }
}

impl std::iter::FusedIterator for Messages<'_> {}

/// Split `frame` into messages.
pub fn split_messages(frame: &[u8]) -> Messages<'_> {
    Messages::new(frame)
}
