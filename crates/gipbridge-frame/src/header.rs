use bitflags::bitflags;
use bytes::{BufMut, BytesMut};

use crate::command::CommandId;
use crate::error::{FrameError, Result};
use crate::varint::{decode_varint, encode_varint, encoded_len};

/// Fixed prefix: command (1) + flags (1) + sequence (1).
pub const PREFIX_SIZE: usize = 3;

/// Smallest possible header: prefix plus a one-byte length.
pub const MIN_HEADER_SIZE: usize = PREFIX_SIZE + 1;

bitflags! {
    /// Header option bits.
    ///
    /// The low nibble is reserved. Reserved bits are kept as received so a
    /// decoded header re-encodes to the same bytes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        /// Sender expects an acknowledgement. Observed, never acted upon.
        const NEEDS_ACKNOWLEDGEMENT = 0x10;
        /// System-level command.
        const SYSTEM_COMMAND = 0x20;
        /// First fragment of a chunked message.
        const CHUNK_START = 0x40;
        /// Payload begins with a chunk index varint.
        const CHUNK_PACKET = 0x80;
    }
}

/// Decoded message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub command: CommandId,
    pub flags: Flags,
    pub sequence: u8,
    /// Payload length in bytes, as declared on the wire.
    pub data_length: usize,
}

impl Header {
    /// Create a header.
    pub fn new(command: CommandId, flags: Flags, sequence: u8, data_length: usize) -> Self {
        Self {
            command,
            flags,
            sequence,
            data_length,
        }
    }

    /// Encoded size of this header.
    pub fn wire_size(&self) -> usize {
        PREFIX_SIZE + encoded_len(u32::try_from(self.data_length).unwrap_or(u32::MAX))
    }

    pub fn is_chunked(&self) -> bool {
        self.flags.contains(Flags::CHUNK_PACKET)
    }

    pub fn is_chunk_start(&self) -> bool {
        self.flags.contains(Flags::CHUNK_START)
    }
}

/// Decode a header from the front of `src`.
///
/// Returns the header and the number of bytes it occupied. This does not
/// check that `data_length` bytes actually follow; callers slicing the
/// payload must do that themselves.
///
/// Wire format:
/// ```text
/// ┌───────────┬──────────┬──────────┬────────────────────┐
/// │ Command   │ Flags    │ Sequence │ Length             │
/// │ (1B)      │ (1B)     │ (1B)     │ (LEB128, 1-5B)     │
/// └───────────┴──────────┴──────────┴────────────────────┘
/// ```
pub fn decode_header(src: &[u8]) -> Result<(Header, usize)> {
    if src.len() < MIN_HEADER_SIZE {
        return Err(FrameError::Truncated {
            needed: MIN_HEADER_SIZE,
            available: src.len(),
        });
    }

    let (data_length, length_size) = decode_varint(&src[PREFIX_SIZE..])?;
    let header = Header {
        command: CommandId(src[0]),
        flags: Flags::from_bits_retain(src[1]),
        sequence: src[2],
        data_length: data_length as usize,
    };

    Ok((header, PREFIX_SIZE + length_size))
}

/// Encode a header into the wire format.
pub fn encode_header(header: &Header, dst: &mut BytesMut) -> Result<()> {
    let length = u32::try_from(header.data_length)
        .map_err(|_| FrameError::LengthTooLarge(header.data_length))?;
    dst.reserve(header.wire_size());
    dst.put_u8(header.command.as_u8());
    dst.put_u8(header.flags.bits());
    dst.put_u8(header.sequence);
    encode_varint(length, dst);
    Ok(())
}

/// Encode a complete message, deriving the header length from `payload`.
pub fn encode_message(
    command: CommandId,
    flags: Flags,
    sequence: u8,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let header = Header::new(command, flags, sequence, payload.len());
    encode_header(&header, dst)?;
    dst.put_slice(payload);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_input_header() {
        let (header, used) = decode_header(&[0x20, 0x00, 0x05, 0x03]).unwrap();
        assert_eq!(header.command, CommandId::INPUT);
        assert_eq!(header.flags, Flags::empty());
        assert_eq!(header.sequence, 5);
        assert_eq!(header.data_length, 3);
        assert_eq!(used, 4);
    }

    #[test]
    fn decode_multi_byte_length() {
        let (header, used) = decode_header(&[0x04, 0xF0, 0x01, 0xB6, 0x01]).unwrap();
        assert_eq!(header.command, CommandId::DESCRIPTOR);
        assert!(header.is_chunked());
        assert!(header.is_chunk_start());
        assert!(header.flags.contains(Flags::SYSTEM_COMMAND));
        assert!(header.flags.contains(Flags::NEEDS_ACKNOWLEDGEMENT));
        assert_eq!(header.data_length, 182);
        assert_eq!(used, 5);
        assert_eq!(header.wire_size(), used);
    }

    #[test]
    fn decode_too_short() {
        assert!(matches!(
            decode_header(&[0x20, 0x00, 0x05]),
            Err(FrameError::Truncated { needed: 4, available: 3 })
        ));
    }

    #[test]
    fn decode_unterminated_length() {
        assert!(matches!(
            decode_header(&[0x20, 0x00, 0x05, 0x80]),
            Err(FrameError::Truncated { .. })
        ));
    }

    #[test]
    fn reserved_flag_bits_survive() {
        let (header, _) = decode_header(&[0x20, 0x83, 0x00, 0x00]).unwrap();
        assert!(header.is_chunked());
        assert_eq!(header.flags.bits(), 0x83);

        let mut buf = BytesMut::new();
        encode_header(&header, &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0x20, 0x83, 0x00, 0x00]);
    }

    #[test]
    fn flag_bit_values() {
        assert_eq!(Flags::NEEDS_ACKNOWLEDGEMENT.bits(), 0x10);
        assert_eq!(Flags::SYSTEM_COMMAND.bits(), 0x20);
        assert_eq!(Flags::CHUNK_START.bits(), 0x40);
        assert_eq!(Flags::CHUNK_PACKET.bits(), 0x80);
    }

    #[test]
    fn encode_message_layout() {
        let mut buf = BytesMut::new();
        encode_message(CommandId::INPUT, Flags::empty(), 9, &[1, 2, 3], &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0x20, 0x00, 0x09, 0x03, 1, 2, 3]);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn encode_rejects_oversized_length() {
        let header = Header::new(CommandId::INPUT, Flags::empty(), 0, u32::MAX as usize + 1);
        let mut buf = BytesMut::new();
        assert!(matches!(
            encode_header(&header, &mut buf),
            Err(FrameError::LengthTooLarge(_))
        ));
        assert!(buf.is_empty());
    }
}
