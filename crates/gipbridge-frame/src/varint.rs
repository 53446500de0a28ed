//! Unsigned LEB128 varints, capped at 32 bits.

use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Maximum encoded length of a 32-bit varint (5 groups of 7 bits).
pub const MAX_VARINT_LEN: usize = 5;

const CONTINUATION: u8 = 0x80;
const GROUP_MASK: u8 = 0x7F;

/// Bits the fifth group may carry without overflowing a `u32`.
const LAST_GROUP_MASK: u8 = 0x0F;

/// Decode a varint from the front of `src`.
///
/// Returns the value and the number of bytes consumed. Bytes past the
/// terminating group are never read.
pub fn decode_varint(src: &[u8]) -> Result<(u32, usize)> {
    let mut value = 0u32;

    for (i, &byte) in src.iter().take(MAX_VARINT_LEN).enumerate() {
        let group = byte & GROUP_MASK;
        if i == MAX_VARINT_LEN - 1 && (group & !LAST_GROUP_MASK != 0 || byte & CONTINUATION != 0) {
            return Err(FrameError::VarintOverflow);
        }

        value |= u32::from(group) << (7 * i);
        if byte & CONTINUATION == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(FrameError::Truncated {
        needed: src.len() + 1,
        available: src.len(),
    })
}

/// Append the minimal encoding of `value` to `dst`, returning its length.
pub fn encode_varint(mut value: u32, dst: &mut BytesMut) -> usize {
    let len = encoded_len(value);
    dst.reserve(len);
    loop {
        let group = (value as u8) & GROUP_MASK;
        value >>= 7;
        if value == 0 {
            dst.put_u8(group);
            return len;
        }
        dst.put_u8(group | CONTINUATION);
    }
}

/// Number of bytes [`encode_varint`] writes for `value`.
pub fn encoded_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}
