//! Wire-level framing for the instrument command protocol.
//!
//! Every message inside a transport frame is laid out as:
//! - A 1-byte command id
//! - A 1-byte flag set (acknowledgement, system, chunk start, chunk packet)
//! - A 1-byte sequence count
//! - An unsigned LEB128 payload length
//!
//! A single transport frame may carry several messages back to back; see
//! [`Messages`] for splitting them.

pub mod command;
pub mod demux;
pub mod error;
pub mod header;
pub mod varint;

pub use command::CommandId;
pub use demux::{split_messages, Message, Messages};
pub use error::{FrameError, Result};
pub use header::{
    decode_header, encode_header, encode_message, Flags, Header, MIN_HEADER_SIZE, PREFIX_SIZE,
};
pub use varint::{decode_varint, encode_varint, encoded_len, MAX_VARINT_LEN};
