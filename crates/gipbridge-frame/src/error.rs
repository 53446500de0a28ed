/// Errors that can occur while decoding message framing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The input ended before a complete field could be read.
    #[error("truncated input ({available} bytes, need at least {needed})")]
    Truncated { needed: usize, available: usize },

    /// A varint needed more groups than fit in 32 bits.
    #[error("varint overflows 32 bits")]
    VarintOverflow,

    /// The payload length declared by a header exceeds the bytes that follow it.
    #[error("payload too short (header declares {needed} bytes, {available} available)")]
    PayloadTooShort { needed: usize, available: usize },

    /// A length cannot be represented in the 32-bit varint field.
    #[error("length too large for the wire format ({0} bytes)")]
    LengthTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, FrameError>;
