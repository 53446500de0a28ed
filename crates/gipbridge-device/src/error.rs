use crate::backend::MappingMode;
use crate::guids::DeviceKind;

/// Failure to obtain an output backend.
///
/// This is the only error a session surfaces while handling frames: it means
/// the environment cannot host another virtual device, not that the input was
/// bad.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No virtual device slot is free.
    #[error("no {mode} device available for {kind}")]
    Unavailable { kind: DeviceKind, mode: MappingMode },

    /// A slot exists but could not be claimed.
    #[error("failed to acquire {mode} device for {kind}: {reason}")]
    Acquire {
        kind: DeviceKind,
        mode: MappingMode,
        reason: String,
    },
}

/// Arrival payload could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArrivalError {
    #[error("arrival payload too short ({available} bytes, need {needed})")]
    TooShort { needed: usize, available: usize },
}

/// Descriptor payload could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("descriptor payload too short ({available} bytes, need {needed})")]
    TooShort { needed: usize, available: usize },

    #[error("invalid descriptor header length {0}")]
    HeaderLength(usize),

    #[error("invalid descriptor body length {0}")]
    BodyLength(usize),

    #[error("descriptor {element} element at offset {offset} is out of bounds")]
    OutOfBounds {
        element: &'static str,
        offset: usize,
    },
}

/// Errors returned by device sessions.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Output backend acquisition failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// The session was disposed and accepts no more frames.
    #[error("device session disposed")]
    Disposed,
}

pub type Result<T> = std::result::Result<T, DeviceError>;
