//! Device sessions for the instrument command protocol.
//!
//! A [`DeviceSession`] consumes raw transport frames from one physical
//! device. It splits them into messages, reassembles chunked payloads, drops
//! retransmitted duplicates, tracks the device identity announced by Arrival
//! and Descriptor commands, and forwards everything else to the output
//! backend bound for that device.
//!
//! Output backends live outside this crate; they plug in through
//! [`BackendProvider`] and [`OutputBackend`].

pub mod arrival;
pub mod backend;
pub mod chunk;
pub mod descriptor;
pub mod error;
pub mod guids;
pub mod keystroke;
pub mod registry;
pub mod sequence;
pub mod session;

pub use arrival::{DeviceArrival, Version, ARRIVAL_SIZE};
pub use backend::{select, BackendProvider, MappingMode, NullBackend, OutputBackend};
pub use chunk::{ChunkAssembler, ChunkOutcome};
pub use descriptor::DeviceDescriptor;
pub use error::{ArrivalError, BackendError, DescriptorError, DeviceError, Result};
pub use guids::DeviceKind;
pub use keystroke::{parse_keystrokes, Keystroke, KEYCODE_LEFT_WINDOWS};
pub use registry::{DeviceId, DeviceRegistry};
pub use sequence::SequenceGuard;
pub use session::{DeviceSession, SessionConfig, SessionState, DEFAULT_MAX_MESSAGE_SIZE};
