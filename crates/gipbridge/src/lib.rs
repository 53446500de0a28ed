//! Decode instrument controller command streams and route them to virtual
//! input devices.
//!
//! # Crate Structure
//!
//! - [`frame`]: Varint header codec and frame demultiplexing
//! - [`device`]: Device sessions, chunk reassembly, duplicate filtering and
//!   output backend binding

/// Re-export frame types.
pub mod frame {
    pub use gipbridge_frame::*;
}

/// Re-export device types.
pub mod device {
    pub use gipbridge_device::*;
}
