//! Arrival command payload.
//!
//! # Layout
//! | Offset | Size | Field            | Encoding         |
//! |--------|------|------------------|------------------|
//! | 0      | 8    | serial           | u64 LE           |
//! | 8      | 2    | vendor id        | u16 LE           |
//! | 10     | 2    | product id       | u16 LE           |
//! | 12     | 8    | firmware version | 4 × u16 LE       |
//! | 20     | 8    | hardware version | 4 × u16 LE       |

use std::fmt;

use crate::error::ArrivalError;

/// Size of the fixed arrival structure.
pub const ARRIVAL_SIZE: usize = 28;

/// Four-part version number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl Version {
    fn from_le(bytes: &[u8]) -> Self {
        Self {
            major: read_u16(bytes, 0),
            minor: read_u16(bytes, 2),
            build: read_u16(bytes, 4),
            revision: read_u16(bytes, 6),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Identity announced by a device when it connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceArrival {
    pub serial: u64,
    pub vendor_id: u16,
    pub product_id: u16,
    pub firmware: Version,
    pub hardware: Version,
}

impl DeviceArrival {
    /// Parse an arrival payload. Bytes past [`ARRIVAL_SIZE`] are ignored.
    pub fn parse(data: &[u8]) -> Result<Self, ArrivalError> {
        if data.len() < ARRIVAL_SIZE {
            return Err(ArrivalError::TooShort {
                needed: ARRIVAL_SIZE,
                available: data.len(),
            });
        }

        let mut serial = [0u8; 8];
        serial.copy_from_slice(&data[0..8]);

        Ok(Self {
            serial: u64::from_le_bytes(serial),
            vendor_id: read_u16(data, 8),
            product_id: read_u16(data, 10),
            firmware: Version::from_le(&data[12..20]),
            hardware: Version::from_le(&data[20..28]),
        })
    }
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}
