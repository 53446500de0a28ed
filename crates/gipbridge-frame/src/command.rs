//! Command ids.
//!
//! Only the commands this crate family understands are named. Any other id is
//! carried through verbatim so it can be forwarded to an output backend.

use std::fmt;

/// One-byte command identifier from a message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub u8);

impl CommandId {
    /// Device announcement (vendor/product ids, versions).
    pub const ARRIVAL: CommandId = CommandId(0x02);

    /// Capability descriptor (interface GUIDs, class names).
    pub const DESCRIPTOR: CommandId = CommandId(0x04);

    /// Keystroke passthrough (guide button and friends).
    pub const KEYSTROKE: CommandId = CommandId(0x07);

    /// Generic input report.
    pub const INPUT: CommandId = CommandId(0x20);

    /// Raw byte value.
    pub fn as_u8(self) -> u8 {
        self.0
    }

    /// Human-readable name, or `None` for commands without one.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::ARRIVAL => Some("Arrival"),
            Self::DESCRIPTOR => Some("Descriptor"),
            Self::KEYSTROKE => Some("Keystroke"),
            Self::INPUT => Some("Input"),
            _ => None,
        }
    }

    /// Returns true for commands the session handles itself.
    pub fn is_identity(self) -> bool {
        matches!(self, Self::ARRIVAL | Self::DESCRIPTOR)
    }
}

impl From<u8> for CommandId {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<CommandId> for u8 {
    fn from(value: CommandId) -> Self {
        value.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(CommandId::ARRIVAL.as_u8(), 0x02);
        assert_eq!(CommandId::DESCRIPTOR.as_u8(), 0x04);
        assert_eq!(CommandId::KEYSTROKE.as_u8(), 0x07);
        assert_eq!(CommandId::INPUT.as_u8(), 0x20);
    }

    #[test]
    fn display_uses_name_or_hex() {
        assert_eq!(CommandId::INPUT.to_string(), "Input");
        assert_eq!(CommandId(0x0A).to_string(), "0x0A");
    }

    #[test]
    fn identity_commands() {
        assert!(CommandId::ARRIVAL.is_identity());
        assert!(CommandId::DESCRIPTOR.is_identity());
        assert!(!CommandId::INPUT.is_identity());
        assert!(!CommandId(0x99).is_identity());
    }
}
