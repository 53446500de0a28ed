//! Keystroke passthrough payloads.
//!
//! A Keystroke message carries one or more two-byte entries: a pressed flag
//! followed by a virtual key code. The guide button arrives this way as the
//! left Windows key.

/// Virtual key code the guide button is reported as.
pub const KEYCODE_LEFT_WINDOWS: u8 = 0x5B;

const ENTRY_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    pub pressed: bool,
    pub keycode: u8,
}

impl Keystroke {
    pub fn is_guide(&self) -> bool {
        self.keycode == KEYCODE_LEFT_WINDOWS
    }
}

/// Iterate the keystrokes in a payload. A trailing odd byte is ignored.
pub fn parse_keystrokes(payload: &[u8]) -> impl Iterator<Item = Keystroke> + '_ {
    payload.chunks_exact(ENTRY_SIZE).map(|entry| Keystroke {
        pressed: entry[0] != 0,
        keycode: entry[1],
    })
}
