//! Descriptor command payload.
//!
//! ```text
//! ┌──────────────┬─────────────────┬──────────────────────────────────────┐
//! │ Header len H │ Header (opaque) │ Body                                 │
//! │ (2B LE)      │ (H - 2 bytes)   │                                      │
//! └──────────────┴─────────────────┴──────────────────────────────────────┘
//!
//! Body:
//! ┌────────────┬──────────────────────────────────────────────┬──────────┐
//! │ Length     │ Element offsets (8 × 2B LE, from body start)  │ Elements │
//! │ (2B LE)    │ ext cmds, fw versions, audio, input cmds,     │          │
//! │            │ output cmds, class names, interfaces, hid     │          │
//! └────────────┴──────────────────────────────────────────────┴──────────┘
//! ```
//!
//! An offset of zero marks the element as absent. Every element starts with a
//! one-byte entry count.

use gipbridge_frame::CommandId;
use uuid::Uuid;

use crate::error::DescriptorError;

const HEADER_LENGTH_SIZE: usize = 2;
const OFFSET_COUNT: usize = 8;
const BODY_TABLE_SIZE: usize = 2 + OFFSET_COUNT * 2;
const GUID_SIZE: usize = 16;

const INPUT_COMMANDS: usize = 3;
const OUTPUT_COMMANDS: usize = 4;
const CLASS_NAMES: usize = 5;
const INTERFACE_GUIDS: usize = 6;

/// Capabilities declared by a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Taken from the device's Arrival command; zero until one is seen.
    pub vendor_id: u16,
    pub product_id: u16,
    /// Interface GUIDs in descriptor order, duplicates removed.
    pub interface_guids: Vec<Uuid>,
    pub class_names: Vec<String>,
    /// Commands the device sends.
    pub input_commands: Vec<CommandId>,
    /// Commands the device accepts.
    pub output_commands: Vec<CommandId>,
}

impl DeviceDescriptor {
    /// Parse a descriptor payload.
    pub fn parse(data: &[u8]) -> Result<Self, DescriptorError> {
        if data.len() < HEADER_LENGTH_SIZE {
            return Err(DescriptorError::TooShort {
                needed: HEADER_LENGTH_SIZE,
                available: data.len(),
            });
        }

        let header_len = usize::from(read_u16(data, 0));
        if header_len < HEADER_LENGTH_SIZE || header_len > data.len() {
            return Err(DescriptorError::HeaderLength(header_len));
        }

        let body = &data[header_len..];
        if body.len() < BODY_TABLE_SIZE {
            return Err(DescriptorError::TooShort {
                needed: header_len + BODY_TABLE_SIZE,
                available: data.len(),
            });
        }

        let body_len = usize::from(read_u16(body, 0));
        if body_len < BODY_TABLE_SIZE || body_len > body.len() {
            return Err(DescriptorError::BodyLength(body_len));
        }
        let body = &body[..body_len];

        let mut offsets = [0usize; OFFSET_COUNT];
        for (i, offset) in offsets.iter_mut().enumerate() {
            *offset = usize::from(read_u16(body, 2 + i * 2));
        }

        let elements = Elements { body, offsets };

        let mut interface_guids = Vec::new();
        if let Some((count, entries)) = elements.get(INTERFACE_GUIDS, "interfaces")? {
            let size = count * GUID_SIZE;
            if entries.len() < size {
                return Err(elements.out_of_bounds(INTERFACE_GUIDS, "interfaces"));
            }
            for raw in entries[..size].chunks_exact(GUID_SIZE) {
                let mut bytes = [0u8; GUID_SIZE];
                bytes.copy_from_slice(raw);
                let guid = Uuid::from_bytes(bytes);
                if !interface_guids.contains(&guid) {
                    interface_guids.push(guid);
                }
            }
        }

        let mut class_names = Vec::new();
        if let Some((count, mut entries)) = elements.get(CLASS_NAMES, "class names")? {
            for _ in 0..count {
                if entries.len() < 2 {
                    return Err(elements.out_of_bounds(CLASS_NAMES, "class names"));
                }
                let len = usize::from(read_u16(entries, 0));
                let Some(name) = entries.get(2..2 + len) else {
                    return Err(elements.out_of_bounds(CLASS_NAMES, "class names"));
                };
                class_names.push(String::from_utf8_lossy(name).into_owned());
                entries = &entries[2 + len..];
            }
        }

        let input_commands = elements.commands(INPUT_COMMANDS, "input commands")?;
        let output_commands = elements.commands(OUTPUT_COMMANDS, "output commands")?;

        Ok(Self {
            vendor_id: 0,
            product_id: 0,
            interface_guids,
            class_names,
            input_commands,
            output_commands,
        })
    }
}

struct Elements<'a> {
    body: &'a [u8],
    offsets: [usize; OFFSET_COUNT],
}

impl<'a> Elements<'a> {
    /// Entry count and the bytes following it, or `None` when absent.
    fn get(
        &self,
        index: usize,
        element: &'static str,
    ) -> Result<Option<(usize, &'a [u8])>, DescriptorError> {
        let offset = self.offsets[index];
        if offset == 0 {
            return Ok(None);
        }
        if offset < BODY_TABLE_SIZE || offset >= self.body.len() {
            return Err(self.out_of_bounds(index, element));
        }

        let count = usize::from(self.body[offset]);
        Ok(Some((count, &self.body[offset + 1..])))
    }

    fn commands(
        &self,
        index: usize,
        element: &'static str,
    ) -> Result<Vec<CommandId>, DescriptorError> {
        let Some((count, entries)) = self.get(index, element)? else {
            return Ok(Vec::new());
        };
        let Some(ids) = entries.get(..count) else {
            return Err(self.out_of_bounds(index, element));
        };
        Ok(ids.iter().copied().map(CommandId).collect())
    }

    fn out_of_bounds(&self, index: usize, element: &'static str) -> DescriptorError {
        DescriptorError::OutOfBounds {
            element,
            offset: self.offsets[index],
        }
    }
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}
