use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use gipbridge_device::{parse_keystrokes, DeviceId};
use gipbridge_frame::{CommandId, Message};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
pub struct KeystrokeRow {
    pub pressed: bool,
    pub keycode: u8,
    pub guide: bool,
}

/// One message split out of a frame.
#[derive(Serialize)]
pub struct MessageRow {
    pub command: u8,
    pub command_name: String,
    pub flags: Vec<&'static str>,
    pub sequence: u8,
    pub data_length: usize,
    /// Arrival and descriptor messages are consumed by the session, not
    /// forwarded to a backend.
    pub identity: bool,
    pub payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystrokes: Option<Vec<KeystrokeRow>>,
}

impl MessageRow {
    pub fn from_message(message: &Message<'_>) -> Self {
        let header = &message.header;
        Self {
            command: header.command.as_u8(),
            command_name: header.command.to_string(),
            flags: header.flags.iter_names().map(|(name, _)| name).collect(),
            sequence: header.sequence,
            data_length: header.data_length,
            identity: header.command.is_identity(),
            payload: hex::encode(message.payload),
            keystrokes: keystroke_rows(header.command, message.payload),
        }
    }
}

#[derive(Serialize)]
struct DecodeOutput<'a> {
    messages: &'a [MessageRow],
    discarded: usize,
}

/// One command delivered to an output backend during replay.
#[derive(Serialize)]
pub struct DispatchRow {
    pub device: DeviceId,
    pub backend: String,
    pub command: u8,
    pub command_name: String,
    pub payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystrokes: Option<Vec<KeystrokeRow>>,
}

impl DispatchRow {
    pub fn new(device: DeviceId, backend: &str, command: CommandId, payload: &[u8]) -> Self {
        Self {
            device,
            backend: backend.to_string(),
            command: command.as_u8(),
            command_name: command.to_string(),
            payload: hex::encode(payload),
            keystrokes: keystroke_rows(command, payload),
        }
    }
}

fn keystroke_rows(command: CommandId, payload: &[u8]) -> Option<Vec<KeystrokeRow>> {
    if command != CommandId::KEYSTROKE {
        return None;
    }
    Some(
        parse_keystrokes(payload)
            .map(|key| KeystrokeRow {
                pressed: key.pressed,
                keycode: key.keycode,
                guide: key.is_guide(),
            })
            .collect(),
    )
}

pub fn print_messages(rows: &[MessageRow], discarded: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = DecodeOutput {
                messages: rows,
                discarded,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "FLAGS", "SEQ", "LENGTH", "PAYLOAD"]);
            for row in rows {
                table.add_row(vec![
                    row.command_name.clone(),
                    row.flags.join("|"),
                    row.sequence.to_string(),
                    row.data_length.to_string(),
                    row.payload.clone(),
                ]);
            }
            println!("{table}");
            if discarded > 0 {
                println!("discarded {discarded} trailing bytes");
            }
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!(
                    "command={} ({:#04x}) flags=[{}] seq={} len={} payload={}",
                    row.command_name,
                    row.command,
                    row.flags.join("|"),
                    row.sequence,
                    row.data_length,
                    row.payload
                );
            }
            if discarded > 0 {
                println!("discarded={discarded}");
            }
        }
        OutputFormat::Raw => {
            for row in rows {
                if let Ok(bytes) = hex::decode(&row.payload) {
                    print_raw(&bytes);
                }
            }
        }
    }
}

/// Print a batch of dispatches. JSON emits one object per line.
pub fn print_dispatches(rows: &[DispatchRow], format: OutputFormat) {
    if rows.is_empty() {
        return;
    }
    match format {
        OutputFormat::Json => {
            for row in rows {
                println!(
                    "{}",
                    serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DEVICE", "BACKEND", "COMMAND", "PAYLOAD"]);
            for row in rows {
                table.add_row(vec![
                    row.device.to_string(),
                    row.backend.clone(),
                    row.command_name.clone(),
                    row.payload.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!(
                    "device={} backend={} command={} payload={}",
                    row.device, row.backend, row.command_name, row.payload
                );
            }
        }
        OutputFormat::Raw => {
            for row in rows {
                if let Ok(bytes) = hex::decode(&row.payload) {
                    print_raw(&bytes);
                }
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
