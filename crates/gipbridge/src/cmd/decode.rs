use gipbridge_frame::split_messages;
use tracing::debug;

use crate::cmd::DecodeArgs;
use crate::exit::{hex_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_messages, MessageRow, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = parse_hex(&args.frame)?;
    if frame.is_empty() {
        return Err(CliError::new(USAGE, "no frame bytes given"));
    }

    let mut messages = split_messages(&frame);
    let rows: Vec<MessageRow> = messages.by_ref().map(|m| MessageRow::from_message(&m)).collect();
    let discarded = messages.discarded();
    debug!(
        frame_len = frame.len(),
        messages = rows.len(),
        discarded,
        "frame decoded"
    );

    print_messages(&rows, discarded, format);
    Ok(SUCCESS)
}

pub(crate) fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(compact).map_err(|err| hex_error("invalid frame hex", err))
}
