use clap::{Args, Subcommand, ValueEnum};
use gipbridge_device::{MappingMode, DEFAULT_MAX_MESSAGE_SIZE};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod replay;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split one hex-encoded frame into messages.
    Decode(DecodeArgs),
    /// Feed a capture file through device sessions and print dispatches.
    Replay(ReplayArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum ModeArg {
    #[default]
    Gamepad,
    Joystick,
}

impl From<ModeArg> for MappingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Gamepad => MappingMode::Gamepad,
            ModeArg::Joystick => MappingMode::Joystick,
        }
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes as hex. Whitespace is ignored.
    pub frame: String,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Capture file: one `[device-id ]<hex>` frame per line.
    pub path: PathBuf,
    /// Backend family to bind.
    #[arg(long, value_enum, default_value = "gamepad")]
    pub mode: ModeArg,
    /// Exit after N dispatched messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Largest reassembled message accepted, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    pub max_message_size: usize,
    /// Virtual device slots available to backends. Default: unlimited.
    #[arg(long)]
    pub slots: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
