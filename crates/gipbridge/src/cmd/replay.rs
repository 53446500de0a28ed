use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use gipbridge_device::{
    BackendError, BackendProvider, DeviceId, DeviceKind, DeviceRegistry, MappingMode,
    OutputBackend, SessionConfig,
};
use gipbridge_frame::CommandId;
use tracing::{info, warn};

use crate::cmd::decode::parse_hex;
use crate::cmd::ReplayArgs;
use crate::exit::{device_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_dispatches, DispatchRow, OutputFormat};

type Queue = Arc<Mutex<Vec<(String, CommandId, Vec<u8>)>>>;

#[derive(Debug, PartialEq, Eq)]
enum Line {
    Frame { device: DeviceId, bytes: Vec<u8> },
    Disconnect(DeviceId),
}

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let text = std::fs::read_to_string(&args.path)
        .map_err(|err| io_error(&format!("read {}", args.path.display()), err))?;

    let queue = Queue::default();
    let provider = ReplayProvider {
        queue: queue.clone(),
        slots: args.slots.map(|n| Arc::new(AtomicUsize::new(n))),
    };
    let config = SessionConfig {
        mode: MappingMode::from(args.mode),
        max_message_size: args.max_message_size,
    };
    let mut registry = DeviceRegistry::new(Arc::new(provider), config);

    let mut printed = 0usize;
    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = parse_line(raw)
            .map_err(|msg| CliError::new(DATA_INVALID, format!("line {line_no}: {msg}")))?;

        let result = match line {
            None => continue,
            Some(Line::Disconnect(id)) => {
                if !registry.disconnect(id) {
                    warn!(device = id, line = line_no, "disconnect for unknown device");
                }
                Ok(())
            }
            Some(Line::Frame { device, bytes }) => {
                let result = registry.handle_frame(device, &bytes);
                let mut rows = drain(&queue, device);
                if let Some(count) = args.count {
                    rows.truncate(count.saturating_sub(printed));
                }
                printed = printed.saturating_add(rows.len());
                print_dispatches(&rows, format);
                result
            }
        };
        result.map_err(|err| device_error(&format!("line {line_no}"), err))?;

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    info!(devices = registry.len(), dispatched = printed, "replay finished");
    registry.clear();
    Ok(SUCCESS)
}

fn drain(queue: &Queue, device: DeviceId) -> Vec<DispatchRow> {
    let mut queue = match queue.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    queue
        .drain(..)
        .map(|(backend, command, payload)| DispatchRow::new(device, &backend, command, &payload))
        .collect()
}

/// Parse one capture line. Blank lines and `#` comments yield `None`.
///
/// A frame line is `<hex>` (device 0) or `<device-id> <hex>`; anything after
/// the device id is hex, whitespace ignored.
fn parse_line(raw: &str) -> Result<Option<Line>, String> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace();
    let first = tokens.next().unwrap_or_default();
    let rest: Vec<&str> = tokens.collect();

    if first == "disconnect" {
        return match rest.as_slice() {
            [id] => parse_device(id).map(|id| Some(Line::Disconnect(id))),
            _ => Err("expected `disconnect <device-id>`".to_string()),
        };
    }

    let (device, hex_text) = if rest.is_empty() {
        (0, first.to_string())
    } else {
        (parse_device(first)?, rest.concat())
    };
    let bytes = parse_hex(&hex_text).map_err(|err| err.message)?;
    Ok(Some(Line::Frame { device, bytes }))
}

fn parse_device(text: &str) -> Result<DeviceId, String> {
    text.parse().map_err(|_| format!("invalid device id `{text}`"))
}

struct ReplayProvider {
    queue: Queue,
    slots: Option<Arc<AtomicUsize>>,
}

impl BackendProvider for ReplayProvider {
    fn acquire(
        &self,
        kind: DeviceKind,
        mode: MappingMode,
    ) -> Result<Box<dyn OutputBackend>, BackendError> {
        let slot = match &self.slots {
            Some(free) => {
                free.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                    n.checked_sub(1)
                })
                .map_err(|_| BackendError::Unavailable { kind, mode })?;
                Some(free.clone())
            }
            None => None,
        };
        Ok(Box::new(PrintingBackend {
            name: format!("{kind}-{mode}"),
            queue: self.queue.clone(),
            slot,
        }))
    }

    fn fallback(&self, _mode: MappingMode) -> Box<dyn OutputBackend> {
        Box::new(PrintingBackend {
            name: "fallback".to_string(),
            queue: self.queue.clone(),
            slot: None,
        })
    }
}

/// Queues every command for printing. Holds a virtual device slot when
/// slots are limited.
struct PrintingBackend {
    name: String,
    queue: Queue,
    slot: Option<Arc<AtomicUsize>>,
}

impl OutputBackend for PrintingBackend {
    fn handle(&mut self, command: CommandId, payload: &[u8]) {
        let mut queue = match self.queue.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        queue.push((self.name.clone(), command, payload.to_vec()));
    }

    fn release(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
