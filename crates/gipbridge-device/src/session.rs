use std::sync::Arc;

use gipbridge_frame::{split_messages, CommandId, Header};
use tracing::{debug, info, trace, warn};

use crate::arrival::DeviceArrival;
use crate::backend::{select, BackendProvider, Binding, MappingMode};
use crate::chunk::{ChunkAssembler, ChunkOutcome};
use crate::descriptor::DeviceDescriptor;
use crate::error::{DeviceError, Result};
use crate::guids::{interface_name, DeviceKind};
use crate::registry::DeviceId;
use crate::sequence::SequenceGuard;

/// Default upper bound on a reassembled message: 64 KiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Configuration for device sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend family to bind. Default: gamepad.
    pub mode: MappingMode,
    /// Largest total size a chunk start may declare. Default: 64 KiB.
    pub max_message_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: MappingMode::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Lifecycle of a [`DeviceSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No descriptor yet; the fallback backend is bound.
    Unidentified,
    /// A descriptor was parsed and a backend selected for it.
    Identified,
    /// Backend released; no more frames are accepted.
    Disposed,
}

/// Protocol state for one physical device.
///
/// Frames must be fed in arrival order from a single thread. Distinct
/// sessions share nothing and may run on different threads.
pub struct DeviceSession {
    id: DeviceId,
    config: SessionConfig,
    provider: Arc<dyn BackendProvider>,
    state: SessionState,
    arrival: Option<DeviceArrival>,
    descriptor: Option<DeviceDescriptor>,
    kind: Option<DeviceKind>,
    chunks: ChunkAssembler,
    sequences: SequenceGuard,
    backend: Binding,
}

impl DeviceSession {
    /// Create a session with the provider's fallback backend bound.
    pub fn new(id: DeviceId, provider: Arc<dyn BackendProvider>, config: SessionConfig) -> Self {
        let backend = Binding::new(provider.fallback(config.mode));
        Self {
            id,
            chunks: ChunkAssembler::new(config.max_message_size),
            config,
            provider,
            state: SessionState::Unidentified,
            arrival: None,
            descriptor: None,
            kind: None,
            sequences: SequenceGuard::new(),
            backend,
        }
    }

    /// Process one transport frame.
    ///
    /// Malformed data is logged and dropped. The only error surfaced while
    /// the session is live is a failure to acquire a backend, which stops
    /// processing of the rest of the frame.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Result<()> {
        if self.state == SessionState::Disposed {
            return Err(DeviceError::Disposed);
        }

        let mut messages = split_messages(frame);
        for message in messages.by_ref() {
            self.handle_message(message.header, message.payload)?;
        }
        if messages.discarded() > 0 {
            trace!(device = self.id, bytes = messages.discarded(), "frame tail dropped");
        }
        Ok(())
    }

    fn handle_message(&mut self, header: Header, payload: &[u8]) -> Result<()> {
        if !header.is_chunked() {
            return self.process(header, payload, header.data_length);
        }

        match self.chunks.accept(&header, payload) {
            ChunkOutcome::Single {
                payload,
                expected_len,
            } => self.process(header, payload, expected_len),
            ChunkOutcome::Complete {
                payload,
                expected_len,
            } => self.process(header, &payload, expected_len),
            ChunkOutcome::Pending | ChunkOutcome::Dropped => Ok(()),
        }
    }

    fn process(&mut self, header: Header, payload: &[u8], expected_len: usize) -> Result<()> {
        if payload.len() != expected_len {
            warn!(
                device = self.id,
                command = %header.command,
                expected = expected_len,
                actual = payload.len(),
                "message length mismatch"
            );
            return Ok(());
        }

        if !self.sequences.accept(header.command, header.sequence) {
            trace!(
                device = self.id,
                command = %header.command,
                sequence = header.sequence,
                "duplicate message dropped"
            );
            return Ok(());
        }

        match header.command {
            CommandId::ARRIVAL => {
                self.handle_arrival(payload);
                Ok(())
            }
            CommandId::DESCRIPTOR => self.handle_descriptor(payload),
            command => {
                self.backend.handle(command, payload);
                Ok(())
            }
        }
    }

    fn handle_arrival(&mut self, payload: &[u8]) {
        let arrival = match DeviceArrival::parse(payload) {
            Ok(arrival) => arrival,
            Err(err) => {
                debug!(device = self.id, error = %err, "ignoring arrival");
                return;
            }
        };

        info!(
            device = self.id,
            vendor_id = arrival.vendor_id,
            product_id = arrival.product_id,
            firmware = %arrival.firmware,
            "device arrived"
        );
        if let Some(descriptor) = &mut self.descriptor {
            descriptor.vendor_id = arrival.vendor_id;
            descriptor.product_id = arrival.product_id;
        }
        self.arrival = Some(arrival);
    }

    fn handle_descriptor(&mut self, payload: &[u8]) -> Result<()> {
        let mut descriptor = match DeviceDescriptor::parse(payload) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                debug!(device = self.id, error = %err, "ignoring descriptor");
                return Ok(());
            }
        };

        let backend = select(
            self.provider.as_ref(),
            &descriptor.interface_guids,
            self.config.mode,
        )?;

        if let Some(arrival) = &self.arrival {
            descriptor.vendor_id = arrival.vendor_id;
            descriptor.product_id = arrival.product_id;
        }
        let kind = DeviceKind::from_interfaces(&descriptor.interface_guids);
        for guid in &descriptor.interface_guids {
            debug!(
                device = self.id,
                interface = %guid,
                name = interface_name(guid).unwrap_or("unknown"),
                "descriptor interface"
            );
        }

        self.backend.rebind(backend);
        info!(
            device = self.id,
            kind = kind.map_or("unknown", DeviceKind::as_str),
            backend = self.backend.name(),
            interfaces = descriptor.interface_guids.len(),
            "device identified"
        );

        self.kind = kind;
        self.descriptor = Some(descriptor);
        self.state = SessionState::Identified;
        Ok(())
    }

    /// Release the backend and clear protocol state. Idempotent.
    pub fn dispose(&mut self) {
        if self.state == SessionState::Disposed {
            return;
        }
        debug!(device = self.id, "disposing device session");
        self.backend.release();
        self.chunks.reset();
        self.sequences.reset();
        self.state = SessionState::Disposed;
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn arrival(&self) -> Option<&DeviceArrival> {
        self.arrival.as_ref()
    }

    pub fn descriptor(&self) -> Option<&DeviceDescriptor> {
        self.descriptor.as_ref()
    }

    /// Instrument kind recognized from the descriptor, if any.
    pub fn kind(&self) -> Option<DeviceKind> {
        self.kind
    }

    /// Name of the bound backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Returns true while a chunked message is partially assembled.
    pub fn reassembling(&self) -> bool {
        self.chunks.in_progress()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns true once the bound backend has been released.
    pub fn backend_released(&self) -> bool {
        self.backend.is_released()
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        self.dispose();
    }
}
