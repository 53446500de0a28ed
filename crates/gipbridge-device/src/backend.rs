//! Output backend seam.
//!
//! Backends turn decoded commands into virtual device state. They are
//! implemented outside this crate and handed to sessions by a
//! [`BackendProvider`]. Each backend owns a virtual device slot that must be
//! given back through [`OutputBackend::release`]; sessions guarantee that
//! happens exactly once, when the backend is replaced or the session ends.

use std::fmt;

use gipbridge_frame::CommandId;
use tracing::debug;
use uuid::Uuid;

use crate::error::BackendError;
use crate::guids::DeviceKind;

/// Which family of virtual devices backends drive. Fixed per process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MappingMode {
    /// Virtual gamepad.
    #[default]
    Gamepad,
    /// Virtual joystick.
    Joystick,
}

impl MappingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gamepad => "gamepad",
            Self::Joystick => "joystick",
        }
    }
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives the commands of one device.
pub trait OutputBackend: Send {
    /// Handle one decoded command.
    fn handle(&mut self, command: CommandId, payload: &[u8]);

    /// Give back the virtual device. Must be safe to call more than once.
    fn release(&mut self);

    /// Short name for logs.
    fn name(&self) -> &str {
        "backend"
    }
}

/// Creates backends for identified devices.
pub trait BackendProvider: Send + Sync {
    /// Claim a virtual device for `kind`.
    fn acquire(
        &self,
        kind: DeviceKind,
        mode: MappingMode,
    ) -> Result<Box<dyn OutputBackend>, BackendError>;

    /// Backend bound while a device is unidentified or unrecognized.
    fn fallback(&self, _mode: MappingMode) -> Box<dyn OutputBackend> {
        Box::new(NullBackend)
    }
}

/// Pick the backend for a set of interface GUIDs.
///
/// The first recognized GUID decides; with none recognized the provider's
/// fallback is returned.
pub fn select(
    provider: &dyn BackendProvider,
    interfaces: &[Uuid],
    mode: MappingMode,
) -> Result<Box<dyn OutputBackend>, BackendError> {
    match DeviceKind::from_interfaces(interfaces) {
        Some(kind) => provider.acquire(kind, mode),
        None => Ok(provider.fallback(mode)),
    }
}

/// Backend that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl OutputBackend for NullBackend {
    fn handle(&mut self, _command: CommandId, _payload: &[u8]) {}

    fn release(&mut self) {}

    fn name(&self) -> &str {
        "null"
    }
}

/// The backend currently bound to a session.
///
/// Releases the backend exactly once: on [`Binding::rebind`],
/// [`Binding::release`] or drop, whichever comes first.
pub(crate) struct Binding {
    backend: Box<dyn OutputBackend>,
    released: bool,
}

impl Binding {
    pub(crate) fn new(backend: Box<dyn OutputBackend>) -> Self {
        debug!(backend = backend.name(), "backend bound");
        Self {
            backend,
            released: false,
        }
    }

    pub(crate) fn handle(&mut self, command: CommandId, payload: &[u8]) {
        if !self.released {
            self.backend.handle(command, payload);
        }
    }

    /// Release the current backend, then bind `backend`.
    pub(crate) fn rebind(&mut self, backend: Box<dyn OutputBackend>) {
        self.release();
        *self = Self::new(backend);
    }

    pub(crate) fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        debug!(backend = self.backend.name(), "backend released");
        self.backend.release();
    }

    pub(crate) fn name(&self) -> &str {
        self.backend.name()
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::guids::{INPUT_DEVICE, MADCATZ_DRUMKIT};

    #[derive(Default)]
    struct Counter {
        handled: usize,
        released: usize,
    }

    struct Counting(Arc<Mutex<Counter>>);

    impl OutputBackend for Counting {
        fn handle(&mut self, _command: CommandId, _payload: &[u8]) {
            self.0.lock().unwrap().handled += 1;
        }

        fn release(&mut self) {
            self.0.lock().unwrap().released += 1;
        }
    }

    struct KindEcho;

    impl BackendProvider for KindEcho {
        fn acquire(
            &self,
            kind: DeviceKind,
            mode: MappingMode,
        ) -> Result<Box<dyn OutputBackend>, BackendError> {
            Err(BackendError::Unavailable { kind, mode })
        }
    }

    #[test]
    fn binding_releases_once() {
        let counter = Arc::new(Mutex::new(Counter::default()));
        let mut binding = Binding::new(Box::new(Counting(counter.clone())));

        binding.handle(CommandId::INPUT, &[]);
        binding.release();
        binding.release();
        binding.handle(CommandId::INPUT, &[]);
        drop(binding);

        let counter = counter.lock().unwrap();
        assert_eq!(counter.handled, 1);
        assert_eq!(counter.released, 1);
    }

    #[test]
    fn rebind_releases_previous() {
        let first = Arc::new(Mutex::new(Counter::default()));
        let second = Arc::new(Mutex::new(Counter::default()));

        let mut binding = Binding::new(Box::new(Counting(first.clone())));
        binding.rebind(Box::new(Counting(second.clone())));
        binding.handle(CommandId::INPUT, &[]);

        assert_eq!(first.lock().unwrap().released, 1);
        assert_eq!(first.lock().unwrap().handled, 0);
        assert_eq!(second.lock().unwrap().handled, 1);
        assert_eq!(second.lock().unwrap().released, 0);

        drop(binding);
        assert_eq!(second.lock().unwrap().released, 1);
    }

    #[test]
    fn select_uses_fallback_for_unknown_interfaces() {
        let backend = select(&KindEcho, &[INPUT_DEVICE], MappingMode::Gamepad).unwrap();
        assert_eq!(backend.name(), "null");
    }

    #[test]
    fn select_acquires_for_known_interfaces() {
        let err = select(
            &KindEcho,
            &[INPUT_DEVICE, MADCATZ_DRUMKIT],
            MappingMode::Joystick,
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            BackendError::Unavailable {
                kind: DeviceKind::Drumkit,
                mode: MappingMode::Joystick,
            }
        ));
    }
}
