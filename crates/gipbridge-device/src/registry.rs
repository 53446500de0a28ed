use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::backend::BackendProvider;
use crate::error::Result;
use crate::session::{DeviceSession, SessionConfig};

/// Transport-assigned identifier of a physical device.
pub type DeviceId = u64;

/// Sessions for every connected device.
///
/// A session is created the first time a frame arrives from a device and
/// disposed when the device disconnects or the registry is cleared.
pub struct DeviceRegistry {
    provider: Arc<dyn BackendProvider>,
    config: SessionConfig,
    sessions: HashMap<DeviceId, DeviceSession>,
}

impl DeviceRegistry {
    pub fn new(provider: Arc<dyn BackendProvider>, config: SessionConfig) -> Self {
        Self {
            provider,
            config,
            sessions: HashMap::new(),
        }
    }

    /// Route a frame to the session for `id`, creating it if needed.
    pub fn handle_frame(&mut self, id: DeviceId, frame: &[u8]) -> Result<()> {
        let session = self.sessions.entry(id).or_insert_with(|| {
            debug!(device = id, "device connected");
            DeviceSession::new(id, self.provider.clone(), self.config.clone())
        });
        session.handle_frame(frame)
    }

    /// Dispose and forget the session for `id`. Returns false if unknown.
    pub fn disconnect(&mut self, id: DeviceId) -> bool {
        match self.sessions.remove(&id) {
            Some(mut session) => {
                debug!(device = id, "device disconnected");
                session.dispose();
                true
            }
            None => false,
        }
    }

    /// Dispose every session.
    pub fn clear(&mut self) {
        for (_, mut session) in self.sessions.drain() {
            session.dispose();
        }
    }

    pub fn get(&self, id: DeviceId) -> Option<&DeviceSession> {
        self.sessions.get(&id)
    }

    /// Connected device ids, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.sessions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Drop for DeviceRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}
