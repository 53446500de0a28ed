use std::collections::HashMap;

use gipbridge_frame::CommandId;

/// Drops retransmitted messages.
///
/// Remembers the last accepted sequence count per command. A message whose
/// count equals the remembered one is a duplicate. No ordering is enforced;
/// any change counts as new.
#[derive(Debug, Default, Clone)]
pub struct SequenceGuard {
    last: HashMap<CommandId, u8>,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the message should be processed, recording its count.
    pub fn accept(&mut self, command: CommandId, sequence: u8) -> bool {
        match self.last.insert(command, sequence) {
            Some(previous) => previous != sequence,
            None => true,
        }
    }

    /// Last accepted sequence count for `command`.
    pub fn last(&self, command: CommandId) -> Option<u8> {
        self.last.get(&command).copied()
    }

    /// Forget every command.
    pub fn reset(&mut self) {
        self.last.clear();
    }
}
