//! End-to-end session behaviour: framing, reassembly, deduplication and
//! backend binding driven through `DeviceSession::handle_frame`.

use std::sync::{Arc, Mutex};

use bytes::BytesMut;
use gipbridge_device::{
    BackendError, BackendProvider, DeviceKind, DeviceRegistry, DeviceSession, MappingMode,
    OutputBackend, SessionConfig, SessionState,
};
use gipbridge_frame::{encode_message, encode_varint, CommandId, Flags};
use proptest::prelude::*;

type Dispatches = Arc<Mutex<Vec<(CommandId, Vec<u8>)>>>;

struct Recorder(Dispatches);

impl OutputBackend for Recorder {
    fn handle(&mut self, command: CommandId, payload: &[u8]) {
        self.0.lock().unwrap().push((command, payload.to_vec()));
    }

    fn release(&mut self) {}
}

struct RecordingProvider(Dispatches);

impl BackendProvider for RecordingProvider {
    fn acquire(
        &self,
        _kind: DeviceKind,
        _mode: MappingMode,
    ) -> Result<Box<dyn OutputBackend>, BackendError> {
        Ok(Box::new(Recorder(self.0.clone())))
    }

    fn fallback(&self, _mode: MappingMode) -> Box<dyn OutputBackend> {
        Box::new(Recorder(self.0.clone()))
    }
}

fn recording_session() -> (DeviceSession, Dispatches) {
    let dispatches = Dispatches::default();
    let provider = Arc::new(RecordingProvider(dispatches.clone()));
    (
        DeviceSession::new(0, provider, SessionConfig::default()),
        dispatches,
    )
}

fn message(command: CommandId, flags: Flags, sequence: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_message(command, flags, sequence, payload, &mut buf).unwrap();
    buf.to_vec()
}

fn chunk(flags: Flags, sequence: u8, index: u32, data: &[u8]) -> Vec<u8> {
    let mut payload = BytesMut::new();
    encode_varint(index, &mut payload);
    payload.extend_from_slice(data);
    message(CommandId::INPUT, flags | Flags::CHUNK_PACKET, sequence, &payload)
}

/// Fragment `data` at the given cut points into start, continuation and
/// completion frames, numbered from `first_sequence`.
fn fragment(data: &[u8], cuts: &[usize], first_sequence: u8) -> Vec<Vec<u8>> {
    let mut bounds = vec![0];
    bounds.extend(cuts.iter().copied().filter(|&c| c > 0 && c < data.len()));
    bounds.sort_unstable();
    bounds.dedup();
    bounds.push(data.len());

    let mut frames = Vec::new();
    let mut sequence = first_sequence;
    for pair in bounds.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let frame = if from == 0 {
            chunk(Flags::CHUNK_START, sequence, data.len() as u32, &data[..to])
        } else {
            chunk(Flags::empty(), sequence, from as u32, &data[from..to])
        };
        frames.push(frame);
        sequence = sequence.wrapping_add(1);
    }
    frames.push(chunk(Flags::empty(), sequence, data.len() as u32, &[]));
    frames
}

#[test]
fn input_message_with_short_tail() {
    let (mut session, dispatches) = recording_session();
    let frame = [0x20, 0x00, 0x05, 0x03, 0x10, 0x20, 0x30, 0xEE, 0xEF];

    session.handle_frame(&frame).unwrap();

    let dispatches = dispatches.lock().unwrap();
    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0].0, CommandId::INPUT);
    assert_eq!(dispatches[0].1, vec![0x10, 0x20, 0x30]);
}

#[test]
fn back_to_back_messages_dispatch_in_order() {
    let (mut session, dispatches) = recording_session();
    let mut frame = message(CommandId::INPUT, Flags::empty(), 1, b"one");
    frame.extend(message(CommandId::KEYSTROKE, Flags::empty(), 1, &[1, 0x5B]));
    frame.extend(message(CommandId(0x0C), Flags::SYSTEM_COMMAND, 9, b"three"));

    session.handle_frame(&frame).unwrap();

    let commands: Vec<_> = dispatches.lock().unwrap().iter().map(|d| d.0).collect();
    assert_eq!(
        commands,
        vec![CommandId::INPUT, CommandId::KEYSTROKE, CommandId(0x0C)]
    );
}

#[test]
fn fragmented_descriptor_identifies_device() {
    let (mut session, _dispatches) = recording_session();

    let mut descriptor = Vec::new();
    descriptor.extend_from_slice(&2u16.to_le_bytes());
    descriptor.extend_from_slice(&35u16.to_le_bytes());
    for i in 0..8u16 {
        let offset: u16 = if i == 6 { 18 } else { 0 };
        descriptor.extend_from_slice(&offset.to_le_bytes());
    }
    descriptor.push(1);
    descriptor.extend_from_slice(gipbridge_device::guids::PDP_DRUMKIT.as_bytes());

    let start = Flags::CHUNK_PACKET | Flags::CHUNK_START;
    let total = descriptor.len() as u32;
    let mut frames = Vec::new();
    for (i, (from, to)) in [(0usize, 20usize), (20, descriptor.len())].into_iter().enumerate() {
        let mut payload = BytesMut::new();
        let (flags, index) = if i == 0 {
            (start, total)
        } else {
            (Flags::CHUNK_PACKET, from as u32)
        };
        encode_varint(index, &mut payload);
        payload.extend_from_slice(&descriptor[from..to]);
        frames.push(message(CommandId::DESCRIPTOR, flags, i as u8, &payload));
    }
    let mut end = BytesMut::new();
    encode_varint(total, &mut end);
    frames.push(message(CommandId::DESCRIPTOR, Flags::CHUNK_PACKET, 2, &end));

    for frame in &frames {
        assert_eq!(session.state(), SessionState::Unidentified);
        session.handle_frame(frame).unwrap();
    }

    assert_eq!(session.state(), SessionState::Identified);
    assert_eq!(session.kind(), Some(DeviceKind::Drumkit));
}

#[test]
fn second_fragmented_message_starts_clean() {
    let (mut session, dispatches) = recording_session();
    for frame in fragment(b"first message", &[5], 1) {
        session.handle_frame(&frame).unwrap();
    }
    for frame in fragment(b"second", &[3], 10) {
        session.handle_frame(&frame).unwrap();
    }

    let payloads: Vec<_> = dispatches.lock().unwrap().iter().map(|d| d.1.clone()).collect();
    assert_eq!(payloads, vec![b"first message".to_vec(), b"second".to_vec()]);
}

#[test]
fn lost_middle_fragment_is_not_dispatched() {
    let (mut session, dispatches) = recording_session();
    let frames = fragment(b"abcdefghij", &[4, 7], 1);
    assert_eq!(frames.len(), 4);

    for (i, frame) in frames.iter().enumerate() {
        if i != 1 {
            session.handle_frame(frame).unwrap();
        }
    }

    assert!(dispatches.lock().unwrap().is_empty());
    assert!(!session.reassembling());

    for frame in fragment(b"abcdefghij", &[4, 7], 20) {
        session.handle_frame(&frame).unwrap();
    }
    let dispatches = dispatches.lock().unwrap();
    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0].1, b"abcdefghij".to_vec());
}

#[test]
fn sessions_run_on_separate_threads() {
    let handles: Vec<_> = (0..4u8)
        .map(|n| {
            std::thread::spawn(move || {
                let (mut session, dispatches) = recording_session();
                for sequence in 0..32u8 {
                    let frame = message(CommandId::INPUT, Flags::empty(), sequence, &[n, sequence]);
                    session.handle_frame(&frame).unwrap();
                    session.handle_frame(&frame).unwrap();
                }
                let count = dispatches.lock().unwrap().len();
                count
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 32);
    }
}

#[test]
fn registry_keeps_device_state_apart() {
    let dispatches = Dispatches::default();
    let mut registry = DeviceRegistry::new(
        Arc::new(RecordingProvider(dispatches.clone())),
        SessionConfig::default(),
    );
    let frame = message(CommandId::INPUT, Flags::empty(), 3, &[1]);

    registry.handle_frame(10, &frame).unwrap();
    registry.handle_frame(11, &frame).unwrap();
    registry.handle_frame(10, &frame).unwrap();

    assert_eq!(dispatches.lock().unwrap().len(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_any_fragmentation_reassembles(
        data in prop::collection::vec(any::<u8>(), 1..600),
        cuts in prop::collection::vec(0usize..600, 0..6),
    ) {
        let (mut session, dispatches) = recording_session();
        for frame in fragment(&data, &cuts, 1) {
            session.handle_frame(&frame).unwrap();
        }

        let dispatches = dispatches.lock().unwrap();
        prop_assert_eq!(dispatches.len(), 1);
        prop_assert_eq!(dispatches[0].0, CommandId::INPUT);
        prop_assert_eq!(&dispatches[0].1, &data);
        prop_assert!(!session.reassembling());
    }

    #[test]
    fn prop_duplicate_sequence_dispatches_once(
        sequence in any::<u8>(),
        other in any::<u8>(),
        payload in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        prop_assume!(sequence != other);
        let (mut session, dispatches) = recording_session();

        session.handle_frame(&message(CommandId::INPUT, Flags::empty(), sequence, &payload)).unwrap();
        session.handle_frame(&message(CommandId::INPUT, Flags::empty(), sequence, &payload)).unwrap();
        prop_assert_eq!(dispatches.lock().unwrap().len(), 1);

        session.handle_frame(&message(CommandId::INPUT, Flags::empty(), other, &payload)).unwrap();
        prop_assert_eq!(dispatches.lock().unwrap().len(), 2);
    }

    #[test]
    fn prop_garbage_never_panics(frames in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..16)) {
        let (mut session, _dispatches) = recording_session();
        for frame in &frames {
            session.handle_frame(frame).unwrap();
        }
        prop_assert_ne!(session.state(), SessionState::Disposed);
    }
}
