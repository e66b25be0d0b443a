//! Unit tests for the Fast Packet assembler.
use super::*;

const ID: CanId = CanId(0x09ED_FF23);
const OTHER_ID: CanId = CanId(0x09ED_FF24);

fn frame(id: CanId, data: [u8; 8]) -> CanFrame {
    CanFrame { id, data, len: 8 }
}

fn completed(result: ProcessResult) -> CompletedMessage {
    match result {
        ProcessResult::MessageComplete(message) => message,
        other => panic!("expected a complete message, got {:?}", other),
    }
}

#[test]
/// Non Fast Packet PGNs complete immediately with the frame bytes.
fn test_single_frame_passthrough() {
    let mut assembler = FastPacketAssembler::new();
    let single = CanFrame::new(CanId(0x09FF_5423), &[0xE4, 0x9F, 0x57, 0x00, 0xE8, 0x03]).unwrap();

    let message = completed(assembler.process_frame(&single, false));
    assert_eq!(message.id, CanId(0x09FF_5423));
    assert_eq!(message.payload.as_slice(), &[0xE4, 0x9F, 0x57, 0x00, 0xE8, 0x03]);
    assert_eq!(assembler.active_sessions(), 0);
}

#[test]
/// A short last frame arriving without its first frame is dropped.
fn test_short_orphan_ignored() {
    let mut assembler = FastPacketAssembler::new();
    let short = CanFrame::new(ID, &[0x43, 0x11, 0x22, 0x33]).unwrap();
    assert!(matches!(
        assembler.process_frame(&short, true),
        ProcessResult::Ignored
    ));
    assert_eq!(assembler.active_sessions(), 0);
}

#[test]
/// A short first frame of a small message still completes.
fn test_short_first_frame_completes() {
    let mut assembler = FastPacketAssembler::new();
    let short = CanFrame::new(ID, &[0x40, 0x03, 0x01, 0x02, 0x03]).unwrap();
    let message = completed(assembler.process_frame(&short, true));
    assert_eq!(message.payload.as_slice(), &[0x01, 0x02, 0x03]);
}

#[test]
/// Three frames rebuild the 16-byte group function request.
fn test_reassemble_request() {
    let mut assembler = FastPacketAssembler::new();
    let frames = [
        frame(ID, [0x40, 0x10, 0x00, 0x54, 0xFF, 0x01, 0xFF, 0xFF]),
        frame(ID, [0x41, 0xFF, 0xFF, 0xFF, 0xFF, 0x02, 0x01, 0xE4]),
        frame(ID, [0x42, 0x07, 0x03, 0x04, 0xFF, 0xFF, 0xFF, 0xFF]),
    ];

    assert!(matches!(
        assembler.process_frame(&frames[0], true),
        ProcessResult::FragmentConsumed
    ));
    assert_eq!(assembler.active_sessions(), 1);
    assert!(matches!(
        assembler.process_frame(&frames[1], true),
        ProcessResult::FragmentConsumed
    ));
    let message = completed(assembler.process_frame(&frames[2], true));

    assert_eq!(message.id, ID);
    assert_eq!(
        message.payload.as_slice(),
        &[
            0x00, 0x54, 0xFF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02, 0x01, 0xE4, 0x07,
            0x03, 0x04
        ]
    );
    assert_eq!(assembler.active_sessions(), 0);
}

#[test]
/// A continuation frame without a first frame is dropped and leaves no state.
fn test_orphan_continuation_ignored() {
    let mut assembler = FastPacketAssembler::new();
    let orphan = frame(ID, [0x41, 1, 2, 3, 4, 5, 6, 7]);
    assert!(matches!(
        assembler.process_frame(&orphan, true),
        ProcessResult::Ignored
    ));
    assert_eq!(assembler.active_sessions(), 0);
}

#[test]
/// Skipping a counter drops the partial message.
fn test_counter_gap_drops_message() {
    let mut assembler = FastPacketAssembler::new();
    assembler.process_frame(&frame(ID, [0x40, 20, 1, 2, 3, 4, 5, 6]), true);
    let result = assembler.process_frame(&frame(ID, [0x42, 7, 8, 9, 10, 11, 12, 13]), true);
    assert!(matches!(result, ProcessResult::Ignored));
    assert_eq!(assembler.active_sessions(), 0);

    // Late frame 1 now has nothing to attach to.
    let late = assembler.process_frame(&frame(ID, [0x41, 7, 8, 9, 10, 11, 12, 13]), true);
    assert!(matches!(late, ProcessResult::Ignored));
}

#[test]
/// A frame from another sequence does not disturb the session in progress.
fn test_foreign_sequence_ignored() {
    let mut assembler = FastPacketAssembler::new();
    assembler.process_frame(&frame(ID, [0x40, 9, 1, 2, 3, 4, 5, 6]), true);

    let foreign = assembler.process_frame(&frame(ID, [0x61, 0xAA, 0xAA, 0xAA, 0xFF, 0xFF, 0xFF, 0xFF]), true);
    assert!(matches!(foreign, ProcessResult::Ignored));
    assert_eq!(assembler.active_sessions(), 1);

    let message = completed(
        assembler.process_frame(&frame(ID, [0x41, 7, 8, 9, 0xFF, 0xFF, 0xFF, 0xFF]), true),
    );
    assert_eq!(message.payload.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
/// A second first frame restarts the reassembly.
fn test_restart_on_new_first_frame() {
    let mut assembler = FastPacketAssembler::new();
    assembler.process_frame(&frame(ID, [0x40, 9, 0xEE, 0xEE, 0xEE, 0xEE, 0xEE, 0xEE]), true);
    assembler.process_frame(&frame(ID, [0x60, 9, 1, 2, 3, 4, 5, 6]), true);
    assert_eq!(assembler.active_sessions(), 1);

    let message = completed(
        assembler.process_frame(&frame(ID, [0x61, 7, 8, 9, 0xFF, 0xFF, 0xFF, 0xFF]), true),
    );
    assert_eq!(message.payload.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
/// Declared lengths above 223 bytes are refused.
fn test_oversized_declaration_ignored() {
    let mut assembler = FastPacketAssembler::new();
    let result = assembler.process_frame(&frame(ID, [0x40, 224, 1, 2, 3, 4, 5, 6]), true);
    assert!(matches!(result, ProcessResult::Ignored));
    assert_eq!(assembler.active_sessions(), 0);
}

#[test]
/// A truncated continuation frame drops the partial message.
fn test_truncated_continuation_dropped() {
    let mut assembler = FastPacketAssembler::new();
    assembler.process_frame(&frame(ID, [0x40, 20, 1, 2, 3, 4, 5, 6]), true);
    let short = CanFrame::new(ID, &[0x41, 7, 8]).unwrap();
    assert!(matches!(
        assembler.process_frame(&short, true),
        ProcessResult::Ignored
    ));
    assert_eq!(assembler.active_sessions(), 0);
}

#[test]
/// Interleaved messages from two identifiers stay independent.
fn test_interleaved_identifiers() {
    let mut assembler = FastPacketAssembler::new();
    assembler.process_frame(&frame(ID, [0x40, 9, 1, 1, 1, 1, 1, 1]), true);
    assembler.process_frame(&frame(OTHER_ID, [0x40, 9, 2, 2, 2, 2, 2, 2]), true);
    assert_eq!(assembler.active_sessions(), 2);

    let second = completed(
        assembler.process_frame(&frame(OTHER_ID, [0x41, 2, 2, 2, 0xFF, 0xFF, 0xFF, 0xFF]), true),
    );
    let first = completed(
        assembler.process_frame(&frame(ID, [0x41, 1, 1, 1, 0xFF, 0xFF, 0xFF, 0xFF]), true),
    );
    assert_eq!(first.id, ID);
    assert_eq!(first.payload.as_slice(), &[1; 9]);
    assert_eq!(second.id, OTHER_ID);
    assert_eq!(second.payload.as_slice(), &[2; 9]);
}

#[test]
/// Once every slot is busy, further first frames are ignored.
fn test_pool_exhaustion() {
    let mut assembler = FastPacketAssembler::new();
    for source in 0..8u32 {
        let id = CanId(0x09ED_FF00 | source);
        let result = assembler.process_frame(&frame(id, [0x40, 20, 0, 0, 0, 0, 0, 0]), true);
        assert!(matches!(result, ProcessResult::FragmentConsumed));
    }
    let overflow = assembler.process_frame(&frame(CanId(0x09ED_FF08), [0x40, 20, 0, 0, 0, 0, 0, 0]), true);
    assert!(matches!(overflow, ProcessResult::Ignored));
    assert_eq!(assembler.active_sessions(), 8);
}
