//! NMEA 2000 Fast Packet assembler: rebuilds application messages by
//! aggregating the CAN frames of a multi-packet session.
use super::MAX_FAST_PACKET_PAYLOAD;
use crate::core::PgnBytes;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;

//==================================================================================Constants

/// Maximum number of Fast Packet sessions handled in parallel (distinct identifiers).
const MAX_CONCURRENT_SESSIONS: usize = 8;
/// Payload bytes carried by the first frame.
const FIRST_FRAME_BYTES: usize = 6;
/// Payload bytes carried by continuation frames.
const NEXT_FRAME_BYTES: usize = 7;

//==================================================================================Enums and Structs
#[derive(Debug)]
pub enum ProcessResult {
    /// Frame discarded (orphan, bad sequence, truncated, pool exhausted...).
    Ignored,
    /// Frame integrated but additional fragments are still missing.
    FragmentConsumed,
    /// The complete message is available.
    MessageComplete(CompletedMessage),
}

/// Reassembled message, copied out of the assembler's internal buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedMessage {
    /// Identifier of the frames the message arrived with.
    pub id: CanId,
    /// Reassembled payload, padding removed.
    pub payload: PgnBytes,
}

/// Possible states for a reassembly session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SessionState {
    Inactive,
    InProgress,
}

/// State of one in-progress reassembly.
#[derive(Debug, Clone, Copy)]
struct FastPacketSession {
    state: SessionState,
    id: CanId,
    sequence_id: u8,
    buffer: [u8; MAX_FAST_PACKET_PAYLOAD],
    expected_size: usize,
    current_size: usize,
    last_frame_index: u8,
}

impl FastPacketSession {
    const fn new() -> Self {
        Self {
            state: SessionState::Inactive,
            id: CanId(0),
            sequence_id: 0,
            buffer: [0; MAX_FAST_PACKET_PAYLOAD],
            expected_size: 0,
            current_size: 0,
            last_frame_index: 0,
        }
    }

    /// Make the slot available again. The buffer is overwritten by the next session.
    fn reset(&mut self) {
        self.state = SessionState::Inactive;
        self.sequence_id = 0;
        self.expected_size = 0;
        self.current_size = 0;
        self.last_frame_index = 0;
    }

    fn is_active_for(&self, id: CanId) -> bool {
        self.state == SessionState::InProgress && self.id == id
    }

    /// Copy `bytes` and return the message when it is complete.
    fn append(&mut self, bytes: &[u8]) -> ProcessResult {
        let end = self.current_size + bytes.len();
        self.buffer[self.current_size..end].copy_from_slice(bytes);
        self.current_size = end;

        if self.current_size < self.expected_size {
            return ProcessResult::FragmentConsumed;
        }

        let mut payload = PgnBytes::new();
        payload.data[..self.expected_size].copy_from_slice(&self.buffer[..self.expected_size]);
        payload.len = self.expected_size;
        let completed = CompletedMessage {
            id: self.id,
            payload,
        };
        self.reset();
        ProcessResult::MessageComplete(completed)
    }
}

/// Reassembles inbound messages; owns a fixed pool of reusable sessions.
#[derive(Debug, Clone)]
pub struct FastPacketAssembler {
    sessions: [FastPacketSession; MAX_CONCURRENT_SESSIONS],
}

impl Default for FastPacketAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FastPacketAssembler {
    /// Instantiate the assembler with an inactive session pool.
    pub const fn new() -> Self {
        Self {
            sessions: [FastPacketSession::new(); MAX_CONCURRENT_SESSIONS],
        }
    }

    /// Number of reassemblies currently in progress.
    pub fn active_sessions(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.state == SessionState::InProgress)
            .count()
    }

    //==================================================================================Process Functions
    /// Process one received frame.
    ///
    /// * `frame` – received CAN frame; the reassembly key is its full identifier
    /// * `fast_packet` – whether the frame's PGN travels as Fast Packet
    ///
    /// Malformed input is reported as [`ProcessResult::Ignored`], never as an error.
    pub fn process_frame(&mut self, frame: &CanFrame, fast_packet: bool) -> ProcessResult {
        if !fast_packet {
            return Self::single_frame(frame);
        }
        if frame.len == 0 {
            return ProcessResult::Ignored;
        }

        let in_progress = self.sessions.iter().position(|s| s.is_active_for(frame.id));
        let frame_index = frame.data[0] & 0x1F;
        let sequence_id = (frame.data[0] >> 5) & 0x07;

        if frame_index == 0 {
            self.start_session(frame, in_progress, sequence_id)
        } else {
            match in_progress {
                Some(index) => self.continue_session(index, frame, frame_index, sequence_id),
                None => {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("Fast Packet: orphan frame {} for {:X}", frame_index, frame.id.0);
                    ProcessResult::Ignored
                }
            }
        }
    }

    fn single_frame(frame: &CanFrame) -> ProcessResult {
        match PgnBytes::from_slice(frame.payload()) {
            Some(payload) => ProcessResult::MessageComplete(CompletedMessage {
                id: frame.id,
                payload,
            }),
            None => ProcessResult::Ignored,
        }
    }

    fn start_session(
        &mut self,
        frame: &CanFrame,
        stale: Option<usize>,
        sequence_id: u8,
    ) -> ProcessResult {
        // A new first frame always restarts the reassembly for this identifier.
        if let Some(index) = stale {
            #[cfg(feature = "defmt")]
            defmt::debug!("Fast Packet: restart for {:X}", frame.id.0);
            self.sessions[index].reset();
        }

        let expected_size = frame.data[1] as usize;
        if expected_size > MAX_FAST_PACKET_PAYLOAD {
            return ProcessResult::Ignored;
        }

        let Some(index) = stale.or_else(|| {
            self.sessions
                .iter()
                .position(|s| s.state == SessionState::Inactive)
        }) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Fast Packet: session pool exhausted");
            return ProcessResult::Ignored;
        };

        let contributed = FIRST_FRAME_BYTES.min(expected_size);
        if frame.len < 2 + contributed {
            return ProcessResult::Ignored;
        }

        let session = &mut self.sessions[index];
        session.state = SessionState::InProgress;
        session.id = frame.id;
        session.sequence_id = sequence_id;
        session.expected_size = expected_size;
        session.current_size = 0;
        session.last_frame_index = 0;
        session.append(&frame.data[2..2 + contributed])
    }

    fn continue_session(
        &mut self,
        index: usize,
        frame: &CanFrame,
        frame_index: u8,
        sequence_id: u8,
    ) -> ProcessResult {
        let session = &mut self.sessions[index];

        // Another sequence on the same identifier: not ours, leave the session alone.
        if session.sequence_id != sequence_id {
            return ProcessResult::Ignored;
        }

        if frame_index != session.last_frame_index.wrapping_add(1) {
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "Fast Packet: expected frame {}, got {}",
                session.last_frame_index.wrapping_add(1),
                frame_index
            );
            session.reset();
            return ProcessResult::Ignored;
        }

        let contributed = NEXT_FRAME_BYTES.min(session.expected_size - session.current_size);
        if frame.len < 1 + contributed {
            session.reset();
            return ProcessResult::Ignored;
        }

        session.last_frame_index = frame_index;
        session.append(&frame.data[1..1 + contributed])
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
