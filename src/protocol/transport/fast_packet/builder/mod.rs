//! CAN frame generator for NMEA 2000 messages. Builds the frame sequence
//! (single frame or Fast Packet) from an application payload.
use crate::error::FramingError;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::fast_packet::{DEFAULT_SEQUENCE_ID, MAX_FAST_PACKET_PAYLOAD};

/// Payload bytes carried by the first Fast Packet frame (after header + length).
const FIRST_FRAME_BYTES: usize = 6;
/// Payload bytes carried by every following frame (after the header).
const NEXT_FRAME_BYTES: usize = 7;

#[derive(Debug, Clone, Copy)]
/// Shared parameters for all frames composing one message.
pub struct FastPacketBuilder<'a> {
    id: CanId,
    payload: &'a [u8],
    sequence_id: u8,
}

impl<'a> FastPacketBuilder<'a> {
    /// Prepare the frames of `payload` sent under identifier `id`.
    pub fn new(id: CanId, payload: &'a [u8]) -> Self {
        Self {
            id,
            payload,
            sequence_id: DEFAULT_SEQUENCE_ID,
        }
    }

    /// Override the 3-bit Fast Packet sequence identifier.
    ///
    /// Interleaved messages from the same source on the same PGN must use
    /// different identifiers so receivers can tell them apart.
    pub fn with_sequence_id(mut self, sequence_id: u8) -> Self {
        self.sequence_id = sequence_id & 0x07;
        self
    }

    /// Validate the payload and start the iteration.
    pub fn build(self) -> Result<FrameIterator<'a>, FramingError> {
        if self.payload.len() > MAX_FAST_PACKET_PAYLOAD {
            return Err(FramingError::PayloadTooLarge {
                len: self.payload.len(),
            });
        }
        Ok(FrameIterator {
            builder: self,
            frame_index: 0,
            bytes_sent: 0,
            done: false,
        })
    }
}

/// Lazy iterator returning frames one by one as they are encoded.
#[derive(Debug, Clone)]
pub struct FrameIterator<'a> {
    builder: FastPacketBuilder<'a>,
    frame_index: u8,
    bytes_sent: usize,
    done: bool,
}

impl FrameIterator<'_> {
    /// Total number of frames the message produces.
    pub fn frame_count(&self) -> usize {
        let len = self.builder.payload.len();
        if len <= 8 {
            1
        } else {
            (len + 1).div_ceil(NEXT_FRAME_BYTES)
        }
    }

    /// Whether the message is segmented as Fast Packet.
    pub fn is_fast_packet(&self) -> bool {
        self.builder.payload.len() > 8
    }
}

impl Iterator for FrameIterator<'_> {
    type Item = CanFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let payload = self.builder.payload;
        let total_len = payload.len();

        // Payload ≤ 8 bytes: single-frame message, DLC follows the payload.
        if total_len <= 8 {
            self.done = true;
            let mut data = [0xFF; 8];
            data[..total_len].copy_from_slice(payload);
            return Some(CanFrame {
                id: self.builder.id,
                data,
                len: total_len,
            });
        }

        let mut data = [0xFF; 8];
        data[0] = (self.builder.sequence_id << 5) | (self.frame_index & 0x1F);

        let copied = if self.frame_index == 0 {
            // First frame: header, total length, then six payload bytes.
            data[1] = total_len as u8;
            data[2..2 + FIRST_FRAME_BYTES].copy_from_slice(&payload[..FIRST_FRAME_BYTES]);
            FIRST_FRAME_BYTES
        } else {
            let remaining = total_len - self.bytes_sent;
            let chunk = NEXT_FRAME_BYTES.min(remaining);
            data[1..1 + chunk].copy_from_slice(&payload[self.bytes_sent..self.bytes_sent + chunk]);
            chunk
        };

        self.bytes_sent += copied;
        self.frame_index = self.frame_index.wrapping_add(1);
        if self.bytes_sent >= total_len {
            self.done = true;
        }

        // Fast Packet frames are always padded to a full eight bytes.
        Some(CanFrame {
            id: self.builder.id,
            data,
            len: 8,
        })
    }
}
