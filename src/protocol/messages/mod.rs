//! Logical NMEA 2000 messages: the `PgnMessage` envelope exchanged between the
//! transport and the application, plus the PGN numbers this crate handles.
pub mod schema;

use crate::core::{PgnBytes, PgnDescriptor};
use crate::error::{FramingError, MessageError};
use crate::protocol::transport::can_id::{CanId, BROADCAST_ADDRESS};
use crate::protocol::transport::fast_packet::assembler::CompletedMessage;
use crate::protocol::transport::fast_packet::builder::{FastPacketBuilder, FrameIterator};
use schema::SchemaProvider;

//==================================================================================PGNS
/// NMEA Request/Command/Acknowledge Group Function.
pub const GROUP_FUNCTION: u32 = 126208;
/// Vessel Heading.
pub const VESSEL_HEADING: u32 = 127250;
/// Attitude (yaw, pitch, roll).
pub const ATTITUDE: u32 = 127257;
/// Speed (water referenced).
pub const SPEED: u32 = 128259;
/// Wind Data.
pub const WIND_DATA: u32 = 130306;
/// Proprietary masthead unit calibration (wind angle offset, wind speed factor).
pub const MHU_CALIBRATION: u32 = 130900;
/// Proprietary speed sensor calibration (water speed factor).
pub const SPEED_CALIBRATION: u32 = 130901;

/// Whether `pgn` belongs to one of the manufacturer proprietary ranges.
pub fn is_proprietary(pgn: u32) -> bool {
    matches!(pgn, 0xEF00 | 0xFF00..=0xFFFF | 0x1EF00 | 0x1FF00..=0x1FFFF)
}

//==================================================================================PGN_MESSAGE
/// One logical message: addressing plus up to 223 payload bytes.
#[derive(Debug, Clone, Copy)]
pub struct PgnMessage {
    priority: u8,
    pgn: u32,
    source: u8,
    destination: u8,
    payload: PgnBytes,
    schema: Option<&'static PgnDescriptor>,
}

impl PgnMessage {
    /// Wrap `payload`. Fails when it exceeds the Fast Packet capacity.
    pub fn new(
        priority: u8,
        pgn: u32,
        source: u8,
        destination: u8,
        payload: &[u8],
    ) -> Result<Self, MessageError> {
        let payload = PgnBytes::from_slice(payload).ok_or(MessageError::PayloadTooLarge {
            len: payload.len(),
        })?;
        Ok(Self {
            priority: priority & 0x07,
            pgn,
            source,
            destination,
            payload,
            schema: None,
        })
    }

    /// Attach the layout the payload follows.
    pub fn with_schema(mut self, schema: Option<&'static PgnDescriptor>) -> Self {
        self.schema = schema;
        self
    }

    /// Envelope for a message coming out of the assembler. The layout is
    /// resolved through `schema` (`None` for PGNs it does not know).
    pub fn from_completed<S: SchemaProvider + ?Sized>(
        completed: &CompletedMessage,
        schema: &S,
    ) -> Self {
        let fields = completed.id.decode();
        let payload = completed.payload;
        Self {
            priority: fields.priority,
            pgn: fields.pgn,
            source: fields.source,
            destination: fields.destination,
            schema: schema.resolve(fields.pgn, payload.as_slice()),
            payload,
        }
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn pgn(&self) -> u32 {
        self.pgn
    }

    pub fn source(&self) -> u8 {
        self.source
    }

    /// Destination address, [`BROADCAST_ADDRESS`] for global messages.
    pub fn destination(&self) -> u8 {
        self.destination
    }

    pub fn is_broadcast(&self) -> bool {
        self.destination == BROADCAST_ADDRESS
    }

    pub fn payload(&self) -> &[u8] {
        self.payload.as_slice()
    }

    /// Layout of the payload, when known.
    pub fn schema(&self) -> Option<&'static PgnDescriptor> {
        self.schema
    }

    /// Identifier the frames of this message are sent with.
    pub fn can_id(&self) -> Result<CanId, FramingError> {
        Ok(CanId::encode(
            self.priority,
            self.pgn,
            self.source,
            self.destination,
        )?)
    }

    /// Cut the message into CAN frames (single frame or Fast Packet).
    pub fn frames(&self) -> Result<FrameIterator<'_>, FramingError> {
        FastPacketBuilder::new(self.can_id()?, self.payload.as_slice()).build()
    }
}
