//! NMEA 2000 Fast Packet support: carries payloads larger than eight bytes
//! across successive CAN frames.
pub use crate::core::MAX_PGN_BYTES as MAX_FAST_PACKET_PAYLOAD;

/// Sequence identifier used when the caller does not pick one.
pub const DEFAULT_SEQUENCE_ID: u8 = 2;

pub mod assembler;
pub mod builder;
