//! Creation and extraction of the 29-bit CAN identifiers used by
//! NMEA 2000 (derived from the SAE J1939 specification).
use crate::error::CanIdBuildError;

/// Destination address meaning "every node".
pub const BROADCAST_ADDRESS: u8 = 0xFF;
/// Highest PGN representable in the identifier (DP + PF + PS).
pub const MAX_PGN: u32 = 0x1FFFF;
/// PDU format bytes below this value are addressed (PDU1).
const PDU2_THRESHOLD: u8 = 240;

//==================================================================================CAN_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Encapsulates an extended CAN identifier (29 bits) and exposes accessors
/// for priority, PGN, destination, and source.
pub struct CanId(pub u32);

/// Logical addressing tuple carried by a `CanId`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanIdFields {
    pub priority: u8,
    pub pgn: u32,
    pub source: u8,
    /// `BROADCAST_ADDRESS` for PDU2 PGNs.
    pub destination: u8,
}

impl CanId {
    /// Pack the addressing tuple into an identifier.
    ///
    /// - PF < 240 (PDU1): the PGN low byte must be zero, the destination takes its place.
    /// - PF ≥ 240 (PDU2): the destination is implied global and `destination` is ignored.
    pub fn encode(
        priority: u8,
        pgn: u32,
        source: u8,
        destination: u8,
    ) -> Result<CanId, CanIdBuildError> {
        if pgn > MAX_PGN {
            return Err(CanIdBuildError::PgnOutOfRange { pgn });
        }
        let pdu_format = ((pgn >> 8) & 0xFF) as u8;
        let head = ((priority as u32 & 0x07) << 26) | (pgn << 8) | source as u32;

        if pdu_format < PDU2_THRESHOLD {
            if pgn & 0xFF != 0 {
                return Err(CanIdBuildError::InvalidAddressing { pgn });
            }
            Ok(CanId(head | ((destination as u32) << 8)))
        } else {
            Ok(CanId(head))
        }
    }

    /// Split the identifier back into its addressing tuple.
    pub fn decode(self) -> CanIdFields {
        CanIdFields {
            priority: self.priority(),
            pgn: self.pgn(),
            source: self.source_address(),
            destination: self.destination(),
        }
    }

    /// Creates a pre-configured `CanIdBuilder` for a PGN and source address.
    pub fn builder(pgn: u32, source_address: u8) -> CanIdBuilder {
        CanIdBuilder::new(pgn, source_address)
    }

    /// Returns the priority (3 bits, value 0-7) encoded in the CAN ID.
    pub fn priority(&self) -> u8 {
        ((self.0 >> 26) & 0x07) as u8
    }

    /// Extracts the 17-bit PGN, handling the PDU1/PDU2 distinction.
    pub fn pgn(&self) -> u32 {
        let ps = (self.0 >> 8) & 0xFF;
        let pf = (self.0 >> 16) & 0xFF;
        let dp = (self.0 >> 24) & 0x01;

        if self.is_pdu2() {
            // PDU2: implicit destination, PS becomes part of the PGN.
            (dp << 16) | (pf << 8) | ps
        } else {
            // PDU1: PS stores the explicit destination.
            (dp << 16) | (pf << 8)
        }
    }

    /// Destination address; `BROADCAST_ADDRESS` for PDU2 identifiers.
    pub fn destination(&self) -> u8 {
        if self.is_pdu2() {
            BROADCAST_ADDRESS
        } else {
            ((self.0 >> 8) & 0xFF) as u8
        }
    }

    /// Eight-bit source address (logical node identifier on the N2K network).
    pub fn source_address(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    fn is_pdu2(&self) -> bool {
        ((self.0 >> 16) & 0xFF) as u8 >= PDU2_THRESHOLD
    }
}
//==================================================================================CAN_ID_BUILDER
#[derive(Debug, Clone, Copy)]
/// Fluent front-end over [`CanId::encode`].
pub struct CanIdBuilder {
    pub priority: u8,
    pub pgn: u32,
    pub source_address: u8,
    pub destination: u8,
}

impl CanIdBuilder {
    /// Initializes the builder for a given PGN and source address (broadcast).
    pub fn new(pgn: u32, source_address: u8) -> Self {
        Self {
            priority: 6, // Default priority
            pgn,
            source_address,
            destination: BROADCAST_ADDRESS,
        }
    }

    /// Sets the priority (3 bits) to use during construction.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority & 0x07;
        self
    }

    /// Assigns a destination address (only meaningful for PDU1 PGNs).
    pub fn to_destination(mut self, destination_address: u8) -> Self {
        self.destination = destination_address;
        self
    }

    pub fn build(self) -> Result<CanId, CanIdBuildError> {
        CanId::encode(
            self.priority,
            self.pgn,
            self.source_address,
            self.destination,
        )
    }
}
