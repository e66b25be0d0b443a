//! In-memory representation of an SAE J1939 / NMEA 2000 CAN frame, its
//! textual diagnostic form (`"09FF5423 E4 9F 57 00 E8 03\r\n"`) and the
//! bridge to `embedded-can` HAL frames.
use core::fmt;
use core::str::FromStr;

use embedded_can::{ExtendedId, Id};

use crate::error::FrameParseError;
use crate::protocol::transport::can_id::CanId;

/// Largest 29-bit identifier.
const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Raw NMEA 2000 frame as read from the CAN bus.
pub struct CanFrame {
    /// Full 29-bit CAN identifier stored inside a `u32`.
    pub id: CanId,
    /// Payload buffer. Classic CAN frames always provide eight bytes.
    pub data: [u8; 8],
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: usize,
}

impl CanFrame {
    /// Copy `data` into a frame; unused bytes are set to 0xFF.
    /// Returns `None` for more than eight bytes.
    pub fn new(id: CanId, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let mut buffer = [0xFF; 8];
        buffer[..data.len()].copy_from_slice(data);
        Some(Self {
            id,
            data: buffer,
            len: data.len(),
        })
    }

    /// Valid payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len.min(8)]
    }

    /// Convert a HAL frame. Standard (11-bit) identifiers are not NMEA 2000.
    pub fn from_embedded<F: embedded_can::Frame>(frame: &F) -> Result<Self, FrameParseError> {
        let id = match frame.id() {
            Id::Standard(_) => return Err(FrameParseError::StandardIdentifier),
            Id::Extended(ext) => ext.as_raw(),
        };
        let data = frame.data();
        Self::new(CanId(id), &data[..data.len().min(8)]).ok_or(FrameParseError::TooManyBytes)
    }

    /// Build a HAL frame carrying the same identifier and payload.
    pub fn to_embedded<F: embedded_can::Frame>(&self) -> Option<F> {
        let id = ExtendedId::new(self.id.0)?;
        F::new(Id::Extended(id), self.payload())
    }
}

//==================================================================================DIAGNOSTIC_LINE
impl fmt::Display for CanFrame {
    /// `"{id:08X} {b0:02X} ... {bn:02X}\r\n"`, one byte per DLC.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.id.0)?;
        for byte in self.payload() {
            write!(f, " {:02X}", byte)?;
        }
        f.write_str("\r\n")
    }
}

impl FromStr for CanFrame {
    type Err = FrameParseError;

    /// Parse a diagnostic line. Extra whitespace and a trailing CR/LF are accepted.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let id_token = tokens.next().ok_or(FrameParseError::MissingIdentifier)?;
        if id_token.len() <= 3 {
            return Err(FrameParseError::StandardIdentifier);
        }
        let id = u32::from_str_radix(id_token, 16)
            .ok()
            .filter(|&id| id <= MAX_EXTENDED_ID)
            .ok_or(FrameParseError::InvalidIdentifier)?;

        let mut data = [0xFF; 8];
        let mut len = 0;
        for (index, token) in tokens.enumerate() {
            if index >= 8 {
                return Err(FrameParseError::TooManyBytes);
            }
            if token.len() > 2 {
                return Err(FrameParseError::InvalidByte { index });
            }
            data[index] =
                u8::from_str_radix(token, 16).map_err(|_| FrameParseError::InvalidByte { index })?;
            len = index + 1;
        }

        Ok(Self {
            id: CanId(id),
            data,
            len,
        })
    }
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
