//! Diagnostic line codec and HAL bridge.
use super::*;
use embedded_can::{Frame, StandardId};

extern crate std;
use std::string::ToString;

/// Minimal HAL frame used to exercise the `embedded-can` conversions.
struct HalFrame {
    id: Id,
    data: [u8; 8],
    dlc: usize,
}

impl Frame for HalFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let mut buffer = [0; 8];
        buffer[..data.len()].copy_from_slice(data);
        Some(Self {
            id: id.into(),
            data: buffer,
            dlc: data.len(),
        })
    }

    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.dlc
    }

    fn data(&self) -> &[u8] {
        &self.data[..self.dlc]
    }
}

#[test]
/// Display prints the identifier then one byte per DLC.
fn test_display_line() {
    let frame = CanFrame::new(CanId(0x09FF_5423), &[0xE4, 0x9F, 0x57, 0x00]).unwrap();
    assert_eq!(frame.to_string(), "09FF5423 E4 9F 57 00\r\n");
}

#[test]
/// A printed line parses back to the same frame.
fn test_line_round_trip() {
    let frame = CanFrame::new(
        CanId(0x09ED_FF00),
        &[0x40, 0x10, 0x00, 0x54, 0xFF, 0x01, 0xFF, 0xFF],
    )
    .unwrap();
    let parsed: CanFrame = frame.to_string().parse().unwrap();
    assert_eq!(parsed, frame);
}

#[test]
/// Lowercase digits and loose whitespace are accepted.
fn test_parse_tolerant() {
    let parsed: CanFrame = "  9fd0223   01 0a  ff\n".parse().unwrap();
    assert_eq!(parsed.id, CanId(0x09FD_0223));
    assert_eq!(parsed.payload(), &[0x01, 0x0A, 0xFF]);
}

#[test]
/// Malformed lines report what is wrong.
fn test_parse_errors() {
    assert_eq!(
        "".parse::<CanFrame>(),
        Err(FrameParseError::MissingIdentifier)
    );
    assert_eq!(
        "7DF 01 02".parse::<CanFrame>(),
        Err(FrameParseError::StandardIdentifier)
    );
    assert_eq!(
        "3FFFFFFF 01".parse::<CanFrame>(),
        Err(FrameParseError::InvalidIdentifier)
    );
    assert_eq!(
        "09FF5423 01 XY".parse::<CanFrame>(),
        Err(FrameParseError::InvalidByte { index: 1 })
    );
    assert_eq!(
        "09FF5423 01 02 03 04 05 06 07 08 09".parse::<CanFrame>(),
        Err(FrameParseError::TooManyBytes)
    );
}

#[test]
/// More than eight bytes cannot make a classic frame.
fn test_new_rejects_long_payload() {
    assert!(CanFrame::new(CanId(0), &[0; 9]).is_none());
    let frame = CanFrame::new(CanId(0), &[1, 2]).unwrap();
    assert_eq!(frame.data, [1, 2, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
/// Extended HAL frames convert both ways.
fn test_embedded_conversion() {
    let hal = HalFrame::new(ExtendedId::new(0x09F1_1223).unwrap(), &[0xAA, 0xBB]).unwrap();
    let frame = CanFrame::from_embedded(&hal).unwrap();
    assert_eq!(frame.id, CanId(0x09F1_1223));
    assert_eq!(frame.payload(), &[0xAA, 0xBB]);

    let back: HalFrame = frame.to_embedded().unwrap();
    assert_eq!(back.id, Id::Extended(ExtendedId::new(0x09F1_1223).unwrap()));
    assert_eq!(back.data(), &[0xAA, 0xBB]);
}

#[test]
/// Standard identifiers are refused.
fn test_embedded_standard_rejected() {
    let hal = HalFrame::new(StandardId::new(0x123).unwrap(), &[0x01]).unwrap();
    assert_eq!(
        CanFrame::from_embedded(&hal),
        Err(FrameParseError::StandardIdentifier)
    );
}
