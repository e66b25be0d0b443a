//! Group function construction and parsing.
use super::*;
use crate::error::DecodeError;
use crate::protocol::messages::schema::BuiltinSchema;
use crate::protocol::messages::{MHU_CALIBRATION, SPEED_CALIBRATION, WIND_DATA};

extern crate std;
use std::vec::Vec;

const DEVICE: u8 = 0x23;

fn builder(schema: &BuiltinSchema) -> GroupFunctionBuilder<'_, BuiltinSchema> {
    GroupFunctionBuilder::new(
        schema,
        GroupFunctionConfig {
            source_address: 0x10,
            ..GroupFunctionConfig::default()
        },
    )
}

#[test]
/// Request for the masthead calibration, byte for byte.
fn test_build_request() {
    let schema = BuiltinSchema;
    let request = builder(&schema).build_request(MHU_CALIBRATION).unwrap();

    assert_eq!(request.pgn(), GROUP_FUNCTION);
    assert_eq!(request.priority(), 2);
    assert_eq!(request.source(), 0x10);
    assert_eq!(request.destination(), BROADCAST_ADDRESS);
    assert_eq!(
        request.payload(),
        &[
            0x00, 0x54, 0xFF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02, 0x01, 0xE4, 0x07,
            0x03, 0x04
        ]
    );
    assert_eq!(request.schema().unwrap().match_value, Some(0));

    let frames: Vec<_> = request.frames().unwrap().collect();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].data, [0x40, 0x10, 0x00, 0x54, 0xFF, 0x01, 0xFF, 0xFF]);
}

#[test]
/// 5.0° on the wind angle offset: round(0.0873 rad / 0.001) = 87.
fn test_build_command_angle() {
    let schema = BuiltinSchema;
    let radians = 5.0 * core::f64::consts::PI / 180.0;
    let command = builder(&schema)
        .build_command(MHU_CALIBRATION, DEVICE, 3, radians)
        .unwrap();

    assert_eq!(command.destination(), DEVICE);
    assert_eq!(command.can_id().unwrap().0, 0x09ED_2310);
    assert_eq!(
        command.payload(),
        &[0x01, 0x54, 0xFF, 0x01, 0xFF, 0x03, 0x01, 0xE4, 0x07, 0x03, 0x04, 0x04, 0x57, 0x00]
    );
}

#[test]
/// Negative offsets use the signed layout of the target field.
fn test_build_command_negative() {
    let schema = BuiltinSchema;
    let command = builder(&schema)
        .build_command(MHU_CALIBRATION, DEVICE, 3, -0.1)
        .unwrap();
    // -100 as 16-bit two's complement.
    assert_eq!(&command.payload()[12..], &[0x9C, 0xFF]);
}

#[test]
/// Speed factor command on the second calibration PGN.
fn test_build_command_factor() {
    let schema = BuiltinSchema;
    let command = builder(&schema)
        .build_command(SPEED_CALIBRATION, DEVICE, 3, 1.05)
        .unwrap();
    assert_eq!(&command.payload()[1..4], &[0x55, 0xFF, 0x01]);
    assert_eq!(&command.payload()[11..], &[0x04, 0x1A, 0x04]);
}

#[test]
/// Reset sends the "restore default" pattern.
fn test_build_reset() {
    let schema = BuiltinSchema;
    let reset = builder(&schema)
        .build_reset(MHU_CALIBRATION, DEVICE, 4)
        .unwrap();
    assert_eq!(&reset.payload()[11..], &[0x05, 0xFE, 0xFF]);
}

#[test]
/// Unknown PGNs, out-of-range fields and non-numeric targets produce nothing.
fn test_build_command_errors() {
    let schema = BuiltinSchema;
    let builder = builder(&schema);
    assert_eq!(
        builder.build_command(129025, DEVICE, 1, 1.0).unwrap_err(),
        GroupFunctionError::SchemaResolution {
            pgn: 129025,
            field_index: 1
        }
    );
    assert_eq!(
        builder
            .build_command(MHU_CALIBRATION, DEVICE, 5, 1.0)
            .unwrap_err(),
        GroupFunctionError::SchemaResolution {
            pgn: MHU_CALIBRATION,
            field_index: 5
        }
    );
    assert_eq!(
        builder
            .build_command(MHU_CALIBRATION, DEVICE, 1, 1.0)
            .unwrap_err(),
        GroupFunctionError::Field(FieldError::TypeMismatch { field: "reserved" })
    );
    assert!(matches!(
        builder.build_reset(WIND_DATA, DEVICE, 3),
        Err(GroupFunctionError::Field(FieldError::TypeMismatch { .. }))
    ));
}

#[test]
/// NaN or infinite values never become a command.
fn test_build_command_non_finite() {
    let schema = BuiltinSchema;
    let builder = builder(&schema);
    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(matches!(
            builder.build_command(MHU_CALIBRATION, DEVICE, 3, value),
            Err(GroupFunctionError::Field(FieldError::InvalidValue { .. }))
        ));
    }
}

#[test]
/// A built command parses back into its pairs.
fn test_parse_command() {
    let schema = BuiltinSchema;
    let command = builder(&schema)
        .build_command(MHU_CALIBRATION, DEVICE, 4, 1.2)
        .unwrap();
    let parsed = GroupFunction::parse(&command, &schema).unwrap();

    assert!(parsed.is_command());
    assert_eq!(parsed.commanded_pgn, MHU_CALIBRATION);
    assert_eq!(parsed.source, 0x10);
    assert_eq!(parsed.destination, DEVICE);
    assert_eq!(parsed.parameters().len(), 3);
    assert!(parsed.is_from_vendor(2020, 4));
    assert!(!parsed.is_from_vendor(2021, 4));

    let factor = parsed.parameter(5).unwrap();
    assert_eq!(factor.raw, 1200);
    let value = factor.value.unwrap();
    assert!(value > 1.1999 && value < 1.2001);
}

#[test]
/// Requests parse too; their value pairs carry no resolution.
fn test_parse_request() {
    let schema = BuiltinSchema;
    let request = builder(&schema).build_request(SPEED_CALIBRATION).unwrap();
    let parsed = GroupFunction::parse(&request, &schema).unwrap();
    assert!(parsed.is_request());
    assert_eq!(parsed.commanded_pgn, SPEED_CALIBRATION);
    assert_eq!(parsed.parameter(1).unwrap().raw, 2020);
    assert_eq!(parsed.parameter(3).unwrap().raw, 4);
    assert!(parsed.is_from_vendor(2020, 4));
}

#[test]
/// Other PGNs and unknown function codes are not group functions.
fn test_parse_rejects() {
    let schema = BuiltinSchema;
    let wind = PgnMessage::new(2, WIND_DATA, 1, 0xFF, &[0; 8]).unwrap();
    assert_eq!(
        GroupFunction::parse(&wind, &schema).unwrap_err(),
        GroupFunctionError::NotGroupFunction { pgn: WIND_DATA }
    );

    let acknowledge = PgnMessage::new(2, GROUP_FUNCTION, 1, 0xFF, &[0x02, 0x54, 0xFF, 0x01]).unwrap();
    assert!(matches!(
        GroupFunction::parse(&acknowledge, &schema),
        Err(GroupFunctionError::NotGroupFunction { .. })
    ));

    let truncated = PgnMessage::new(
        2,
        GROUP_FUNCTION,
        1,
        0xFF,
        &[0x01, 0x54, 0xFF, 0x01, 0xFF, 0x02, 0x01, 0xE4],
    )
    .unwrap();
    assert!(matches!(
        GroupFunction::parse(&truncated, &schema),
        Err(GroupFunctionError::Decode(DecodeError::PayloadTooShort { .. }))
    ));
}
