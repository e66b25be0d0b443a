//! Unit tests for the field model.
use super::*;
use crate::core::PgnDescriptor;
use crate::protocol::messages::schema::BuiltinSchema;

const MHU: u32 = 130900;
const GROUP_FUNCTION: u32 = 126208;

fn close(a: f64, b: f64) -> bool {
    let delta = a - b;
    delta < 1e-5 && delta > -1e-5
}

fn mhu() -> &'static PgnDescriptor {
    BuiltinSchema.descriptor(MHU).unwrap()
}

fn group_function(code: u64) -> &'static PgnDescriptor {
    BuiltinSchema.variant(GROUP_FUNCTION, code).unwrap()
}

//==================================================================================NEW / ENCODE
#[test]
/// Identification constants are pre-set, measurements start "not available".
fn test_new_presets_identification() {
    let fields = PgnFields::new(mhu()).unwrap();
    assert_eq!(fields.len(), 5);
    assert_eq!(fields.field(0).unwrap().int(), Ok(2020));
    assert_eq!(fields.field(2).unwrap().int(), Ok(4));
    assert_eq!(
        fields.field(3).unwrap().availability(),
        Availability::NotAvailable
    );
    assert_eq!(
        fields.field(4).unwrap().availability(),
        Availability::NotAvailable
    );

    let mut buffer = [0u8; 8];
    let len = fields.encode(&mut buffer).unwrap();
    assert_eq!(&buffer[..len], &[0xE4, 0x9F, 0xFF, 0x7F, 0xFF, 0xFF]);
}

#[test]
/// Physical values are scaled and rounded to the nearest step.
fn test_set_decimal_encodes() {
    let mut fields = PgnFields::new(mhu()).unwrap();
    fields
        .field_mut(3)
        .unwrap()
        .set_decimal(5.0 * core::f64::consts::PI / 180.0)
        .unwrap();
    fields.field_mut(4).unwrap().set_decimal(1.0).unwrap();

    let mut buffer = [0u8; 8];
    let len = fields.encode(&mut buffer).unwrap();
    assert_eq!(&buffer[..len], &[0xE4, 0x9F, 0x57, 0x00, 0xE8, 0x03]);
    assert!(close(fields.field(3).unwrap().decimal().unwrap(), 0.087));
    assert!(close(fields.field(4).unwrap().decimal().unwrap(), 1.0));
}

#[test]
/// Out-of-range values saturate without producing the sentinel.
fn test_set_decimal_saturates() {
    let mut fields = PgnFields::new(mhu()).unwrap();
    let mut offset = fields.field_mut(3).unwrap();
    offset.set_decimal(100.0).unwrap();
    assert_eq!(offset.as_field().raw(), 0x7FFE);
    assert_eq!(offset.availability(), Availability::Available);
    offset.set_decimal(-100.0).unwrap();
    assert_eq!(offset.as_field().raw(), 0x8000);
    assert!(close(offset.decimal().unwrap(), -32.768));

    let mut factor = fields.field_mut(4).unwrap();
    factor.set_decimal(-1.0).unwrap();
    assert_eq!(factor.as_field().raw(), 0);
    factor.set_decimal(1000.0).unwrap();
    assert_eq!(factor.as_field().raw(), 0xFFFE);
}

#[test]
/// NaN is refused and leaves the stored value untouched.
fn test_set_decimal_rejects_nan() {
    let mut fields = PgnFields::new(mhu()).unwrap();
    let mut offset = fields.field_mut(3).unwrap();
    offset.set_decimal(0.05).unwrap();
    let before = offset.as_field().raw();
    assert!(matches!(
        offset.set_decimal(f64::NAN),
        Err(FieldError::InvalidValue { .. })
    ));
    assert_eq!(offset.as_field().raw(), before);
}

#[test]
/// Clearing a value writes the sentinel back.
fn test_set_not_available() {
    let mut fields = PgnFields::new(mhu()).unwrap();
    let mut offset = fields.field_mut(3).unwrap();
    offset.set_decimal(0.05).unwrap();
    assert_eq!(offset.availability(), Availability::Available);
    offset.set_not_available();
    assert_eq!(offset.availability(), Availability::NotAvailable);
    assert_eq!(offset.as_field().raw(), 0x7FFF);
}

#[test]
/// Accessors refuse interpretations the kind does not allow.
fn test_type_mismatch() {
    let mut fields = PgnFields::new(mhu()).unwrap();
    assert_eq!(
        fields.field(0).unwrap().decimal(),
        Err(FieldError::TypeMismatch {
            field: "manufacturerCode"
        })
    );
    assert_eq!(
        fields.field(3).unwrap().int(),
        Err(FieldError::TypeMismatch { field: "awaOffset" })
    );
    assert!(matches!(
        fields.field_mut(1).unwrap().set_decimal(1.0),
        Err(FieldError::TypeMismatch { .. })
    ));
    assert_eq!(
        fields.field(9).err(),
        Some(FieldError::IndexOutOfRange { index: 9 })
    );
}

//==================================================================================DECODE
#[test]
/// Signed sentinel and negative values decode as expected.
fn test_decode_signed_values() {
    let fields = PgnFields::decode(mhu(), &[0xE4, 0x9F, 0xA9, 0xFF, 0xFF, 0xFF], &BuiltinSchema)
        .unwrap();
    let offset = fields.field(3).unwrap();
    assert_eq!(offset.availability(), Availability::Available);
    assert!(close(offset.decimal().unwrap(), -0.087));
    assert_eq!(
        fields.field(4).unwrap().availability(),
        Availability::NotAvailable
    );
}

#[test]
/// A payload ending on a field boundary leaves the rest unavailable.
fn test_decode_short_payload_on_boundary() {
    let fields = PgnFields::decode(mhu(), &[0xE4, 0x9F, 0x57, 0x00], &BuiltinSchema).unwrap();
    assert_eq!(fields.len(), 5);
    assert_eq!(
        fields.field(3).unwrap().availability(),
        Availability::Available
    );
    assert_eq!(
        fields.field(4).unwrap().availability(),
        Availability::NotAvailable
    );
}

#[test]
/// A payload ending inside a field is an error.
fn test_decode_short_payload_mid_field() {
    let result = PgnFields::decode(mhu(), &[0xE4, 0x9F, 0x57, 0x00, 0xE8], &BuiltinSchema);
    assert_eq!(
        result.err(),
        Some(DecodeError::PayloadTooShort { field: "awsFactor" })
    );
}

#[test]
/// Command parameter values take the layout of the commanded field.
fn test_decode_command_variable_values() {
    let payload = [
        0x01, 0x54, 0xFF, 0x01, 0xFF, 0x03, 0x01, 0xE4, 0x07, 0x03, 0x04, 0x04, 0x57, 0x00,
    ];
    let fields = PgnFields::decode(group_function(1), &payload, &BuiltinSchema).unwrap();

    assert_eq!(fields.len(), 11);
    assert_eq!(fields.field(1).unwrap().int(), Ok(MHU as i64));
    assert_eq!(fields.field(4).unwrap().int(), Ok(3));

    let manufacturer = fields.field(6).unwrap();
    assert_eq!(manufacturer.bit_length(), Some(16));
    assert_eq!(manufacturer.int(), Ok(2020));

    let industry = fields.field(8).unwrap();
    assert_eq!(industry.bit_length(), Some(8));
    assert_eq!(industry.int(), Ok(4));

    let offset = fields.field(10).unwrap();
    assert_eq!(offset.descriptor_index(), 6);
    assert!(offset.is_signed());
    assert_eq!(offset.bit_length(), Some(16));
    assert!(close(offset.decimal().unwrap(), 0.087));
}

#[test]
/// Missing pairs inside the repeating group are an error.
fn test_decode_truncated_group() {
    let payload = [
        0x01, 0x54, 0xFF, 0x01, 0xFF, 0x03, 0x01, 0xE4, 0x07, 0x03, 0x04,
    ];
    let result = PgnFields::decode(group_function(1), &payload, &BuiltinSchema);
    assert_eq!(
        result.err(),
        Some(DecodeError::PayloadTooShort { field: "parameter" })
    );
}

#[test]
/// A value whose PGN is unknown cannot be sized.
fn test_decode_unknown_variable() {
    let payload = [
        0x01, 0x01, 0xF8, 0x01, 0xFF, 0x01, 0x02, 0x00, 0x00,
    ];
    let result = PgnFields::decode(group_function(1), &payload, &BuiltinSchema);
    assert_eq!(
        result.err(),
        Some(DecodeError::UnknownVariable { field: "value" })
    );
}

//==================================================================================REPEATING
#[test]
/// Each added group lands after the fixed fields and bumps the counter.
fn test_add_repeating_group() {
    let mut fields = PgnFields::new(group_function(0)).unwrap();
    assert_eq!(fields.len(), 5);
    assert_eq!(fields.field(4).unwrap().int(), Ok(0));

    let first = fields.add_repeating_group(0).unwrap();
    assert_eq!(first, 5);
    let second = fields.add_repeating_group(0).unwrap();
    assert_eq!(second, 7);
    assert_eq!(fields.len(), 9);
    assert_eq!(fields.field(4).unwrap().int(), Ok(2));
    assert_eq!(fields.field(7).unwrap().id(), "parameter");
    assert_eq!(fields.field(8).unwrap().kind(), FieldKind::Variable);
    assert_eq!(fields.field(8).unwrap().bit_length(), None);

    assert_eq!(
        fields.add_repeating_group(1).err(),
        Some(FieldError::IndexOutOfRange { index: 1 })
    );
}

#[test]
/// Variable values need a width before they can be written.
fn test_variable_width_must_be_set() {
    let mut fields = PgnFields::new(group_function(0)).unwrap();
    let first = fields.add_repeating_group(0).unwrap();
    fields.field_mut(first).unwrap().set_int(1).unwrap();

    let mut buffer = [0u8; 32];
    assert_eq!(
        fields.encode(&mut buffer).err(),
        Some(FieldError::UnknownLength { field: "value" })
    );

    let mut value = fields.field_mut(first + 1).unwrap();
    value.set_bit_length(16);
    value.set_int(2020).unwrap();
    let len = fields.encode(&mut buffer).unwrap();
    assert_eq!(len, 14);
    assert_eq!(&buffer[10..14], &[0x01, 0x01, 0xE4, 0x07]);
}

#[test]
/// Borrowing a layout switches width, sign and resolution.
fn test_borrow_layout() {
    let mut fields = PgnFields::new(group_function(1)).unwrap();
    let first = fields.add_repeating_group(0).unwrap();
    let mut value = fields.field_mut(first + 1).unwrap();
    value.borrow_layout(&mhu().fields[3]);

    assert_eq!(value.availability(), Availability::NotAvailable);
    assert_eq!(value.bit_length(), Some(16));
    value.set_decimal(-0.5).unwrap();
    assert_eq!(value.as_field().raw(), (-500i64 as u64) & 0xFFFF);
}

#[test]
/// Rounding goes half away from zero.
fn test_round_to_i64() {
    assert_eq!(round_to_i64(87.266), 87);
    assert_eq!(round_to_i64(2.5), 3);
    assert_eq!(round_to_i64(-2.5), -3);
    assert_eq!(round_to_i64(-0.4), 0);
}
