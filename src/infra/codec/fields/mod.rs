//! Schema-driven field model.
//!
//! `PgnFields` holds the decoded value of every field of one payload in a
//! fixed-capacity table of slots. Each slot starts from the layout of its
//! `FieldDescriptor`; variable-width slots (group-function parameter values)
//! get their layout at runtime, either borrowed from another PGN's field or
//! forced through `set_bit_length`.
use crate::core::{Availability, FieldDescriptor, FieldKind, PgnDescriptor};
use crate::error::{DecodeError, FieldError};
use crate::infra::codec::bits::{low_mask, BitReader, BitWriter};
use crate::protocol::messages::{is_proprietary, schema::SchemaProvider};

/// Maximum number of slots (fixed fields plus repeated ones) per message.
pub const MAX_FIELDS: usize = 40;

//==================================================================================SLOT
#[derive(Debug, Clone, Copy)]
struct FieldSlot {
    /// Schema entry the slot was created from.
    descriptor: &'static FieldDescriptor,
    /// Index of that entry in `PgnDescriptor::fields`.
    field_index: usize,
    /// Effective layout (may differ from the descriptor after `borrow_layout`).
    kind: FieldKind,
    bits: Option<u32>,
    signed: bool,
    resolution: Option<f32>,
    /// Raw bits as they travel on the wire.
    raw: u64,
}

impl FieldSlot {
    fn new(descriptor: &'static FieldDescriptor, field_index: usize) -> Self {
        let mut slot = Self {
            descriptor,
            field_index,
            kind: descriptor.kind,
            bits: descriptor.bits_length,
            signed: descriptor.is_signed.unwrap_or(false),
            resolution: descriptor.resolution,
            raw: 0,
        };
        slot.raw = match descriptor.match_value {
            Some(value) => value & slot.mask(),
            None => slot.sentinel(),
        };
        slot
    }

    fn mask(&self) -> u64 {
        self.bits.map_or(u64::MAX, |bits| low_mask(bits.min(64)))
    }

    /// "Not available" pattern: all ones, or the largest positive value when signed.
    fn sentinel(&self) -> u64 {
        match self.bits {
            Some(bits) if self.signed && bits >= 2 => low_mask(bits.min(64) - 1),
            _ => self.mask(),
        }
    }

    fn availability(&self) -> Availability {
        match self.bits {
            None => Availability::NotAvailable,
            Some(bits) if bits >= 2 && self.raw == self.sentinel() => Availability::NotAvailable,
            Some(_) => Availability::Available,
        }
    }

    fn value(&self) -> i64 {
        match self.bits {
            Some(bits) if self.signed => sign_extend(self.raw, bits.min(64) as u8),
            _ => self.raw as i64,
        }
    }

    fn decimal(&self) -> Result<f64, FieldError> {
        if !self.kind.is_numeric() {
            return Err(FieldError::TypeMismatch {
                field: self.descriptor.id,
            });
        }
        Ok(self.value() as f64 * self.resolution.map_or(1.0, f64::from))
    }

    fn int(&self) -> Result<i64, FieldError> {
        if !self.kind.is_integer() || self.resolution.is_some() {
            return Err(FieldError::TypeMismatch {
                field: self.descriptor.id,
            });
        }
        Ok(self.value())
    }

    fn known_bits(&self) -> Result<u32, FieldError> {
        self.bits.filter(|&bits| bits > 0).ok_or(FieldError::UnknownLength {
            field: self.descriptor.id,
        })
    }
}

//==================================================================================ACCESSORS
/// Read access to one field of a `PgnFields`.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    slot: &'a FieldSlot,
}

impl<'a> Field<'a> {
    /// Schema identifier (camelCase).
    pub fn id(&self) -> &'static str {
        self.slot.descriptor.id
    }

    /// Schema entry backing the field.
    pub fn descriptor(&self) -> &'static FieldDescriptor {
        self.slot.descriptor
    }

    /// Position of the schema entry in `PgnDescriptor::fields`.
    pub fn descriptor_index(&self) -> usize {
        self.slot.field_index
    }

    /// Effective kind (a borrowed layout replaces `Variable`).
    pub fn kind(&self) -> FieldKind {
        self.slot.kind
    }

    pub fn bit_length(&self) -> Option<u32> {
        self.slot.bits
    }

    pub fn is_signed(&self) -> bool {
        self.slot.signed
    }

    pub fn resolution(&self) -> Option<f32> {
        self.slot.resolution
    }

    /// Raw wire bits.
    pub fn raw(&self) -> u64 {
        self.slot.raw
    }

    pub fn availability(&self) -> Availability {
        self.slot.availability()
    }

    /// Physical value (raw × resolution). Numeric kinds only.
    pub fn decimal(&self) -> Result<f64, FieldError> {
        self.slot.decimal()
    }

    /// Integer value (sign-extended when signed). Integer kinds without resolution only.
    pub fn int(&self) -> Result<i64, FieldError> {
        self.slot.int()
    }
}

/// Write access to one field of a `PgnFields`.
#[derive(Debug)]
pub struct FieldMut<'a> {
    slot: &'a mut FieldSlot,
}

impl<'a> FieldMut<'a> {
    /// Read-only view of the same slot.
    pub fn as_field(&self) -> Field<'_> {
        Field { slot: self.slot }
    }

    pub fn availability(&self) -> Availability {
        self.slot.availability()
    }

    pub fn decimal(&self) -> Result<f64, FieldError> {
        self.slot.decimal()
    }

    pub fn int(&self) -> Result<i64, FieldError> {
        self.slot.int()
    }

    pub fn bit_length(&self) -> Option<u32> {
        self.slot.bits
    }

    /// Store a physical value: divided by the resolution, rounded to the
    /// nearest integer and saturated to the range that excludes the
    /// "not available" pattern.
    pub fn set_decimal(&mut self, value: f64) -> Result<(), FieldError> {
        if !self.slot.kind.is_numeric() {
            return Err(FieldError::TypeMismatch {
                field: self.slot.descriptor.id,
            });
        }
        if !value.is_finite() {
            return Err(FieldError::InvalidValue {
                field: self.slot.descriptor.id,
            });
        }
        let bits = self.slot.known_bits()?.min(64);
        let scaled = value / self.slot.resolution.map_or(1.0, f64::from);
        let rounded = round_to_i64(scaled) as i128;

        let (min, max): (i128, i128) = if self.slot.signed {
            let half = 1i128 << (bits - 1);
            (-half, if bits >= 2 { half - 2 } else { half - 1 })
        } else {
            let full = low_mask(bits) as i128;
            (0, if bits >= 2 { full - 1 } else { full })
        };
        let clamped = rounded.clamp(min, max) as i64;
        self.slot.raw = (clamped as u64) & self.slot.mask();
        Ok(())
    }

    /// Store an integer code. Integer kinds without resolution only.
    pub fn set_int(&mut self, value: i64) -> Result<(), FieldError> {
        if !self.slot.kind.is_integer() || self.slot.resolution.is_some() {
            return Err(FieldError::TypeMismatch {
                field: self.slot.descriptor.id,
            });
        }
        self.slot.known_bits()?;
        self.slot.raw = (value as u64) & self.slot.mask();
        Ok(())
    }

    /// Store raw wire bits, truncated to the field width.
    pub fn set_raw(&mut self, raw: u64) {
        self.slot.raw = raw & self.slot.mask();
    }

    pub fn set_not_available(&mut self) {
        self.slot.raw = self.slot.sentinel();
    }

    /// Force the width of the field (variable-width values).
    pub fn set_bit_length(&mut self, bits: u32) {
        self.slot.bits = Some(bits);
        self.slot.raw &= self.slot.mask();
    }

    /// Take width, signedness, resolution and kind from another field's
    /// descriptor. The value is reset to "not available".
    pub fn borrow_layout(&mut self, layout: &FieldDescriptor) {
        self.slot.kind = layout.kind;
        self.slot.bits = layout.bits_length;
        self.slot.signed = layout.is_signed.unwrap_or(false);
        self.slot.resolution = layout.resolution;
        self.slot.raw = self.slot.sentinel();
    }
}

//==================================================================================PGN_FIELDS
/// Values of every field of one PGN payload.
#[derive(Debug, Clone)]
pub struct PgnFields {
    descriptor: &'static PgnDescriptor,
    slots: [Option<FieldSlot>; MAX_FIELDS],
    len: usize,
}

impl PgnFields {
    /// Fresh message: every value "not available" except discriminators and
    /// constants (pre-set from the schema) and repetition counters (zero).
    pub fn new(descriptor: &'static PgnDescriptor) -> Result<Self, FieldError> {
        let mut fields = Self::empty(descriptor);
        for (index, field_desc) in descriptor.fields.iter().enumerate() {
            if descriptor.repeating_set_of(index).is_some() {
                continue;
            }
            let mut slot = FieldSlot::new(field_desc, index);
            if Self::is_counter(descriptor, index) {
                slot.raw = 0;
            }
            fields.push(slot)?;
        }
        Ok(fields)
    }

    /// Decode `payload` with the layout `descriptor`.
    ///
    /// A payload that stops exactly on a field boundary leaves the remaining
    /// fixed fields "not available"; one that stops inside a field fails.
    pub fn decode<S: SchemaProvider + ?Sized>(
        descriptor: &'static PgnDescriptor,
        payload: &[u8],
        schema: &S,
    ) -> Result<Self, DecodeError> {
        let mut fields = Self::empty(descriptor);
        let mut reader = BitReader::new(payload);

        let mut index = 0;
        while index < descriptor.fields.len() {
            let Some(set_index) = descriptor.repeating_set_of(index) else {
                fields.read_field(&mut reader, index, schema, false)?;
                index += 1;
                continue;
            };

            let rfs = &descriptor.repeating_field_sets[set_index];
            let counter = fields
                .position_of(rfs.count_field_index)
                .ok_or(FieldError::IndexOutOfRange {
                    index: rfs.count_field_index,
                })?;
            let declared = fields.slots[counter]
                .filter(|slot| slot.availability() == Availability::Available)
                .map_or(0, |slot| slot.raw as usize);
            let count = declared.min(rfs.max_repetitions);
            for _ in 0..count {
                for member in rfs.start_field_index..rfs.start_field_index + rfs.size {
                    fields.read_field(&mut reader, member, schema, true)?;
                }
            }
            if let Some(slot) = fields.slots[counter].as_mut() {
                slot.raw = count as u64;
            }
            index = rfs.start_field_index + rfs.size;
        }
        Ok(fields)
    }

    /// Write every slot into `buffer` and return the number of bytes used.
    /// Reserved bits are written as ones, spare bits as zeros.
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FieldError> {
        buffer.fill(0xFF);
        let mut writer = BitWriter::new(buffer);
        for slot in self.slots[..self.len].iter().flatten() {
            let bits = slot.known_bits()?;
            match slot.kind {
                FieldKind::Reserved => writer.write_ones(bits as usize)?,
                FieldKind::Spare => writer.write_zeros(bits as usize)?,
                _ if bits > 64 => writer.write_ones(bits as usize)?,
                _ => writer.write_u64(slot.raw, bits as u8)?,
            }
        }
        Ok(writer.byte_len())
    }

    /// Append one instance of repeating set `set_index` and bump its counter.
    /// Returns the slot index of the first field of the new instance.
    pub fn add_repeating_group(&mut self, set_index: usize) -> Result<usize, FieldError> {
        let descriptor = self.descriptor;
        let rfs = descriptor
            .repeating_field_sets
            .get(set_index)
            .ok_or(FieldError::IndexOutOfRange { index: set_index })?;
        let counter = self
            .position_of(rfs.count_field_index)
            .ok_or(FieldError::IndexOutOfRange {
                index: rfs.count_field_index,
            })?;
        let count = self.slots[counter].map_or(0, |slot| slot.raw as usize);
        if count >= rfs.max_repetitions || self.len + rfs.size > MAX_FIELDS {
            return Err(FieldError::CapacityExceeded);
        }

        let end = rfs.start_field_index + rfs.size;
        let insert_at = self.slots[..self.len]
            .iter()
            .flatten()
            .position(|slot| slot.field_index >= end)
            .unwrap_or(self.len);
        self.slots
            .copy_within(insert_at..self.len, insert_at + rfs.size);
        for (offset, member) in (rfs.start_field_index..end).enumerate() {
            self.slots[insert_at + offset] =
                Some(FieldSlot::new(&descriptor.fields[member], member));
        }
        self.len += rfs.size;

        if let Some(slot) = self.slots[counter].as_mut() {
            slot.raw = count as u64 + 1;
        }
        Ok(insert_at)
    }

    /// Layout this message was built or decoded with.
    pub fn descriptor(&self) -> &'static PgnDescriptor {
        self.descriptor
    }

    /// Number of slots (fixed fields plus repeated ones).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn field(&self, index: usize) -> Result<Field<'_>, FieldError> {
        self.slots[..self.len]
            .get(index)
            .and_then(Option::as_ref)
            .map(|slot| Field { slot })
            .ok_or(FieldError::IndexOutOfRange { index })
    }

    pub fn field_mut(&mut self, index: usize) -> Result<FieldMut<'_>, FieldError> {
        let len = self.len;
        self.slots[..len]
            .get_mut(index)
            .and_then(Option::as_mut)
            .map(|slot| FieldMut { slot })
            .ok_or(FieldError::IndexOutOfRange { index })
    }

    /// Iterate over every slot in wire order.
    pub fn iter(&self) -> impl Iterator<Item = Field<'_>> {
        self.slots[..self.len]
            .iter()
            .flatten()
            .map(|slot| Field { slot })
    }

    //==========================================INTERNALS
    fn empty(descriptor: &'static PgnDescriptor) -> Self {
        Self {
            descriptor,
            slots: [None; MAX_FIELDS],
            len: 0,
        }
    }

    fn is_counter(descriptor: &PgnDescriptor, index: usize) -> bool {
        descriptor
            .repeating_field_sets
            .iter()
            .any(|rfs| rfs.count_field_index == index)
    }

    fn push(&mut self, slot: FieldSlot) -> Result<(), FieldError> {
        if self.len == MAX_FIELDS {
            return Err(FieldError::CapacityExceeded);
        }
        self.slots[self.len] = Some(slot);
        self.len += 1;
        Ok(())
    }

    /// Slot holding the first occurrence of schema field `field_index`.
    fn position_of(&self, field_index: usize) -> Option<usize> {
        self.slots[..self.len]
            .iter()
            .position(|slot| slot.is_some_and(|s| s.field_index == field_index))
    }

    /// Read schema field `field_index` at the reader's cursor and append it.
    fn read_field<S: SchemaProvider + ?Sized>(
        &mut self,
        reader: &mut BitReader,
        field_index: usize,
        schema: &S,
        in_group: bool,
    ) -> Result<(), DecodeError> {
        let descriptor = self.descriptor;
        let field_desc = &descriptor.fields[field_index];
        let mut slot = FieldSlot::new(field_desc, field_index);
        if slot.kind == FieldKind::Variable {
            self.resolve_variable(&mut slot, schema)?;
        }
        let bits = slot.known_bits()? as usize;
        let remaining = reader.remaining_bits();

        match slot.kind {
            FieldKind::Reserved | FieldKind::Spare => {
                reader.skip(bits.min(remaining))?;
            }
            _ if remaining == 0 && !in_group => {
                slot.raw = slot.sentinel();
            }
            _ if remaining < bits => {
                return Err(DecodeError::PayloadTooShort {
                    field: field_desc.id,
                });
            }
            _ if bits > 64 => {
                reader.skip(bits)?;
                slot.raw = slot.sentinel();
            }
            _ => {
                slot.raw = reader.read_u64(bits as u8)?;
            }
        }
        self.push(slot)?;
        Ok(())
    }

    /// Give a variable-width slot the layout of the field it carries.
    ///
    /// The commanded PGN is the message's `Pgn` field, the parameter number
    /// the slot just before. On proprietary PGNs parameters 1 and 3 are the
    /// manufacturer and industry codes, sent as 16 and 8 bits.
    fn resolve_variable<S: SchemaProvider + ?Sized>(
        &self,
        slot: &mut FieldSlot,
        schema: &S,
    ) -> Result<(), DecodeError> {
        let unknown = DecodeError::UnknownVariable {
            field: slot.descriptor.id,
        };
        let commanded_pgn = self
            .iter()
            .find(|f| f.kind() == FieldKind::Pgn)
            .filter(|f| f.availability() == Availability::Available)
            .map(|f| f.raw() as u32)
            .ok_or(unknown)?;
        let parameter = self.slots[..self.len]
            .last()
            .copied()
            .flatten()
            .filter(|prev| prev.availability() == Availability::Available)
            .map(|prev| prev.raw as usize)
            .ok_or(unknown)?;

        let mut view = FieldMut { slot };
        match parameter {
            1 if is_proprietary(commanded_pgn) => view.set_bit_length(16),
            3 if is_proprietary(commanded_pgn) => view.set_bit_length(8),
            _ => {
                let target = schema
                    .descriptor(commanded_pgn)
                    .and_then(|d| d.fields.get(parameter.wrapping_sub(1)))
                    .ok_or(unknown)?;
                view.borrow_layout(target);
            }
        }
        view.slot.kind = match view.slot.kind {
            FieldKind::Variable => FieldKind::Number,
            other => other,
        };
        Ok(())
    }
}

//==================================================================================HELPERS
/// Round half away from zero (no `f64::round` without `std`).
pub(crate) fn round_to_i64(value: f64) -> i64 {
    if value >= 0.0 {
        (value + 0.5) as i64
    } else {
        (value - 0.5) as i64
    }
}

/// Two's complement helper: propagate the sign bit of a `bits`-wide value.
fn sign_extend(value: u64, bits: u8) -> i64 {
    if bits == 0 || bits >= 64 {
        return value as i64;
    }
    let sign_bit_mask = 1u64 << (bits - 1);
    if (value & sign_bit_mask) != 0 {
        (value | (u64::MAX << bits)) as i64
    } else {
        value as i64
    }
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
