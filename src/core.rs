//! Defines the "data contract" between `build.rs` (the scribe) and
//! the field model (the interpreter).
//!
//! `build.rs` turns `pgn_schema.json` into static descriptors of these types.
//! `infra::codec::fields` consumes them to read or write individual fields of a payload.

/// Largest payload a Fast Packet message can carry once reassembled.
pub const MAX_PGN_BYTES: usize = 223;

/// Semantic type of a field within a PGN.
/// Mirrors the `FieldType` entries found in the schema description.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FieldKind {
    /// Signed or unsigned integer; may carry a resolution (decimal field).
    Number,
    /// Value is an index into an enumeration.
    Lookup,
    /// Bitfield where each individual bit is a flag.
    BitLookup,
    /// Encodes another Parameter Group Number (e.g. the commanded PGN of 126208).
    Pgn,
    /// Width and scale are only known from another PGN's schema
    /// (value half of a group-function parameter pair).
    Variable,
    /// Reserved bits, written as ones and ignored on read.
    Reserved,
    /// Spare bits, written as zeros and ignored on read.
    Spare,
    /// Raw bytes.
    Binary,
}

impl FieldKind {
    /// Whether a decimal interpretation is meaningful for this kind.
    pub const fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Number | FieldKind::Pgn | FieldKind::Variable)
    }

    /// Whether the field holds an integer code rather than a measurement.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            FieldKind::Number
                | FieldKind::Lookup
                | FieldKind::BitLookup
                | FieldKind::Pgn
                | FieldKind::Variable
        )
    }
}

/// Descriptor for a single PGN field.
#[derive(Debug)]
pub struct FieldDescriptor {
    /// 1. Field identifier (camelCase, as in the schema).
    pub id: &'static str,
    /// 2. Human-readable name.
    pub name: &'static str,
    /// 3. Semantic type for the field.
    pub kind: FieldKind,
    /// 4. Field bit length (`None` for variable-width fields).
    pub bits_length: Option<u32>,
    /// 5. Absolute bit offset of the first bit (`None` after a variable field).
    pub bits_offset: Option<u32>,
    /// 6. Indicates whether numbers are signed.
    pub is_signed: Option<bool>,
    /// 7. Resolution factor to apply, when relevant.
    pub resolution: Option<f32>,
    /// 8. Physical unit (e.g. "rad", "m/s").
    pub physical_unit: Option<&'static str>,
    /// 9. Constant value the field must hold (variant discriminator).
    pub match_value: Option<u64>,
}

/// Describes a repeating field set within a PGN.
///
/// **Example:** PGN 126208 (Request Group Function)
/// ```text
/// Field 5 (numberOfParameters) = counter
/// Fields 6-7 (parameter, value) = repeating group
/// ```
#[derive(Debug)]
pub struct RepeatingFieldSet {
    /// Index of the field that stores the repetition counter.
    ///
    /// This field must appear BEFORE the first repeating field.
    pub count_field_index: usize,

    /// Index of the first field in the repeating group (0-based).
    pub start_field_index: usize,

    /// Number of consecutive fields inside the repeating group.
    pub size: usize,

    /// Maximum number of allowed repetitions.
    pub max_repetitions: usize,
}

/// Descriptor for an entire PGN layout.
#[derive(Debug)]
pub struct PgnDescriptor {
    /// 1. PGN identifier.
    pub id: u32,
    /// 2. PGN name (diagnostics).
    pub name: &'static str,
    /// 3. User-facing description.
    pub description: &'static str,
    /// 4. Default message priority.
    pub priority: Option<u8>,
    /// 5. Whether the message travels as Fast Packet.
    pub fastpacket: bool,
    /// 6. Payload length in bytes (if fixed).
    pub length: Option<u16>,
    /// 7. Discriminator value of the first field when several layouts share a PGN.
    pub match_value: Option<u64>,
    /// 8. Ordered list of field descriptors.
    pub fields: &'static [FieldDescriptor],
    /// 9. Repeating field sets (can be empty).
    pub repeating_field_sets: &'static [RepeatingFieldSet],
}

impl PgnDescriptor {
    /// Index of the repeating set a field belongs to, if any.
    pub fn repeating_set_of(&self, field_index: usize) -> Option<usize> {
        self.repeating_field_sets.iter().position(|rfs| {
            field_index >= rfs.start_field_index && field_index < rfs.start_field_index + rfs.size
        })
    }
}

/// Availability flag of a decoded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    NotAvailable,
}

/// Fixed-capacity payload buffer sized for the largest Fast Packet message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgnBytes {
    pub len: usize,
    pub data: [u8; MAX_PGN_BYTES],
}

impl Default for PgnBytes {
    fn default() -> Self {
        Self::new()
    }
}

impl PgnBytes {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            len: 0,
            data: [0; MAX_PGN_BYTES],
        }
    }

    /// Copy `slice` into a new buffer, or `None` when it exceeds the capacity.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() > MAX_PGN_BYTES {
            return None;
        }
        let mut bytes = Self::new();
        bytes.data[..slice.len()].copy_from_slice(slice);
        bytes.len = slice.len();
        Some(bytes)
    }

    /// Number of valid bytes stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks whether the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Immutable view over the populated bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }
}
