//! Turn the schema document into a static `PgnDescriptor` table.
use std::fmt::Write;

use crate::core::FieldKind;

use super::conf::{MAX_FAST_PACKET_BYTES, MAX_REPETITIONS};
use super::domain::*;
use super::errors::*;

/// Validate every PGN of the document and emit the descriptor table.
pub(crate) fn run_schema_gen(doc: &SchemaDocument) -> Result<String, BuildError> {
    let mut pgns: Vec<&PgnInstructions> = doc.pgns.iter().collect();
    // Sorted so the runtime can binary search by (PGN, discriminator).
    pgns.sort_by_key(|p| (p.pgn_id, p.match_value.unwrap_or(0)));
    for pair in pgns.windows(2) {
        if pair[0].pgn_id == pair[1].pgn_id && pair[0].match_value == pair[1].match_value {
            return Err(BuildError::DuplicateLayout {
                pgn: pair[0].pgn_id,
            });
        }
    }

    let mut buffer = String::new();
    writeln!(
        buffer,
        "/// Descriptors generated from the PGN schema, sorted by PGN then discriminator."
    )?;
    writeln!(
        buffer,
        "pub static PGN_DESCRIPTORS: &[crate::core::PgnDescriptor] = &["
    )?;
    for pgn in pgns {
        buffer.push_str(&generate_descriptor(pgn)?);
    }
    writeln!(buffer, "];")?;
    Ok(buffer)
}

//==================================================================================GENERATE_DESCRIPTOR
/// Emit one `PgnDescriptor` literal, checking the bit layout on the way.
fn generate_descriptor(pgn: &PgnInstructions) -> Result<String, BuildError> {
    let mut buffer = String::new();
    let is_fastpacket = pgn.fastpacket.eq_ignore_ascii_case("fast");
    let repeating_info = extract_repeating_set(pgn)?;

    writeln!(buffer, "\tcrate::core::PgnDescriptor {{")?;
    writeln!(buffer, "\t\tid: {},", pgn.pgn_id)?;
    writeln!(buffer, "\t\tname: {:?},", to_pascal_case(&pgn.pgn_name))?;
    writeln!(buffer, "\t\tdescription: {:?},", pgn.pgn_description)?;
    writeln!(buffer, "\t\tpriority: {:?},", pgn.priority)?;
    writeln!(buffer, "\t\tfastpacket: {},", is_fastpacket)?;
    writeln!(buffer, "\t\tlength: {:?},", pgn.length)?;
    writeln!(buffer, "\t\tmatch_value: {:?},", pgn.match_value)?;
    writeln!(buffer, "\t\tfields: &[")?;

    // Running offset; unknown once a variable-width field has been emitted.
    let mut running_offset: Option<u32> = Some(0);
    for field in &pgn.fields {
        let kind = map_to_fieldkind(pgn.pgn_id, field)?;
        let is_variable = field.bits_length_var.unwrap_or(false);

        if is_variable != (kind == FieldKind::Variable) || (is_variable && field.bits_length.is_some())
        {
            return Err(BuildError::BitLengthErr {
                pgn: pgn.pgn_id,
                field: field.id.clone(),
                comment: "variable width must go with the VARIABLE type and no BitLength",
            });
        }
        if !is_variable && field.bits_length.is_none() {
            return Err(BuildError::BitLengthErr {
                pgn: pgn.pgn_id,
                field: field.id.clone(),
                comment: "missing BitLength",
            });
        }
        if let (Some(declared), Some(running)) = (field.bits_offset, running_offset) {
            if declared != running {
                return Err(BuildError::BitLengthErr {
                    pgn: pgn.pgn_id,
                    field: field.id.clone(),
                    comment: "BitOffset does not follow the previous fields",
                });
            }
        }

        let is_resolution = field.resolution.filter(|&r| r != 1.0);
        let is_signed = field.signed.filter(|&s| s);

        writeln!(buffer, "\t\t\tcrate::core::FieldDescriptor {{")?;
        writeln!(buffer, "\t\t\t\tid: {:?},", field.id)?;
        writeln!(buffer, "\t\t\t\tname: {:?},", field.name)?;
        writeln!(buffer, "\t\t\t\tkind: crate::core::FieldKind::{:?},", kind)?;
        writeln!(buffer, "\t\t\t\tbits_length: {:?},", field.bits_length)?;
        writeln!(buffer, "\t\t\t\tbits_offset: {:?},", running_offset)?;
        writeln!(buffer, "\t\t\t\tis_signed: {:?},", is_signed)?;
        writeln!(buffer, "\t\t\t\tresolution: {:?},", is_resolution)?;
        writeln!(buffer, "\t\t\t\tphysical_unit: {:?},", field.physical_unit)?;
        writeln!(buffer, "\t\t\t\tmatch_value: {:?},", field.match_value)?;
        writeln!(buffer, "\t\t\t}},")?;

        running_offset = match (running_offset, field.bits_length) {
            (Some(offset), Some(bits)) => Some(offset + bits),
            _ => None,
        };
    }
    writeln!(buffer, "\t\t],")?;

    if let (Some(length), Some(total_bits)) = (pgn.length, running_offset) {
        if repeating_info.is_none() && total_bits > u32::from(length) * 8 {
            return Err(BuildError::BitLengthErr {
                pgn: pgn.pgn_id,
                field: String::from("*"),
                comment: "fields exceed the declared Length",
            });
        }
    }

    if let Some(info) = repeating_info {
        writeln!(buffer, "\t\trepeating_field_sets: &[")?;
        writeln!(buffer, "\t\t\tcrate::core::RepeatingFieldSet {{")?;
        writeln!(
            buffer,
            "\t\t\t\tcount_field_index: {},",
            info.count_field_index
        )?;
        writeln!(
            buffer,
            "\t\t\t\tstart_field_index: {},",
            info.start_field_index
        )?;
        writeln!(buffer, "\t\t\t\tsize: {},", info.size)?;
        writeln!(buffer, "\t\t\t\tmax_repetitions: {},", info.max_repetitions)?;
        writeln!(buffer, "\t\t\t}},")?;
        writeln!(buffer, "\t\t],")?;
    } else {
        writeln!(buffer, "\t\trepeating_field_sets: &[],")?;
    }
    writeln!(buffer, "\t}},")?;
    Ok(buffer)
}

//==================================================================================HELPERS
/// Convert the 1-based Orders of a repeating set into 0-based indices and
/// bound the repetitions by what a Fast Packet can carry.
fn extract_repeating_set(pgn: &PgnInstructions) -> Result<Option<RepeatingFieldSetInfo>, BuildError> {
    let (size, start_order, count_order) = match (
        pgn.repeating_field_set_1_size,
        pgn.repeating_field_set_1_start_field,
        pgn.repeating_field_set_1_count_field,
    ) {
        (Some(size), Some(start), Some(count)) => (size as usize, start, count),
        (None, None, None) => return Ok(None),
        _ => return Err(BuildError::RepeatingFieldSet { pgn: pgn.pgn_id }),
    };

    let position = |order: u16| pgn.fields.iter().position(|f| f.order == order);
    let start_field_index =
        position(start_order).ok_or(BuildError::RepeatingFieldSet { pgn: pgn.pgn_id })?;
    let count_field_index =
        position(count_order).ok_or(BuildError::RepeatingFieldSet { pgn: pgn.pgn_id })?;
    if size == 0
        || count_field_index >= start_field_index
        || start_field_index + size > pgn.fields.len()
    {
        return Err(BuildError::RepeatingFieldSet { pgn: pgn.pgn_id });
    }

    // Variable-width members are budgeted at one byte.
    let bits_of = |range: std::ops::Range<usize>| -> usize {
        pgn.fields[range]
            .iter()
            .map(|f| f.bits_length.unwrap_or(8) as usize)
            .sum()
    };
    let group_bits = bits_of(start_field_index..start_field_index + size);
    let fixed_bits = bits_of(0..start_field_index);
    let available_bits = (MAX_FAST_PACKET_BYTES * 8).saturating_sub(fixed_bits);
    let max_repetitions = (available_bits / group_bits.max(1)).min(MAX_REPETITIONS);

    Ok(Some(RepeatingFieldSetInfo {
        count_field_index,
        start_field_index,
        size,
        max_repetitions,
    }))
}

/// Normalize schema `FieldType` values into the runtime `FieldKind` enumeration.
fn map_to_fieldkind(pgn: u32, field: &Fields) -> Result<FieldKind, BuildError> {
    Ok(match field.kind.as_str() {
        "NUMBER" => FieldKind::Number,
        "LOOKUP" => FieldKind::Lookup,
        "BITLOOKUP" => FieldKind::BitLookup,
        "PGN" => FieldKind::Pgn,
        "VARIABLE" => FieldKind::Variable,
        "RESERVED" => FieldKind::Reserved,
        "SPARE" => FieldKind::Spare,
        "BINARY" => FieldKind::Binary,
        other => {
            return Err(BuildError::UnknownFieldType {
                pgn,
                field: field.id.clone(),
                kind: other.to_string(),
            })
        }
    })
}

/// `camelCase` → `PascalCase`, dropping anything that is not alphanumeric.
fn to_pascal_case(name: &str) -> String {
    let mut buffer = String::new();
    let mut capitalize_next = true;
    for c in name.chars().filter(|c| c.is_alphanumeric()) {
        if capitalize_next {
            buffer.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            buffer.push(c);
        }
    }
    buffer
}
