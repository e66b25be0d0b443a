//! NMEA Request / Command Group Function (PGN 126208).
//!
//! A request asks a device to send a PGN, a command asks it to write one
//! field of a PGN. Proprietary PGNs are always addressed with two
//! identification pairs first: parameter 1 (manufacturer code, 16 bits) and
//! parameter 3 (industry code, 8 bits). Commanded values are encoded with
//! the layout of the target field, looked up through the schema.
use crate::core::{Availability, FieldDescriptor, PgnDescriptor, MAX_PGN_BYTES};
use crate::error::{FieldError, GroupFunctionError};
use crate::infra::codec::fields::{FieldMut, PgnFields};
use crate::protocol::messages::schema::SchemaProvider;
use crate::protocol::messages::{PgnMessage, GROUP_FUNCTION};
use crate::protocol::transport::can_id::BROADCAST_ADDRESS;

/// Function code of a request.
pub const FUNCTION_REQUEST: u8 = 0;
/// Function code of a command.
pub const FUNCTION_COMMAND: u8 = 1;

/// Parameter number carrying the manufacturer code.
pub const PARAM_MANUFACTURER_CODE: u8 = 1;
/// Parameter number carrying the industry code.
pub const PARAM_INDUSTRY_CODE: u8 = 3;

/// Most parameter pairs kept by [`GroupFunction::parse`].
pub const MAX_PARAMETERS: usize = 16;

// Slot positions shared by the request and command layouts.
const SLOT_FUNCTION_CODE: usize = 0;
const SLOT_COMMANDED_PGN: usize = 1;
const PARAMETER_SET: usize = 0;

//==================================================================================CONFIG
/// Identity of the local node in the messages it builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupFunctionConfig {
    /// Source address of the outgoing messages.
    pub source_address: u8,
    /// Manufacturer code of the target's proprietary PGNs (11 bits on the wire).
    pub manufacturer_code: u16,
    /// Industry code of the target's proprietary PGNs (4 = marine).
    pub industry_code: u8,
    /// CAN priority of the outgoing messages.
    pub priority: u8,
}

impl Default for GroupFunctionConfig {
    fn default() -> Self {
        Self {
            source_address: 0,
            manufacturer_code: 2020,
            industry_code: 4,
            priority: 2,
        }
    }
}

//==================================================================================BUILDER
/// Builds request, command and reset messages for PGN 126208.
#[derive(Debug, Clone, Copy)]
pub struct GroupFunctionBuilder<'s, S: SchemaProvider + ?Sized> {
    schema: &'s S,
    config: GroupFunctionConfig,
}

impl<'s, S: SchemaProvider + ?Sized> GroupFunctionBuilder<'s, S> {
    pub fn new(schema: &'s S, config: GroupFunctionConfig) -> Self {
        Self { schema, config }
    }

    pub fn config(&self) -> &GroupFunctionConfig {
        &self.config
    }

    /// Ask every node to send `commanded_pgn`.
    ///
    /// Transmission interval and offset are left "do not change" (all ones).
    pub fn build_request(&self, commanded_pgn: u32) -> Result<PgnMessage, GroupFunctionError> {
        let layout = self.layout(FUNCTION_REQUEST)?;
        let mut fields = PgnFields::new(layout)?;
        fields
            .field_mut(SLOT_COMMANDED_PGN)?
            .set_int(commanded_pgn as i64)?;
        self.push_identification(&mut fields)?;
        self.finish(layout, &fields, BROADCAST_ADDRESS)
    }

    /// Write `value` (physical units of the target field) into field
    /// `field_index` of `commanded_pgn` on node `destination`.
    pub fn build_command(
        &self,
        commanded_pgn: u32,
        destination: u8,
        field_index: usize,
        value: f64,
    ) -> Result<PgnMessage, GroupFunctionError> {
        self.command(commanded_pgn, destination, field_index, |slot| {
            slot.set_decimal(value)
        })
    }

    /// Ask node `destination` to restore the default of field `field_index`:
    /// every value bit set except bit 0 (`0xFFFE` on 16 bits).
    pub fn build_reset(
        &self,
        commanded_pgn: u32,
        destination: u8,
        field_index: usize,
    ) -> Result<PgnMessage, GroupFunctionError> {
        self.command(commanded_pgn, destination, field_index, |slot| {
            slot.set_raw(!1u64);
            Ok(())
        })
    }

    //==========================================INTERNALS
    fn layout(&self, function_code: u8) -> Result<&'static PgnDescriptor, GroupFunctionError> {
        self.schema
            .variant(GROUP_FUNCTION, function_code as u64)
            .ok_or(GroupFunctionError::MissingLayout { function_code })
    }

    fn target_field(
        &self,
        commanded_pgn: u32,
        field_index: usize,
    ) -> Result<&'static FieldDescriptor, GroupFunctionError> {
        let target = self
            .schema
            .descriptor(commanded_pgn)
            .and_then(|d| d.fields.get(field_index))
            .ok_or(GroupFunctionError::SchemaResolution {
                pgn: commanded_pgn,
                field_index,
            })?;
        if !target.kind.is_numeric() {
            return Err(FieldError::TypeMismatch { field: target.id }.into());
        }
        Ok(target)
    }

    fn command(
        &self,
        commanded_pgn: u32,
        destination: u8,
        field_index: usize,
        write: impl FnOnce(&mut FieldMut<'_>) -> Result<(), FieldError>,
    ) -> Result<PgnMessage, GroupFunctionError> {
        let target = self.target_field(commanded_pgn, field_index)?;
        let layout = self.layout(FUNCTION_COMMAND)?;
        let mut fields = PgnFields::new(layout)?;
        fields
            .field_mut(SLOT_COMMANDED_PGN)?
            .set_int(commanded_pgn as i64)?;
        // Priority setting stays all ones: "do not change priority".
        self.push_identification(&mut fields)?;

        let slot = fields.add_repeating_group(PARAMETER_SET)?;
        fields.field_mut(slot)?.set_int(field_index as i64 + 1)?;
        let mut value = fields.field_mut(slot + 1)?;
        value.borrow_layout(target);
        write(&mut value)?;

        self.finish(layout, &fields, destination)
    }

    /// Manufacturer and industry pairs, always first.
    fn push_identification(&self, fields: &mut PgnFields) -> Result<(), FieldError> {
        let pairs = [
            (PARAM_MANUFACTURER_CODE, 16, self.config.manufacturer_code as i64),
            (PARAM_INDUSTRY_CODE, 8, self.config.industry_code as i64),
        ];
        for (parameter, bits, code) in pairs {
            let slot = fields.add_repeating_group(PARAMETER_SET)?;
            fields.field_mut(slot)?.set_int(parameter as i64)?;
            let mut value = fields.field_mut(slot + 1)?;
            value.set_bit_length(bits);
            value.set_int(code)?;
        }
        Ok(())
    }

    fn finish(
        &self,
        layout: &'static PgnDescriptor,
        fields: &PgnFields,
        destination: u8,
    ) -> Result<PgnMessage, GroupFunctionError> {
        let mut buffer = [0u8; MAX_PGN_BYTES];
        let len = fields.encode(&mut buffer)?;
        let message = PgnMessage::new(
            self.config.priority,
            GROUP_FUNCTION,
            self.config.source_address,
            destination,
            &buffer[..len],
        )?;
        Ok(message.with_schema(Some(layout)))
    }
}

//==================================================================================PARSING
/// One parameter pair of a received group function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterPair {
    /// 1-based field number in the commanded PGN.
    pub number: u8,
    /// Raw value bits as received.
    pub raw: u64,
    /// Physical value, when the layout gives one and it is available.
    pub value: Option<f64>,
}

impl ParameterPair {
    const EMPTY: Self = Self {
        number: 0,
        raw: 0,
        value: None,
    };
}

/// Decoded request or command.
#[derive(Debug, Clone, Copy)]
pub struct GroupFunction {
    pub function_code: u8,
    pub commanded_pgn: u32,
    pub source: u8,
    pub destination: u8,
    parameters: [ParameterPair; MAX_PARAMETERS],
    parameter_count: usize,
}

impl GroupFunction {
    /// Decode a received 126208 message. Function codes without a layout
    /// (acknowledge, read, write...) are reported as `NotGroupFunction`.
    pub fn parse<S: SchemaProvider + ?Sized>(
        message: &PgnMessage,
        schema: &S,
    ) -> Result<Self, GroupFunctionError> {
        let not_group_function = GroupFunctionError::NotGroupFunction { pgn: message.pgn() };
        if message.pgn() != GROUP_FUNCTION {
            return Err(not_group_function);
        }
        let layout = schema
            .resolve(GROUP_FUNCTION, message.payload())
            .ok_or(not_group_function)?;
        let fields = PgnFields::decode(layout, message.payload(), schema)?;

        let mut parsed = Self {
            function_code: fields.field(SLOT_FUNCTION_CODE)?.int()? as u8,
            commanded_pgn: fields.field(SLOT_COMMANDED_PGN)?.int()? as u32,
            source: message.source(),
            destination: message.destination(),
            parameters: [ParameterPair::EMPTY; MAX_PARAMETERS],
            parameter_count: 0,
        };

        let Some(set) = layout.repeating_field_sets.get(PARAMETER_SET) else {
            return Ok(parsed);
        };
        let mut slots = fields.iter().skip_while(|f| f.descriptor_index() != set.start_field_index);
        while let (Some(number), Some(value)) = (slots.next(), slots.next()) {
            if parsed.parameter_count == MAX_PARAMETERS {
                break;
            }
            let available = value.availability() == Availability::Available;
            parsed.parameters[parsed.parameter_count] = ParameterPair {
                number: number.raw() as u8,
                raw: value.raw(),
                value: value.decimal().ok().filter(|_| available),
            };
            parsed.parameter_count += 1;
        }
        Ok(parsed)
    }

    pub fn is_request(&self) -> bool {
        self.function_code == FUNCTION_REQUEST
    }

    pub fn is_command(&self) -> bool {
        self.function_code == FUNCTION_COMMAND
    }

    /// Every parameter pair, identification pairs included.
    pub fn parameters(&self) -> &[ParameterPair] {
        &self.parameters[..self.parameter_count]
    }

    /// First pair carrying field `number`.
    pub fn parameter(&self, number: u8) -> Option<&ParameterPair> {
        self.parameters().iter().find(|p| p.number == number)
    }

    /// Whether the two leading pairs identify `manufacturer_code` / `industry_code`.
    pub fn is_from_vendor(&self, manufacturer_code: u16, industry_code: u8) -> bool {
        let leading = &self.parameters[..self.parameter_count.min(2)];
        let matches = |number: u8, expected: u64| {
            leading
                .iter()
                .any(|p| p.number == number && p.raw == expected)
        };
        leading.len() == 2
            && matches(PARAM_MANUFACTURER_CODE, manufacturer_code as u64)
            && matches(PARAM_INDUSTRY_CODE, industry_code as u64)
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
