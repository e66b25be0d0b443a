//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (CAN ID construction,
//! framing, field access, group-function building, calibration session).
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors that can occur while building a 29-bit CAN identifier.
pub enum CanIdBuildError {
    /// In PDU1 (PF < 240) the lower 8 bits of the PGN must remain zero:
    /// that byte carries the destination address.
    #[error("PDU1 PGN {pgn} has a non-zero low byte")]
    InvalidAddressing { pgn: u32 },
    /// The PGN does not fit the 17 bits available in the identifier.
    #[error("PGN {pgn} out of range")]
    PgnOutOfRange { pgn: u32 },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while cutting a payload into CAN frames.
pub enum FramingError {
    /// Payload exceeds the 223 bytes a Fast Packet can carry.
    #[error("Payload too large for Fast Packet: {len} bytes")]
    PayloadTooLarge { len: usize },
    /// The identifier for the frames could not be built.
    #[error(transparent)]
    Addressing(#[from] CanIdBuildError),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while building a `PgnMessage` envelope.
pub enum MessageError {
    /// Payload exceeds the Fast Packet maximum.
    #[error("Payload too large: {len} bytes")]
    PayloadTooLarge { len: usize },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised when parsing a textual diagnostic line.
pub enum FrameParseError {
    /// Line is empty or lacks the identifier.
    #[error("Missing identifier")]
    MissingIdentifier,
    /// Identifier is not an hexadecimal 29-bit value.
    #[error("Invalid identifier")]
    InvalidIdentifier,
    /// A data byte is not a two-digit hexadecimal value.
    #[error("Invalid data byte at position {index}")]
    InvalidByte { index: usize },
    /// More than eight data bytes.
    #[error("Too many data bytes")]
    TooManyBytes,
    /// The identifier is a standard (11-bit) identifier.
    #[error("Standard identifiers are not NMEA 2000 frames")]
    StandardIdentifier,
}

//================================================================================FIELD_MODEL

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised by typed field accessors.
pub enum FieldError {
    /// Field accessed with the wrong numeric interpretation.
    #[error("Type mismatch on field {field}")]
    TypeMismatch { field: &'static str },
    /// Field index beyond the fields of the message.
    #[error("Field index {index} out of range")]
    IndexOutOfRange { index: usize },
    /// Too many fields/repetitions for the fixed-capacity model.
    #[error("Field capacity exceeded")]
    CapacityExceeded,
    /// Field has no known bit length.
    #[error("Unknown bit length for field {field}")]
    UnknownLength { field: &'static str },
    /// NaN or infinite value given for a numeric field.
    #[error("Invalid value for field {field}")]
    InvalidValue { field: &'static str },
    /// Failure while writing bits into the output buffer.
    #[error("BitWrite error: {0}")]
    Bits(#[from] BitWriterError),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while decoding a payload into fields.
pub enum DecodeError {
    /// Payload ends before a mandatory field.
    #[error("Payload too short for field {field}")]
    PayloadTooShort { field: &'static str },
    /// A variable-width field could not be resolved through the schema.
    #[error("Cannot resolve variable field {field}")]
    UnknownVariable { field: &'static str },
    /// Decoded content does not fit the fixed-capacity model.
    #[error(transparent)]
    Field(#[from] FieldError),
    /// Bit-level access on the buffer failed.
    #[error("BitReader error: {0}")]
    Bits(#[from] BitReaderError),
}

//================================================================================GROUP_FUNCTION

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while building or parsing Group Function messages (PGN 126208).
pub enum GroupFunctionError {
    /// The commanded PGN or field index is unknown to the schema.
    #[error("Cannot resolve field {field_index} of PGN {pgn}")]
    SchemaResolution { pgn: u32, field_index: usize },
    /// The group-function layout itself is missing from the schema.
    #[error("Group function layout {function_code} missing from schema")]
    MissingLayout { function_code: u8 },
    /// Message is not a group function request or command.
    #[error("Not a group function message: PGN {pgn}")]
    NotGroupFunction { pgn: u32 },
    /// Field access failed while building the message.
    #[error(transparent)]
    Field(#[from] FieldError),
    /// Received payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Encoded payload does not fit a message.
    #[error(transparent)]
    Message(#[from] MessageError),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors returned by the calibration session on user actions.
pub enum SessionError {
    /// The item kind has no calibration parameter.
    #[error("Item is not calibratable")]
    NotCalibratable,
    /// `submit` was called before a value was entered.
    #[error("No pending calibration value")]
    NoPendingValue,
    /// No device answered a calibration request yet.
    #[error("Calibration device address unknown")]
    DestinationUnknown,
    /// Building the command failed.
    #[error(transparent)]
    GroupFunction(#[from] GroupFunctionError),
}

//==================================================================================SEND_ERROR
#[derive(Debug, Error)]
/// Errors encountered when sending a message (segmentation + transmit).
pub enum SendMessageError<E: core::fmt::Debug> {
    /// Frames could not be built.
    #[error("Frame build failed: {0:?}")]
    Framing(FramingError),
    /// CAN layer refused or failed to send the frame.
    #[error("CAN bus send error: {0:?}")]
    Send(E),
}

#[derive(Debug, Error)]
/// Errors that stop the calibration worker loop.
pub enum CalibrationRunError<E: core::fmt::Debug> {
    /// The bus failed while receiving.
    #[error("CAN bus receive error: {0:?}")]
    Receive(E),
    /// The bus failed while sending a queued message.
    #[error("Send error: {0:?}")]
    Send(SendMessageError<E>),
}

//==================================================================================BITREADER_ERRORS
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised during bitwise buffer reads.
pub enum BitReaderError {
    /// Attempted to read past the end of the buffer.
    #[error("Attempted to read out of bounds -> asked: {asked}, available: {available}")]
    OutOfBounds { asked: usize, available: usize },
    /// Requested more bits than the target type can hold.
    #[error("Cannot read more than {max} bits. Requested: {asked}")]
    TooLongForType { max: u8, asked: u8 },
}
//==================================================================================BITWRITER_ERRORS
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised during bitwise writes into a buffer.
pub enum BitWriterError {
    /// Attempted to write beyond the provided capacity.
    #[error("Attempted to write out of bounds -> asked: {asked}, available: {available}")]
    OutOfBounds { asked: usize, available: usize },
    /// Field is too large for the provided type.
    #[error("Cannot write more than {max} bits. Requested: {asked}")]
    TooLongForType { max: u8, asked: u8 },
}
