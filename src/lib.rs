//! `n2k-calib` library: NMEA 2000 transport and Group Function calibration
//! for `no_std` targets. The crate exposes the infrastructure modules (bit
//! codec, schema-driven field model) and the protocol logic (CAN identifiers,
//! Fast Packet, messages, group functions, calibration session).
#![no_std]
//==================================================================================
/// Core data types shared by the build script and the field model.
pub mod core;
/// Domain and low-level errors (CAN identifier construction, framing,
/// field access, group functions and calibration session).
pub mod error;
/// Bit-level payload codec and the field model built on top of it.
pub mod infra;
/// NMEA 2000 protocol implementation: CAN transport, Fast Packet,
/// messages, group functions and calibration.
pub mod protocol;
//==================================================================================
