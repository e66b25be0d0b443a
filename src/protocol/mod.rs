//! High-level components of the NMEA 2000 protocol: CAN/Fast Packet
//! transport, message envelopes, group functions and the calibration session.
pub mod calibration;
pub mod group_function;
pub mod messages;
pub mod transport;
