//! Abstraction traits used by the transport layer (CAN bus, timer, and message sender).
pub mod can_bus;
pub mod message_sender;
pub mod n2k_timer;
