//! Infrastructure shared by the protocol layers: bit-level payload codec and
//! the schema-driven field model.
pub mod codec;
