//! Payload codec: bit reader/writer and the `PgnFields` accessor built on top.
pub mod bits;
pub mod fields;
