//! Access to PGN layouts.
//!
//! The field model and the group-function builder never hard-code a layout:
//! they ask a `SchemaProvider`. `BuiltinSchema` serves the descriptors compiled
//! from `build_core/var/pgn_schema.json` by the build script.
use crate::core::PgnDescriptor;
use crate::infra::codec::bits::BitReader;

include!(concat!(env!("OUT_DIR"), "/generated_schema.rs"));

/// Lookup service over a set of PGN descriptors.
pub trait SchemaProvider {
    /// Every known layout, sorted by PGN then discriminator.
    fn descriptors(&self) -> &'static [PgnDescriptor];

    /// First layout registered for `pgn`.
    fn descriptor(&self, pgn: u32) -> Option<&'static PgnDescriptor> {
        let all = self.descriptors();
        let start = all.partition_point(|d| d.id < pgn);
        all.get(start).filter(|d| d.id == pgn)
    }

    /// Layout of `pgn` whose discriminator equals `match_value`.
    fn variant(&self, pgn: u32, match_value: u64) -> Option<&'static PgnDescriptor> {
        let all = self.descriptors();
        let start = all.partition_point(|d| d.id < pgn);
        all[start..]
            .iter()
            .take_while(|d| d.id == pgn)
            .find(|d| d.match_value == Some(match_value))
    }

    /// Layout matching a received payload: when several layouts share the
    /// PGN, the first field of the payload selects the variant.
    fn resolve(&self, pgn: u32, payload: &[u8]) -> Option<&'static PgnDescriptor> {
        let all = self.descriptors();
        let start = all.partition_point(|d| d.id < pgn);
        let mut candidates = all[start..].iter().take_while(|d| d.id == pgn).peekable();
        let first = *candidates.peek()?;
        if first.match_value.is_none() {
            return Some(first);
        }
        let bits = first.fields.first()?.bits_length?;
        let discriminator = BitReader::new(payload).read_u64(bits as u8).ok()?;
        candidates.find(|d| d.match_value == Some(discriminator))
    }

    /// Whether `pgn` travels as Fast Packet. Unknown PGNs are single frame.
    fn is_fast_packet(&self, pgn: u32) -> bool {
        self.descriptor(pgn).is_some_and(|d| d.fastpacket)
    }
}

/// Descriptors compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSchema;

impl SchemaProvider for BuiltinSchema {
    fn descriptors(&self) -> &'static [PgnDescriptor] {
        PGN_DESCRIPTORS
    }
}
