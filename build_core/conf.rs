//! Paths and constants used during build-time code generation.
//==================================================================================CONF
/// Schema description shipped with the crate.
pub(crate) const PGN_SCHEMA_PATH: &str = "build_core/var/pgn_schema.json";
/// Environment variable overriding the schema location.
pub(crate) const PGN_SCHEMA_PATH_ENV: &str = "N2K_CALIB_SCHEMA_PATH";
/// Generated descriptor file name (written to `OUT_DIR`).
pub(crate) const OUT_DIR_SCHEMA_FILE_NAME: &str = "generated_schema.rs";
/// Largest payload a Fast Packet message can carry.
pub(crate) const MAX_FAST_PACKET_BYTES: usize = 223;
/// Upper bound on repetitions of a repeating field set.
pub(crate) const MAX_REPETITIONS: usize = 16;
