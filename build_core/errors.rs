//! Error set that can occur while generating code during the build step.
use std::env::VarError;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by the build script (JSON parsing, validation, code generation).
pub(crate) enum BuildError {
    /// Field offsets or lengths are inconsistent with the PGN layout.
    #[error("[MESSAGE]:Invalid bit layout for [PGN]:{pgn} [FIELD]:{field}, [COMMENT]:{comment}")]
    BitLengthErr {
        pgn: u32,
        field: String,
        comment: &'static str,
    },

    /// Field type not understood by the runtime field model.
    #[error("[MESSAGE]:Unsupported field type [PGN]:{pgn} [FIELD]:{field} [TYPE]:{kind}")]
    UnknownFieldType {
        pgn: u32,
        field: String,
        kind: String,
    },

    /// Repeating field set references fields that do not exist.
    #[error("[MESSAGE]:Invalid repeating field set [PGN]:{pgn}")]
    RepeatingFieldSet { pgn: u32 },

    /// Two layouts share a PGN without distinct discriminators.
    #[error("[MESSAGE]:Ambiguous layouts for [PGN]:{pgn}")]
    DuplicateLayout { pgn: u32 },

    /// Failed to read the `OUT_DIR` environment variable.
    #[error("[MESSAGE]:OUT_DIR error. [ERROR]:{source}")]
    OutDirErr {
        #[source]
        source: VarError,
    },

    /// Failure while parsing the schema document.
    #[error("[MESSAGE]:Invalid JSON format [Error]:{0:?}")]
    ParseJson(#[from] serde_json::Error),

    /// Unable to read a file from disk.
    #[error("[MESSAGE]:Failed to read file [PATH]:{path} [ERROR]:{source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the generated code to disk.
    #[error("[MESSAGE]:Failed to write file [PATH]:{path} [ERROR]:{source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Formatting error while writing generated code.
    #[error("[MESSAGE]:Failed to display writeln! macro [ERROR]:{source}")]
    WritelnErr {
        #[from]
        source: std::fmt::Error,
    },
}
