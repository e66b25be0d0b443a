//! Cargo build script: compiles the PGN schema into static descriptors.

// Re-export the core module from src/core.rs so build_core can reuse it
#[path = "src/core.rs"]
#[allow(dead_code)]
mod core;

mod build_core;
use crate::build_core::{
    conf::*, domain::SchemaDocument, errors::BuildError, gen_schema::run_schema_gen,
};

use std::fs;
use std::path::PathBuf;

// The schema (JSON, canboat naming) is the single source of truth for the
// payload layouts. This script validates it and writes a `&[PgnDescriptor]`
// table that `protocol::messages::schema` pulls in with `include!`.

//==================================================================================MAIN
fn main() -> Result<(), BuildError> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", PGN_SCHEMA_PATH);
    println!("cargo:rerun-if-env-changed={}", PGN_SCHEMA_PATH_ENV);

    // Priority order:
    //   1. N2K_CALIB_SCHEMA_PATH environment variable (absolute or relative path)
    //   2. Default schema shipped with the crate
    let default_schema_path = PathBuf::from(PGN_SCHEMA_PATH);
    let schema_path = match std::env::var(PGN_SCHEMA_PATH_ENV).ok().map(PathBuf::from) {
        Some(path) if path.exists() => {
            println!("cargo:warning=Using custom pgn_schema.json from {:?}", path);
            println!("cargo:rerun-if-changed={}", path.display());
            path
        }
        Some(path) => {
            println!(
                "cargo:warning=Custom schema path specified but file not found: {:?}",
                path
            );
            println!("cargo:warning=Falling back to the default pgn_schema");
            default_schema_path
        }
        None => default_schema_path,
    };

    let schema_string = fs::read_to_string(&schema_path).map_err(|e| BuildError::ReadFile {
        path: schema_path.clone(),
        source: e,
    })?;
    let schema: SchemaDocument = serde_json::from_str(&schema_string)?;

    let buffer_schema_code = run_schema_gen(&schema)?;

    let out_dir_str = std::env::var("OUT_DIR").map_err(|e| BuildError::OutDirErr { source: e })?;
    let schema_file_path = PathBuf::from(out_dir_str).join(OUT_DIR_SCHEMA_FILE_NAME);
    fs::write(&schema_file_path, &buffer_schema_code).map_err(|e| BuildError::WriteFile {
        path: schema_file_path,
        source: e,
    })?;

    Ok(())
}
