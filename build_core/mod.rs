//! Workspace for the build script: schema structures and the descriptor generator.
pub mod conf;
pub mod domain;
pub mod errors;
pub mod gen_schema;
