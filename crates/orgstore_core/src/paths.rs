//! Data-file location resolution.
//!
//! # Responsibility
//! - Resolve where the persisted document lives: explicit caller path first,
//!   then the `ORGSTORE_DATA_FILE` environment override, then the default
//!   filename in the working directory.

use std::ffi::OsString;
use std::path::PathBuf;

/// Default document filename when nothing else is configured.
pub const DEFAULT_DATA_FILE: &str = "org_store.json";

/// Environment variable overriding the document location.
pub const DATA_FILE_ENV: &str = "ORGSTORE_DATA_FILE";

/// Resolves the document path from the process environment.
pub fn data_file() -> PathBuf {
    resolve_data_file(std::env::var_os(DATA_FILE_ENV))
}

fn resolve_data_file(env_override: Option<OsString>) -> PathBuf {
    match env_override {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_DATA_FILE),
    }
}
