//! Document codec: JSON load with shape validation, atomic save.
//!
//! # Responsibility
//! - Parse the persisted file, run schema migrations, decode the typed
//!   document.
//! - Serialize and atomically replace the file on save.
//!
//! # Invariants
//! - Load is all-or-nothing: parse/shape failures surface as
//!   `StoreError::Malformed`, never as a silently repaired document.
//! - Save writes to a temp file in the destination directory and persists
//!   over the target, so readers never observe a torn file.

use super::migrations::migrate_to_current;
use super::{StoreError, StoreResult};
use crate::model::document::Document;
use log::{error, info};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;

/// Loads, migrates and decodes the document at `path`.
///
/// The file must exist; the facade is responsible for creating a fresh
/// empty document when it does not.
///
/// # Side effects
/// - Emits `store_load` logging events with duration and status.
pub fn load_document(path: impl AsRef<Path>) -> StoreResult<Document> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!("event=store_load module=store status=start path={}", path.display());

    match read_and_decode(path) {
        Ok(doc) => {
            info!(
                "event=store_load module=store status=ok duration_ms={} groups={} people={}",
                started_at.elapsed().as_millis(),
                doc.groups.len(),
                doc.people.len()
            );
            Ok(doc)
        }
        Err(err) => {
            error!(
                "event=store_load module=store status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn read_and_decode(path: &Path) -> StoreResult<Document> {
    let raw = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|err| StoreError::Malformed(format!("invalid JSON: {err}")))?;
    let migrated = migrate_to_current(value)?;
    serde_json::from_value(migrated)
        .map_err(|err| StoreError::Malformed(format!("unexpected document shape: {err}")))
}

/// Serializes `doc` and atomically replaces the file at `path`.
///
/// # Side effects
/// - Creates a temp file next to the target and persists it over `path`.
/// - Emits `store_save` logging events with duration and status.
pub fn save_document(path: impl AsRef<Path>, doc: &Document) -> StoreResult<()> {
    let path = path.as_ref();
    let started_at = Instant::now();

    match write_atomically(path, doc) {
        Ok(()) => {
            info!(
                "event=store_save module=store status=ok duration_ms={} groups={} people={}",
                started_at.elapsed().as_millis(),
                doc.groups.len(),
                doc.people.len()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=store_save module=store status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn write_atomically(path: &Path, doc: &Document) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(doc)
        .map_err(|err| StoreError::Malformed(format!("document serialization failed: {err}")))?;

    // The temp file must live in the destination directory so the final
    // rename stays on one filesystem.
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| StoreError::Io(err.error))?;
    Ok(())
}
