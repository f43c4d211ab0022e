//! Document persistence boundary: codec, migrations and store errors.
//!
//! # Responsibility
//! - Load/save the single persisted document with atomic replacement.
//! - Upgrade older on-disk schema versions before typed decoding.
//!
//! # Invariants
//! - No partially migrated or malformed document ever reaches callers.
//! - Save never leaves the target file in a partially written state.

use crate::ledger::EventValidationError;
use crate::model::group::GroupId;
use crate::model::person::PersonId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod codec;
pub mod migrations;

pub use codec::{load_document, save_document};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error for persistence and mutation boundaries.
#[derive(Debug)]
pub enum StoreError {
    /// Filesystem failure while reading or replacing the document.
    Io(std::io::Error),
    /// File exists but cannot be parsed into the expected shape.
    Malformed(String),
    /// Document declares a schema version newer than this binary supports.
    UnsupportedSchemaVersion {
        found: u64,
        latest_supported: u32,
    },
    /// Mutation referenced a group id that does not exist.
    UnknownGroup(GroupId),
    /// Mutation referenced a person id that does not exist.
    UnknownPerson(PersonId),
    /// Event or patch failed boundary validation.
    InvalidEvent(EventValidationError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Malformed(message) => write!(f, "malformed store document: {message}"),
            Self::UnsupportedSchemaVersion {
                found,
                latest_supported,
            } => write!(
                f,
                "document schema version {found} is newer than supported {latest_supported}"
            ),
            Self::UnknownGroup(id) => write!(f, "unknown group reference: {id}"),
            Self::UnknownPerson(id) => write!(f, "unknown person reference: {id}"),
            Self::InvalidEvent(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::InvalidEvent(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<EventValidationError> for StoreError {
    fn from(value: EventValidationError) -> Self {
        Self::InvalidEvent(value)
    }
}
