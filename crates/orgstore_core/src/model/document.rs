//! Top-level persisted document.
//!
//! # Responsibility
//! - Hold the whole store state: schema version, organization, groups, people.
//! - Provide lookup helpers shared by facade operations.
//!
//! # Invariants
//! - `schema_version` equals [`SCHEMA_VERSION`] for every in-memory document;
//!   older versions only exist transiently inside the migration chain.

use crate::model::group::{Group, GroupId};
use crate::model::organization::Organization;
use crate::model::person::{Person, PersonId};
use serde::{Deserialize, Serialize};

/// Current document schema version.
pub const SCHEMA_VERSION: u32 = 3;

/// Default display name for a freshly created organization.
pub const DEFAULT_ORG_NAME: &str = "organization";

/// The single structured document the store persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Declared schema version of the persisted shape.
    #[serde(rename = "_schema_version")]
    pub schema_version: u32,
    /// Singleton organization record.
    pub org: Organization,
    /// All groups, unordered.
    pub groups: Vec<Group>,
    /// All people, unordered.
    pub people: Vec<Person>,
}

impl Document {
    /// Creates an empty document at the current schema version.
    pub fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            org: Organization::new(DEFAULT_ORG_NAME),
            groups: Vec::new(),
            people: Vec::new(),
        }
    }

    /// Finds a group by id.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == id)
    }

    /// Finds a group by id for mutation.
    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|group| group.id == id)
    }

    /// Finds a person by id.
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.people.iter().find(|person| person.id == id)
    }

    /// Finds a person by id for mutation.
    pub fn person_mut(&mut self, id: PersonId) -> Option<&mut Person> {
        self.people.iter_mut().find(|person| person.id == id)
    }

    /// Finds a person by encoded dedup key; empty keys never match.
    pub fn person_by_dedup_key(&self, key: &str) -> Option<&Person> {
        if key.is_empty() {
            return None;
        }
        self.people.iter().find(|person| person.dedup.key == key)
    }

    /// Finds a person by encoded dedup key for mutation.
    pub fn person_by_dedup_key_mut(&mut self, key: &str) -> Option<&mut Person> {
        if key.is_empty() {
            return None;
        }
        self.people.iter_mut().find(|person| person.dedup.key == key)
    }
}
