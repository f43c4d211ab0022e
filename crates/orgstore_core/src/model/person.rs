//! Person record, membership join entity, and import provenance.
//!
//! # Responsibility
//! - Define the canonical person shape including the open profile map.
//! - Own the (person, group) membership pairing and its attribute bag.
//!
//! # Invariants
//! - `id` is globally unique and never reused, even after deletion.
//! - At most one membership exists per (person, group) pair.
//! - `phone`/`email` are stored in normalized form.

use crate::identity::DedupDescriptor;
use crate::model::group::GroupId;
use crate::model::performance::PerformanceRecord;
use crate::time::now_epoch_ms;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Stable identifier for a person.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type PersonId = Uuid;

/// Provenance entry recording where a person's data came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSource {
    /// Source label, e.g. `manual`, `csv_import`, `resume_import`.
    pub kind: String,
    /// When this source touched the record, epoch milliseconds.
    pub imported_at: i64,
}

/// Join entity between one person and one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    /// The group this membership points at.
    pub group_id: GroupId,
    /// When the person joined the group, epoch milliseconds.
    pub joined_at: i64,
    /// Last attribute update, epoch milliseconds.
    pub updated_at: i64,
    /// Open attribute bag scoped to this person-group pairing (role, task, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Membership {
    /// Creates a membership joining now with the given attributes.
    pub fn new(group_id: GroupId, attributes: BTreeMap<String, Value>) -> Self {
        let now = now_epoch_ms();
        Self {
            group_id,
            joined_at: now,
            updated_at: now,
            attributes,
        }
    }

    /// Shallow-merges the provided attributes and bumps `updated_at`.
    pub fn merge_attributes(&mut self, attributes: BTreeMap<String, Value>) {
        self.attributes.extend(attributes);
        self.updated_at = now_epoch_ms();
    }
}

/// Canonical person record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Stable person id, generated at creation and immutable.
    pub id: PersonId,
    /// Display name.
    pub name: String,
    /// Normalized phone number; empty when unknown.
    #[serde(default)]
    pub phone: String,
    /// Normalized email address; empty when unknown.
    #[serde(default)]
    pub email: String,
    /// How the dedup key was computed and its resolved value.
    pub dedup: DedupDescriptor,
    /// Creation timestamp, epoch milliseconds.
    pub created_at: i64,
    /// Last-update timestamp, epoch milliseconds.
    pub updated_at: i64,
    /// Schema-less profile attribute map.
    #[serde(default)]
    pub profile: BTreeMap<String, Value>,
    /// Provenance of imports that touched this record.
    #[serde(default)]
    pub sources: Vec<ImportSource>,
    /// Group memberships, at most one per group.
    #[serde(default)]
    pub memberships: Vec<Membership>,
    /// Performance state; always present after migration.
    #[serde(default)]
    pub performance: PerformanceRecord,
}

impl Person {
    /// Creates a person with a generated stable id and empty collections.
    pub fn new(name: impl Into<String>, phone: String, email: String) -> Self {
        let dedup = DedupDescriptor::compute(&phone, &email);
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone: crate::identity::normalize_phone(&phone),
            email: crate::identity::normalize_email(&email),
            dedup,
            created_at: now,
            updated_at: now,
            profile: BTreeMap::new(),
            sources: Vec::new(),
            memberships: Vec::new(),
            performance: PerformanceRecord::empty(),
        }
    }

    /// Finds this person's membership in `group_id`, if any.
    pub fn membership(&self, group_id: GroupId) -> Option<&Membership> {
        self.memberships.iter().find(|m| m.group_id == group_id)
    }

    /// Finds this person's membership in `group_id` for mutation.
    pub fn membership_mut(&mut self, group_id: GroupId) -> Option<&mut Membership> {
        self.memberships.iter_mut().find(|m| m.group_id == group_id)
    }

    /// Records that an import source touched this record.
    pub fn record_source(&mut self, kind: impl Into<String>) {
        self.sources.push(ImportSource {
            kind: kind.into(),
            imported_at: now_epoch_ms(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{Membership, Person};
    use serde_json::json;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    #[test]
    fn new_person_normalizes_contacts_and_computes_dedup() {
        let person = Person::new(
            "Alice",
            "138-0013-8000".to_string(),
            " Alice@Example.com ".to_string(),
        );
        assert_eq!(person.phone, "13800138000");
        assert_eq!(person.email, "alice@example.com");
        assert_eq!(person.dedup.key, "phone:13800138000");
        assert!(person.memberships.is_empty());
        assert_eq!(person.performance.base_score, 0.0);
    }

    #[test]
    fn membership_attribute_merge_is_shallow_overwrite() {
        let group = Uuid::new_v4();
        let mut membership = Membership::new(
            group,
            BTreeMap::from([("role".to_string(), json!("lead"))]),
        );
        membership.merge_attributes(BTreeMap::from([
            ("role".to_string(), json!("member")),
            ("task".to_string(), json!("docs")),
        ]));
        assert_eq!(membership.attributes["role"], json!("member"));
        assert_eq!(membership.attributes["task"], json!("docs"));
    }
}
