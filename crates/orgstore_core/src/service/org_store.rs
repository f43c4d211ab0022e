//! OrgStore facade: the public surface of the identity & performance store.
//!
//! # Responsibility
//! - Own the one in-memory document and its backing file for a session.
//! - Route every mutation through invariant checks before touching state.
//!
//! # Invariants
//! - Dedup uniqueness: an upsert whose key matches an existing person merges
//!   instead of creating a second record.
//! - Membership uniqueness: at most one membership per (person, group) pair.
//! - No dangling references: group deletion cascade-removes memberships, and
//!   mutations referencing unknown ids are rejected before any state change.
//! - Failed mutations never partially apply.
//!
//! Sessions follow a load-mutate-save discipline with last-write-wins
//! semantics across processes; there is no cross-session locking.

use crate::identity;
use crate::ledger::{self, EventDraft, EventFilter, EventPatch, Summary};
use crate::model::document::Document;
use crate::model::group::{Group, GroupId};
use crate::model::organization::Organization;
use crate::model::performance::{EventId, EventKind, PerformanceEvent};
use crate::model::person::{Membership, Person, PersonId};
use crate::paths;
use crate::store::{self, StoreError, StoreResult};
use crate::time::now_epoch_ms;
use log::info;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How an imported baseline score is applied to an existing person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaselinePolicy {
    /// Append an `import_base` ledger event, preserving audit history.
    #[default]
    AppendEvent,
    /// Overwrite `base_score` directly; explicit opt-in only.
    OverwriteBase,
}

/// Candidate record for a dedup-aware person upsert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsertCandidate {
    /// Display name; empty never erases an existing name.
    pub name: String,
    /// Raw phone number; normalized before storage.
    pub phone: String,
    /// Raw email address; normalized before storage.
    pub email: String,
    /// Profile fields to merge; empty values never erase existing data.
    pub profile: BTreeMap<String, Value>,
    /// Provenance label recorded on the person, e.g. `csv_import`.
    pub source: String,
    /// Group to join on upsert, with membership attributes.
    pub group: Option<GroupId>,
    /// Attributes for the membership created/updated by `group`.
    pub membership_attributes: BTreeMap<String, Value>,
    /// Imported baseline score, applied per the default baseline policy.
    pub baseline: Option<f64>,
}

/// Result of an upsert: the resolved person and whether it was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub person_id: PersonId,
    pub created: bool,
}

/// The facade owning the single in-memory document for one session.
#[derive(Debug)]
pub struct OrgStore {
    path: PathBuf,
    doc: Document,
}

impl OrgStore {
    /// Opens the store at `path`: loads and migrates the document when the
    /// file exists, otherwise starts a fresh empty document at the current
    /// schema version.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let doc = if path.exists() {
            store::load_document(&path)?
        } else {
            info!(
                "event=store_open module=service status=ok fresh=true path={}",
                path.display()
            );
            Document::empty()
        };
        Ok(Self { path, doc })
    }

    /// Opens the store at the environment-resolved default location.
    pub fn open_default() -> StoreResult<Self> {
        Self::open(paths::data_file())
    }

    /// Atomically persists the current document to the backing file.
    pub fn save(&self) -> StoreResult<()> {
        store::save_document(&self.path, &self.doc)
    }

    /// Read-only view of the owned document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The backing file path for this session.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ---- organization ----

    /// The singleton organization record.
    pub fn organization(&self) -> &Organization {
        &self.doc.org
    }

    /// Renames the organization.
    pub fn rename_organization(&mut self, name: impl Into<String>) {
        self.doc.org.rename(name);
    }

    // ---- groups ----

    /// Creates a group and returns its id.
    pub fn create_group(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        tags: Vec<String>,
    ) -> GroupId {
        let group = Group::new(name, description, tags);
        let id = group.id;
        self.doc.groups.push(group);
        info!("event=create_group module=service status=ok group={id}");
        id
    }

    /// Renames a group; returns `false` when the id is unknown.
    pub fn rename_group(&mut self, id: GroupId, name: impl Into<String>) -> bool {
        match self.doc.group_mut(id) {
            Some(group) => {
                group.rename(name);
                true
            }
            None => false,
        }
    }

    /// Deletes a group and cascade-removes every membership referencing it.
    ///
    /// Returns `false` when the id is unknown. The cascade keeps the
    /// document free of dangling group references.
    pub fn delete_group(&mut self, id: GroupId) -> bool {
        let before = self.doc.groups.len();
        self.doc.groups.retain(|group| group.id != id);
        if self.doc.groups.len() == before {
            return false;
        }
        let mut pruned = 0usize;
        for person in &mut self.doc.people {
            let had = person.memberships.len();
            person.memberships.retain(|m| m.group_id != id);
            if person.memberships.len() != had {
                pruned += had - person.memberships.len();
                person.updated_at = now_epoch_ms();
            }
        }
        info!("event=delete_group module=service status=ok group={id} memberships_pruned={pruned}");
        true
    }

    /// Finds a group by id.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.doc.group(id)
    }

    /// All groups, unordered.
    pub fn groups(&self) -> &[Group] {
        &self.doc.groups
    }

    // ---- people ----

    /// Creates or merges a person using the dedup identity rules.
    ///
    /// Resolution uses the key computed from the candidate's current contact
    /// data only. On merge, non-empty candidate fields overwrite and empty
    /// ones never erase; the stored contact fields and dedup key are left as
    /// they were (historical key drift is not reconciled).
    pub fn upsert_person(&mut self, candidate: UpsertCandidate) -> StoreResult<UpsertOutcome> {
        // Validate references and values before any state change.
        if let Some(group_id) = candidate.group {
            if self.doc.group(group_id).is_none() {
                return Err(StoreError::UnknownGroup(group_id));
            }
        }
        if let Some(baseline) = candidate.baseline {
            if !baseline.is_finite() {
                return Err(StoreError::InvalidEvent(
                    crate::ledger::EventValidationError::NonFiniteDelta,
                ));
            }
        }

        let key = identity::resolve(&candidate.phone, &candidate.email)
            .map(|k| k.encode())
            .unwrap_or_default();

        if let Some(person) = self.doc.person_by_dedup_key_mut(&key) {
            let person_id = person.id;
            merge_into_existing(person, &candidate);
            info!(
                "event=upsert_person module=service status=ok person={person_id} created=false"
            );
            return Ok(UpsertOutcome {
                person_id,
                created: false,
            });
        }

        let mut person = Person::new(
            candidate.name.clone(),
            candidate.phone.clone(),
            candidate.email.clone(),
        );
        person.profile = candidate.profile.clone();
        if !candidate.source.is_empty() {
            person.record_source(candidate.source.clone());
        }
        if let Some(group_id) = candidate.group {
            person
                .memberships
                .push(Membership::new(group_id, candidate.membership_attributes.clone()));
        }
        if let Some(baseline) = candidate.baseline {
            // A fresh person needs no audit event to explain its baseline.
            person.performance.base_score = baseline;
        }
        let person_id = person.id;
        self.doc.people.push(person);
        info!("event=upsert_person module=service status=ok person={person_id} created=true");
        Ok(UpsertOutcome {
            person_id,
            created: true,
        })
    }

    /// Finds a person by id.
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.doc.person(id)
    }

    /// All people, unordered.
    pub fn people(&self) -> &[Person] {
        &self.doc.people
    }

    /// Deletes a person and their memberships/ledger; returns `false` when
    /// the id is unknown. The id is never reused.
    pub fn delete_person(&mut self, id: PersonId) -> bool {
        let before = self.doc.people.len();
        self.doc.people.retain(|person| person.id != id);
        self.doc.people.len() != before
    }

    /// Looks a person up by contact fields using the dedup identity rules.
    pub fn find_person_by_identity(&self, phone: &str, email: &str) -> Option<&Person> {
        let key = identity::resolve(phone, email)?.encode();
        self.doc.person_by_dedup_key(&key)
    }

    /// All people holding a membership in `group_id`, paired with that
    /// membership. Order is unspecified; callers wanting a stable view
    /// sort the returned pairs themselves, e.g. by name or `joined_at`.
    pub fn list_members(&self, group_id: GroupId) -> Vec<(&Person, &Membership)> {
        self.doc
            .people
            .iter()
            .filter_map(|person| person.membership(group_id).map(|m| (person, m)))
            .collect()
    }

    /// All groups a person belongs to, paired with the membership.
    pub fn groups_of(&self, person_id: PersonId) -> Vec<(&Group, &Membership)> {
        let Some(person) = self.doc.person(person_id) else {
            return Vec::new();
        };
        person
            .memberships
            .iter()
            .filter_map(|m| self.doc.group(m.group_id).map(|group| (group, m)))
            .collect()
    }

    // ---- memberships ----

    /// Joins a person to a group, or shallow-merges attributes into the
    /// existing membership for the pair.
    ///
    /// Rejects unknown person/group references before any state change.
    pub fn add_or_update_membership(
        &mut self,
        person_id: PersonId,
        group_id: GroupId,
        attributes: BTreeMap<String, Value>,
    ) -> StoreResult<()> {
        if self.doc.group(group_id).is_none() {
            return Err(StoreError::UnknownGroup(group_id));
        }
        let person = self
            .doc
            .person_mut(person_id)
            .ok_or(StoreError::UnknownPerson(person_id))?;

        match person.membership_mut(group_id) {
            Some(membership) => membership.merge_attributes(attributes),
            None => person.memberships.push(Membership::new(group_id, attributes)),
        }
        person.updated_at = now_epoch_ms();
        Ok(())
    }

    /// Removes the membership for the pair; a no-op returning `false` when
    /// the person or membership does not exist. Idempotent.
    pub fn remove_membership(&mut self, person_id: PersonId, group_id: GroupId) -> bool {
        let Some(person) = self.doc.person_mut(person_id) else {
            return false;
        };
        let before = person.memberships.len();
        person.memberships.retain(|m| m.group_id != group_id);
        if person.memberships.len() == before {
            return false;
        }
        person.updated_at = now_epoch_ms();
        true
    }

    // ---- performance ----

    /// Validates and appends a ledger event, assigning an id when absent.
    pub fn append_event(&mut self, person_id: PersonId, draft: EventDraft) -> StoreResult<EventId> {
        if let Some(group_id) = draft.group_id {
            if self.doc.group(group_id).is_none() {
                return Err(StoreError::UnknownGroup(group_id));
            }
        }
        let person = self
            .doc
            .person_mut(person_id)
            .ok_or(StoreError::UnknownPerson(person_id))?;

        let event = draft.into_event()?;
        let event_id = event.id;
        person.performance.events.push(event);
        person.performance.updated_at = now_epoch_ms();
        info!(
            "event=append_event module=service status=ok person={person_id} ledger_event={event_id}"
        );
        Ok(event_id)
    }

    /// Applies a patch to one ledger event.
    ///
    /// Returns `Ok(false)` when the person or event id is not found; the
    /// ledger is left unchanged. Patch values are validated first.
    pub fn edit_event(
        &mut self,
        person_id: PersonId,
        event_id: EventId,
        patch: &EventPatch,
    ) -> StoreResult<bool> {
        patch.validate()?;
        if let Some(Some(group_id)) = patch.group_id {
            if self.doc.group(group_id).is_none() {
                return Err(StoreError::UnknownGroup(group_id));
            }
        }
        let Some(person) = self.doc.person_mut(person_id) else {
            return Ok(false);
        };
        let Some(event) = person.performance.event_mut(event_id) else {
            return Ok(false);
        };
        patch.apply(event);
        person.performance.updated_at = now_epoch_ms();
        Ok(true)
    }

    /// Deletes one ledger event; returns `false` when the person or event id
    /// is not found. Idempotent failure leaves the ledger unchanged.
    pub fn delete_event(&mut self, person_id: PersonId, event_id: EventId) -> bool {
        let Some(person) = self.doc.person_mut(person_id) else {
            return false;
        };
        let before = person.performance.events.len();
        person.performance.events.retain(|event| event.id != event_id);
        if person.performance.events.len() == before {
            return false;
        }
        person.performance.updated_at = now_epoch_ms();
        true
    }

    /// Sets the base score directly. Explicit overwrite operation; imports
    /// should prefer [`OrgStore::import_baseline`].
    pub fn set_base_score(&mut self, person_id: PersonId, value: f64) -> StoreResult<()> {
        if !value.is_finite() {
            return Err(StoreError::InvalidEvent(
                crate::ledger::EventValidationError::NonFiniteDelta,
            ));
        }
        let person = self
            .doc
            .person_mut(person_id)
            .ok_or(StoreError::UnknownPerson(person_id))?;
        person.performance.base_score = value;
        person.performance.updated_at = now_epoch_ms();
        Ok(())
    }

    /// Applies an imported baseline to an existing person.
    ///
    /// The default policy appends an `import_base` event so audit history is
    /// preserved; overwriting `base_score` requires the explicit
    /// [`BaselinePolicy::OverwriteBase`] opt-in.
    pub fn import_baseline(
        &mut self,
        person_id: PersonId,
        value: f64,
        policy: BaselinePolicy,
    ) -> StoreResult<()> {
        match policy {
            BaselinePolicy::AppendEvent => {
                self.append_event(
                    person_id,
                    EventDraft::new(EventKind::ImportBase, value, "imported baseline"),
                )?;
                Ok(())
            }
            BaselinePolicy::OverwriteBase => self.set_base_score(person_id, value),
        }
    }

    /// Derives the performance summary, optionally scoped to one group.
    pub fn performance_summary(
        &self,
        person_id: PersonId,
        group_scope: Option<GroupId>,
    ) -> Option<Summary> {
        self.doc
            .person(person_id)
            .map(|person| ledger::summary(&person.performance, group_scope))
    }

    /// Current score for a person, recomputed from the ledger.
    pub fn current_score(&self, person_id: PersonId) -> Option<f64> {
        self.doc
            .person(person_id)
            .map(|person| ledger::current_score(&person.performance))
    }

    /// Ledger events matching `filter`, in insertion order.
    pub fn events(
        &self,
        person_id: PersonId,
        filter: &EventFilter,
    ) -> Option<Vec<&PerformanceEvent>> {
        self.doc
            .person(person_id)
            .map(|person| ledger::filter_events(&person.performance, filter).collect())
    }
}

// Merge rules for an upsert hitting an existing person: non-empty overwrites,
// empty never erases, conflicting non-empty values resolve last-import-wins.
fn merge_into_existing(person: &mut Person, candidate: &UpsertCandidate) {
    if !candidate.name.trim().is_empty() {
        person.name = candidate.name.clone();
    }
    for (key, value) in &candidate.profile {
        if is_empty_value(value) {
            continue;
        }
        person.profile.insert(key.clone(), value.clone());
    }
    if !candidate.source.is_empty() {
        person.record_source(candidate.source.clone());
    }
    if let Some(group_id) = candidate.group {
        match person.membership_mut(group_id) {
            Some(membership) => {
                membership.merge_attributes(candidate.membership_attributes.clone())
            }
            None => person
                .memberships
                .push(Membership::new(group_id, candidate.membership_attributes.clone())),
        }
    }
    if let Some(baseline) = candidate.baseline {
        // Existing ledgers keep their history: the imported value lands as
        // an audit-visible event, never as a silent base overwrite.
        let event = EventDraft::new(EventKind::ImportBase, baseline, "imported baseline")
            .into_event()
            .expect("finite baseline was validated at the boundary");
        person.performance.events.push(event);
        person.performance.updated_at = now_epoch_ms();
    }
    person.updated_at = now_epoch_ms();
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
