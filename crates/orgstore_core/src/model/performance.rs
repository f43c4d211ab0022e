//! Performance record and ledger event shapes.
//!
//! # Responsibility
//! - Define the append-only event ledger attached to every person.
//! - Keep the record free of derived values; scores are computed in
//!   `crate::ledger` on every read.
//!
//! # Invariants
//! - Ledger order is insertion order; `at` is a data field, not a sequencing
//!   guarantee.
//! - `base_score` defaults to zero and is only changed through explicit
//!   baseline operations on the facade.

use crate::model::group::GroupId;
use crate::time::now_epoch_ms;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a ledger event, unique within one person's ledger.
pub type EventId = Uuid;

/// Category of a performance-affecting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Externally supplied starting score recorded as an audit entry.
    ImportBase,
    /// Organically recorded contribution.
    Contribution,
    /// Manual correction by an operator.
    ManualAdjust,
}

/// One immutable entry in a person's performance ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEvent {
    /// Unique event id within the owning ledger.
    pub id: EventId,
    /// Serialized as `type` to match the persisted schema naming.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Signed score delta; may be negative or zero, never non-finite.
    pub delta: f64,
    /// Short human-readable title.
    pub title: String,
    /// Optional free-text note.
    #[serde(default)]
    pub note: String,
    /// Group this event is attributed to; `None` means organization-global.
    #[serde(default)]
    pub group_id: Option<GroupId>,
    /// Effective calendar date, ISO `YYYY-MM-DD`.
    pub at: String,
}

/// Per-person performance state: base score plus the event ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Starting score the ledger deltas apply on top of.
    pub base_score: f64,
    /// Append-only event ledger in insertion order.
    pub events: Vec<PerformanceEvent>,
    /// Last-mutation timestamp, epoch milliseconds.
    pub updated_at: i64,
}

impl PerformanceRecord {
    /// Creates an empty record with `base_score = 0` and no events.
    pub fn empty() -> Self {
        Self {
            base_score: 0.0,
            events: Vec::new(),
            updated_at: now_epoch_ms(),
        }
    }

    /// Creates a record seeded with a baseline, for brand-new people whose
    /// imported value needs no audit event to explain it.
    pub fn with_base(base_score: f64) -> Self {
        Self {
            base_score,
            events: Vec::new(),
            updated_at: now_epoch_ms(),
        }
    }

    /// Finds one event by id.
    pub fn event(&self, id: EventId) -> Option<&PerformanceEvent> {
        self.events.iter().find(|event| event.id == id)
    }

    /// Finds one event by id for mutation.
    pub fn event_mut(&mut self, id: EventId) -> Option<&mut PerformanceEvent> {
        self.events.iter_mut().find(|event| event.id == id)
    }
}

impl Default for PerformanceRecord {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{EventKind, PerformanceRecord};

    #[test]
    fn empty_record_has_zero_base_and_no_events() {
        let record = PerformanceRecord::empty();
        assert_eq!(record.base_score, 0.0);
        assert!(record.events.is_empty());
        assert!(record.updated_at > 0);
    }

    #[test]
    fn event_kind_serializes_to_schema_names() {
        let json = serde_json::to_string(&EventKind::ImportBase).unwrap();
        assert_eq!(json, "\"import_base\"");
        let json = serde_json::to_string(&EventKind::ManualAdjust).unwrap();
        assert_eq!(json, "\"manual_adjust\"");
        let parsed: EventKind = serde_json::from_str("\"contribution\"").unwrap();
        assert_eq!(parsed, EventKind::Contribution);
    }
}
