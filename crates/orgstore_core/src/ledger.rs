//! Pure performance-ledger computations.
//!
//! # Responsibility
//! - Derive current score, contribution aggregates and group-scoped views
//!   from a person's `PerformanceRecord`.
//! - Validate and build ledger events before the facade appends them.
//!
//! # Invariants
//! - Every derivation is recomputed from the ledger on each call; nothing in
//!   this module caches or memoizes a score.
//! - Group-scoped totals cover only events tagged with that exact group;
//!   global events (`group_id = None`) belong to the unscoped view.
//! - Validation runs at the boundary; the ledger never holds an event with a
//!   non-finite delta, empty title or malformed date.

use crate::model::group::GroupId;
use crate::model::performance::{EventId, EventKind, PerformanceEvent, PerformanceRecord};
use crate::time::{is_iso_date, today_iso};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Validation failure for a candidate ledger event or patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    /// Delta is NaN or infinite.
    NonFiniteDelta,
    /// Title is empty or whitespace-only.
    EmptyTitle,
    /// Effective date is not an ISO `YYYY-MM-DD` string.
    InvalidDate(String),
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteDelta => write!(f, "event delta must be a finite number"),
            Self::EmptyTitle => write!(f, "event title must not be empty"),
            Self::InvalidDate(value) => {
                write!(f, "event date `{value}` is not an ISO YYYY-MM-DD date")
            }
        }
    }
}

impl Error for EventValidationError {}

/// Candidate event supplied by callers before validation and id assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    /// Caller-supplied id; generated when absent.
    pub id: Option<EventId>,
    pub kind: EventKind,
    pub delta: f64,
    pub title: String,
    pub note: String,
    pub group_id: Option<GroupId>,
    /// Effective date; defaults to today when absent.
    pub at: Option<String>,
}

impl EventDraft {
    /// Creates a draft with the required fields and everything else empty.
    pub fn new(kind: EventKind, delta: f64, title: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            delta,
            title: title.into(),
            note: String::new(),
            group_id: None,
            at: None,
        }
    }

    /// Attributes the draft to a group context.
    pub fn in_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Sets the free-text note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Sets the effective date (ISO `YYYY-MM-DD`).
    pub fn on_date(mut self, at: impl Into<String>) -> Self {
        self.at = Some(at.into());
        self
    }

    /// Validates the draft and turns it into a ledger event.
    ///
    /// Assigns a fresh event id when none was supplied and defaults the
    /// effective date to today.
    pub fn into_event(self) -> Result<PerformanceEvent, EventValidationError> {
        if !self.delta.is_finite() {
            return Err(EventValidationError::NonFiniteDelta);
        }
        if self.title.trim().is_empty() {
            return Err(EventValidationError::EmptyTitle);
        }
        let at = match self.at {
            Some(value) => {
                if !is_iso_date(&value) {
                    return Err(EventValidationError::InvalidDate(value));
                }
                value
            }
            None => today_iso(),
        };
        Ok(PerformanceEvent {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            kind: self.kind,
            delta: self.delta,
            title: self.title,
            note: self.note,
            group_id: self.group_id,
            at,
        })
    }
}

/// Partial update for one ledger event; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub kind: Option<EventKind>,
    pub delta: Option<f64>,
    pub title: Option<String>,
    pub note: Option<String>,
    /// `Some(None)` clears group attribution, `Some(Some(id))` retargets it.
    pub group_id: Option<Option<GroupId>>,
    pub at: Option<String>,
}

impl EventPatch {
    /// Validates patch fields against the same rules as event creation.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if let Some(delta) = self.delta {
            if !delta.is_finite() {
                return Err(EventValidationError::NonFiniteDelta);
            }
        }
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(EventValidationError::EmptyTitle);
            }
        }
        if let Some(at) = &self.at {
            if !is_iso_date(at) {
                return Err(EventValidationError::InvalidDate(at.clone()));
            }
        }
        Ok(())
    }

    /// Applies the patch to an event in place.
    ///
    /// Callers must run [`EventPatch::validate`] first; this method assumes
    /// the fields already passed boundary validation.
    pub fn apply(&self, event: &mut PerformanceEvent) {
        if let Some(kind) = self.kind {
            event.kind = kind;
        }
        if let Some(delta) = self.delta {
            event.delta = delta;
        }
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(note) = &self.note {
            event.note = note.clone();
        }
        if let Some(group_id) = self.group_id {
            event.group_id = group_id;
        }
        if let Some(at) = &self.at {
            event.at = at.clone();
        }
    }
}

/// Conjunctive event filter for audit views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    /// Keep only events attributed to exactly this group.
    pub group_id: Option<GroupId>,
    /// Keep only events of this kind.
    pub kind: Option<EventKind>,
    /// Inclusive lower bound on the effective date (ISO `YYYY-MM-DD`).
    pub date_from: Option<String>,
    /// Inclusive upper bound on the effective date (ISO `YYYY-MM-DD`).
    pub date_to: Option<String>,
}

impl EventFilter {
    /// Returns whether `event` satisfies every supplied predicate.
    pub fn matches(&self, event: &PerformanceEvent) -> bool {
        if let Some(group_id) = self.group_id {
            if event.group_id != Some(group_id) {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if event.kind != kind {
                return false;
            }
        }
        if let Some(from) = &self.date_from {
            if event.at.as_str() < from.as_str() {
                return false;
            }
        }
        if let Some(to) = &self.date_to {
            if event.at.as_str() > to.as_str() {
                return false;
            }
        }
        true
    }
}

/// Derived performance summary; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub base_score: f64,
    pub current_score: f64,
    pub contribution_total: f64,
    pub contribution_count: usize,
    pub event_count: usize,
    /// Last ledger mutation, epoch milliseconds.
    pub last_updated: i64,
}

/// Current score: base plus the sum of all event deltas.
pub fn current_score(record: &PerformanceRecord) -> f64 {
    record.base_score + record.events.iter().map(|event| event.delta).sum::<f64>()
}

/// Sum of deltas across contribution events only.
pub fn contribution_total(record: &PerformanceRecord) -> f64 {
    record
        .events
        .iter()
        .filter(|event| event.kind == EventKind::Contribution)
        .map(|event| event.delta)
        .sum()
}

/// Number of contribution events in the ledger.
pub fn contribution_count(record: &PerformanceRecord) -> usize {
    record
        .events
        .iter()
        .filter(|event| event.kind == EventKind::Contribution)
        .count()
}

/// Lazily iterates ledger events matching `filter`, in insertion order.
///
/// The returned iterator borrows the record, so callers can restart the
/// traversal by calling this function again.
pub fn filter_events<'a, 'b>(
    record: &'a PerformanceRecord,
    filter: &'b EventFilter,
) -> impl Iterator<Item = &'a PerformanceEvent> + 'b
where
    'a: 'b,
{
    record
        .events
        .iter()
        .filter(move |event| filter.matches(event))
}

/// Derives the summary, optionally scoped to a single group.
///
/// The scoped view is `base_score` plus the deltas of events tagged with
/// exactly that group; global events stay out of scoped totals.
pub fn summary(record: &PerformanceRecord, group_scope: Option<GroupId>) -> Summary {
    let filter = EventFilter {
        group_id: group_scope,
        ..EventFilter::default()
    };
    let mut total_delta = 0.0;
    let mut contribution_total = 0.0;
    let mut contribution_count = 0;
    let mut event_count = 0;
    for event in filter_events(record, &filter) {
        total_delta += event.delta;
        event_count += 1;
        if event.kind == EventKind::Contribution {
            contribution_total += event.delta;
            contribution_count += 1;
        }
    }
    Summary {
        base_score: record.base_score,
        current_score: record.base_score + total_delta,
        contribution_total,
        contribution_count,
        event_count,
        last_updated: record.updated_at,
    }
}
