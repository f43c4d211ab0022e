//! Core identity & performance store for the organization directory.
//! This crate is the single source of truth for dedup, membership and
//! ledger invariants; every other component consumes its read/write surface.

pub mod identity;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod paths;
pub mod service;
pub mod store;
pub mod time;

pub use identity::{DedupDescriptor, DedupKey};
pub use ledger::{EventDraft, EventFilter, EventPatch, EventValidationError, Summary};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{Document, SCHEMA_VERSION};
pub use model::group::{Group, GroupId};
pub use model::organization::Organization;
pub use model::performance::{EventId, EventKind, PerformanceEvent, PerformanceRecord};
pub use model::person::{ImportSource, Membership, Person, PersonId};
pub use service::org_store::{BaselinePolicy, OrgStore, UpsertCandidate, UpsertOutcome};
pub use store::{StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
