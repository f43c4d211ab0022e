//! Facade layer owning the in-memory document.
//!
//! # Responsibility
//! - Expose the single public mutation/query surface over the store.
//! - Enforce dedup, membership and ledger invariants at one choke point.

pub mod org_store;
