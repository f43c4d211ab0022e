//! Canonical domain model for the organization directory store.
//!
//! # Responsibility
//! - Define the persisted shapes: document, organization, groups, people,
//!   memberships and performance records.
//! - Keep constructors and pure lifecycle helpers next to the data.
//!
//! # Invariants
//! - Every entity is identified by a stable id that is never reused.
//! - Derived values (current score, contribution total) are never stored.

pub mod document;
pub mod group;
pub mod organization;
pub mod performance;
pub mod person;
