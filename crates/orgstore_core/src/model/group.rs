//! Group entity.
//!
//! Groups are independent of the people that join them; the facade owns the
//! deletion policy for memberships referencing a removed group.

use crate::time::now_epoch_ms;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a group.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type GroupId = Uuid;

/// A named subdivision of the organization that people can join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Stable group id, generated at creation.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Free-form labels for filtering/reporting.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation timestamp, epoch milliseconds.
    pub created_at: i64,
    /// Last-update timestamp, epoch milliseconds.
    pub updated_at: i64,
}

impl Group {
    /// Creates a group with a generated stable id.
    pub fn new(name: impl Into<String>, description: impl Into<String>, tags: Vec<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            tags,
            created_at: now,
            updated_at: now,
        }
    }

    /// Renames the group and bumps `updated_at`.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = now_epoch_ms();
    }
}
