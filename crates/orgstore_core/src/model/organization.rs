//! Organization root record.

use crate::time::now_epoch_ms;
use serde::{Deserialize, Serialize};

/// Default id for the singleton organization record.
pub const DEFAULT_ORG_ID: &str = "org_default";

/// Singleton root of the store: one organization per document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Stable organization id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Creation timestamp, epoch milliseconds.
    pub created_at: i64,
    /// Last-update timestamp, epoch milliseconds.
    pub updated_at: i64,
}

impl Organization {
    /// Creates the organization record with the default id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: DEFAULT_ORG_ID.to_string(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Renames the organization and bumps `updated_at`.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = now_epoch_ms();
    }
}
