//! Dedup identity resolution for person records.
//!
//! # Responsibility
//! - Normalize contact fields into comparable forms.
//! - Compute the phone-first, email-fallback dedup key.
//!
//! # Invariants
//! - The key is always derived from the candidate's current contact data;
//!   historical key drift between imports is never reconciled here.
//! - A candidate with neither phone nor email has no key and can never merge.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The only dedup strategy currently supported.
pub const DEDUP_STRATEGY_PHONE_THEN_EMAIL: &str = "phone_then_email";

static NON_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").expect("valid digit regex"));

/// Resolved dedup key, tagged by the contact channel it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupKey {
    /// Derived from a normalized phone number.
    Phone(String),
    /// Derived from a normalized email address.
    Email(String),
}

impl DedupKey {
    /// Encodes the key in its persisted `phone:<digits>` / `email:<addr>` form.
    pub fn encode(&self) -> String {
        match self {
            Self::Phone(digits) => format!("phone:{digits}"),
            Self::Email(addr) => format!("email:{addr}"),
        }
    }
}

/// Persisted record of how a person's dedup key was computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupDescriptor {
    /// Strategy label, currently always `phone_then_email`.
    pub strategy: String,
    /// Encoded key value; empty when the person cannot be deduplicated.
    pub key: String,
}

impl DedupDescriptor {
    /// Computes the descriptor for the given raw contact fields.
    pub fn compute(phone: &str, email: &str) -> Self {
        Self {
            strategy: DEDUP_STRATEGY_PHONE_THEN_EMAIL.to_string(),
            key: resolve(phone, email).map(|k| k.encode()).unwrap_or_default(),
        }
    }

    /// Returns whether this descriptor carries a usable key.
    pub fn is_resolvable(&self) -> bool {
        !self.key.is_empty()
    }
}

/// Normalizes a phone number by stripping every non-digit character.
pub fn normalize_phone(raw: &str) -> String {
    NON_DIGIT_RE.replace_all(raw.trim(), "").into_owned()
}

/// Normalizes an email address by trimming and lower-casing it.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Resolves the dedup key for raw contact fields.
///
/// Precedence is fixed: phone when it normalizes to a non-empty digit
/// string, otherwise email, otherwise `None`.
pub fn resolve(phone: &str, email: &str) -> Option<DedupKey> {
    let digits = normalize_phone(phone);
    if !digits.is_empty() {
        return Some(DedupKey::Phone(digits));
    }
    let addr = normalize_email(email);
    if !addr.is_empty() {
        return Some(DedupKey::Email(addr));
    }
    None
}
