//! Schema migration registry and executor.
//!
//! # Responsibility
//! - Register document migrations in strictly increasing version order.
//! - Upgrade raw JSON values to the current schema before typed decoding.
//!
//! # Invariants
//! - Each migration is a pure transformation of the JSON value; re-running
//!   one on an already-migrated document is a no-op.
//! - The executor mirrors the applied version into `_schema_version` after
//!   every step.
//! - A declared version newer than the registry is rejected, never guessed.
//!
//! # Version history
//! - v1: legacy array formats (team list with embedded members, or a flat
//!   member list) predating the organization document.
//! - v2: organization document with groups and deduplicated people.
//! - v3: every person carries a `performance` record.

use crate::identity;
use crate::model::document::SCHEMA_VERSION;
use crate::store::{StoreError, StoreResult};
use crate::time::now_epoch_ms;
use serde_json::{json, Map, Value};
use uuid::Uuid;

struct Migration {
    /// Version this migration upgrades the document to.
    version: u32,
    apply: fn(Value) -> StoreResult<Value>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 2,
        apply: migrate_v1_to_v2,
    },
    Migration {
        version: 3,
        apply: migrate_v2_to_v3,
    },
];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(SCHEMA_VERSION, |m| m.version)
}

/// Detects the declared schema version of a raw document value.
///
/// Legacy array documents predate version tagging and count as version 1.
pub fn detect_version(value: &Value) -> StoreResult<u64> {
    match value {
        Value::Array(_) => Ok(1),
        Value::Object(map) => match map.get("_schema_version") {
            Some(Value::Number(version)) => version.as_u64().ok_or_else(|| {
                StoreError::Malformed(format!("non-integer _schema_version: {version}"))
            }),
            Some(other) => Err(StoreError::Malformed(format!(
                "non-integer _schema_version: {other}"
            ))),
            None => Err(StoreError::Malformed(
                "document object is missing _schema_version".to_string(),
            )),
        },
        other => Err(StoreError::Malformed(format!(
            "document root must be an object or legacy array, got {other}"
        ))),
    }
}

/// Upgrades `value` to the current schema version, step by step.
pub fn migrate_to_current(value: Value) -> StoreResult<Value> {
    let found = detect_version(&value)?;
    let latest = latest_version();

    if found > u64::from(latest) {
        return Err(StoreError::UnsupportedSchemaVersion {
            found,
            latest_supported: latest,
        });
    }

    let mut value = value;
    for migration in MIGRATIONS {
        if u64::from(migration.version) <= found {
            continue;
        }
        value = (migration.apply)(value)?;
        if let Value::Object(map) = &mut value {
            map.insert("_schema_version".to_string(), json!(migration.version));
        }
    }
    Ok(value)
}

// v1 -> v2: rebuild legacy arrays as the organization document, minting
// stable ids and deduplicating members via the identity rules.
fn migrate_v1_to_v2(value: Value) -> StoreResult<Value> {
    let Value::Array(items) = value else {
        return Err(StoreError::Malformed(
            "version 1 documents must be arrays".to_string(),
        ));
    };

    let now = now_epoch_ms();
    let mut groups: Vec<Value> = Vec::new();
    let mut people: Vec<Value> = Vec::new();

    let looks_like_teams = items
        .first()
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("members"));

    if looks_like_teams {
        for team in items.iter().filter_map(Value::as_object) {
            let group_id = Uuid::new_v4().to_string();
            groups.push(json!({
                "id": group_id.as_str(),
                "name": team.get("name").and_then(Value::as_str).unwrap_or("group"),
                "description": "",
                "tags": [],
                "created_at": now,
                "updated_at": now,
            }));
            if let Some(members) = team.get("members").and_then(Value::as_array) {
                for member in members.iter().filter_map(Value::as_object) {
                    absorb_legacy_member(&mut people, member, &group_id, now);
                }
            }
        }
    } else if !items.is_empty() {
        // Flat member list: everyone lands in one migrated default group.
        let group_id = Uuid::new_v4().to_string();
        groups.push(json!({
            "id": group_id.as_str(),
            "name": "default group",
            "description": "migrated from legacy member list",
            "tags": [],
            "created_at": now,
            "updated_at": now,
        }));
        for member in items.iter().filter_map(Value::as_object) {
            absorb_legacy_member(&mut people, member, &group_id, now);
        }
    }

    // The executor stamps `_schema_version` after this step returns.
    Ok(json!({
        "org": {
            "id": "org_default",
            "name": "organization",
            "created_at": now,
            "updated_at": now,
        },
        "groups": groups,
        "people": people,
    }))
}

// Adds one legacy member to the people list, merging into an existing
// person when the dedup key matches.
fn absorb_legacy_member(
    people: &mut Vec<Value>,
    member: &Map<String, Value>,
    group_id: &str,
    now: i64,
) {
    let profile = member
        .get("profile")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let (phone, email) = contact_from_profile(&profile);
    let key = identity::resolve(&phone, &email)
        .map(|k| k.encode())
        .unwrap_or_default();

    let source = member
        .get("source")
        .and_then(Value::as_str)
        .unwrap_or("legacy");
    let membership = json!({
        "group_id": group_id,
        "joined_at": now,
        "updated_at": now,
        "attributes": { "source": source },
    });

    if !key.is_empty() {
        if let Some(existing) = people.iter_mut().find(|p| {
            p.get("dedup")
                .and_then(|d| d.get("key"))
                .and_then(Value::as_str)
                == Some(key.as_str())
        }) {
            let memberships = existing
                .get_mut("memberships")
                .and_then(Value::as_array_mut)
                .expect("migrated person always has memberships");
            let already_member = memberships.iter().any(|m| {
                m.get("group_id").and_then(Value::as_str) == Some(group_id)
            });
            if !already_member {
                memberships.push(membership);
            }
            return;
        }
    }

    let name = profile
        .get("name")
        .and_then(Value::as_str)
        .or_else(|| member.get("name").and_then(Value::as_str))
        .unwrap_or("unknown")
        .to_string();

    people.push(json!({
        "id": Uuid::new_v4().to_string(),
        "name": name,
        "phone": identity::normalize_phone(&phone),
        "email": identity::normalize_email(&email),
        "dedup": {
            "strategy": identity::DEDUP_STRATEGY_PHONE_THEN_EMAIL,
            "key": key,
        },
        "created_at": now,
        "updated_at": now,
        "profile": Value::Object(profile),
        "sources": [{ "kind": source, "imported_at": now }],
        "memberships": [membership],
    }));
}

// Pulls raw phone/email strings out of a legacy profile map, checking the
// common top-level aliases and then a nested `contact` object.
fn contact_from_profile(profile: &Map<String, Value>) -> (String, String) {
    let pick = |map: &Map<String, Value>, keys: &[&str]| -> String {
        keys.iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .unwrap_or("")
            .to_string()
    };

    let mut phone = pick(profile, &["phone", "tel", "mobile"]);
    let mut email = pick(profile, &["email", "e-mail"]);

    if let Some(contact) = profile.get("contact").and_then(Value::as_object) {
        if phone.is_empty() {
            phone = pick(contact, &["phone", "tel", "mobile"]);
        }
        if email.is_empty() {
            email = pick(contact, &["email", "e-mail"]);
        }
    }

    (phone, email)
}

// v2 -> v3: every person gains a well-formed `performance` record.
fn migrate_v2_to_v3(mut value: Value) -> StoreResult<Value> {
    let people = value
        .get_mut("people")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| {
            StoreError::Malformed("version 2 document is missing a people array".to_string())
        })?;

    for person in people.iter_mut() {
        let Some(person) = person.as_object_mut() else {
            return Err(StoreError::Malformed(
                "people entries must be objects".to_string(),
            ));
        };
        ensure_performance(person);
    }
    Ok(value)
}

// Fills in a missing or malformed performance record; well-formed records
// are left byte-for-byte untouched so the migration stays idempotent.
fn ensure_performance(person: &mut Map<String, Value>) {
    let well_formed = person.get("performance").and_then(Value::as_object).is_some_and(|perf| {
        perf.get("base_score").is_some_and(Value::is_number)
            && perf.get("events").is_some_and(Value::is_array)
            && perf.get("updated_at").is_some_and(Value::is_number)
    });
    if well_formed {
        return;
    }

    let mut perf = person
        .get("performance")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    if !perf.get("base_score").is_some_and(Value::is_number) {
        perf.insert("base_score".to_string(), json!(0.0));
    }
    if !perf.get("events").is_some_and(Value::is_array) {
        perf.insert("events".to_string(), json!([]));
    }
    if !perf.get("updated_at").is_some_and(Value::is_number) {
        perf.insert("updated_at".to_string(), json!(now_epoch_ms()));
    }
    person.insert("performance".to_string(), Value::Object(perf));
}
