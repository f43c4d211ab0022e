use orgstore_core::{EventKind, OrgStore, UpsertCandidate};
use serde_json::json;
use std::collections::BTreeMap;

fn open_store(dir: &tempfile::TempDir) -> OrgStore {
    OrgStore::open(dir.path().join("org_store.json")).unwrap()
}

fn candidate(name: &str, phone: &str, email: &str) -> UpsertCandidate {
    UpsertCandidate {
        name: name.to_string(),
        phone: phone.to_string(),
        email: email.to_string(),
        source: "test".to_string(),
        ..UpsertCandidate::default()
    }
}

#[test]
fn matching_normalized_phone_merges_instead_of_creating() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let first = store
        .upsert_person(candidate("Alice", "138-0013-8000", ""))
        .unwrap();
    assert!(first.created);

    let second = store
        .upsert_person(candidate("Alice Chen", "(138) 0013 8000", ""))
        .unwrap();
    assert!(!second.created);
    assert_eq!(second.person_id, first.person_id);
    assert_eq!(store.people().len(), 1);
    // Last import wins for the non-empty name.
    assert_eq!(store.person(first.person_id).unwrap().name, "Alice Chen");
}

#[test]
fn email_is_used_when_no_phone_is_present() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let first = store
        .upsert_person(candidate("Bob", "", "Bob@Example.com"))
        .unwrap();
    let second = store
        .upsert_person(candidate("Bobby", "", " bob@example.COM "))
        .unwrap();

    assert!(!second.created);
    assert_eq!(second.person_id, first.person_id);
    assert_eq!(store.people().len(), 1);
}

#[test]
fn candidates_without_contacts_never_merge() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let first = store.upsert_person(candidate("Ghost", "", "")).unwrap();
    let second = store.upsert_person(candidate("Ghost", "", "")).unwrap();

    assert!(first.created);
    assert!(second.created);
    assert_ne!(first.person_id, second.person_id);
    assert_eq!(store.people().len(), 2);
}

#[test]
fn merge_overwrites_non_empty_and_never_erases() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let mut one = candidate("Alice", "13800138000", "");
    one.profile = BTreeMap::from([
        ("city".to_string(), json!("Paris")),
        ("title".to_string(), json!("engineer")),
    ]);
    let id = store.upsert_person(one).unwrap().person_id;

    let mut two = candidate("", "13800138000", "");
    two.profile = BTreeMap::from([
        ("city".to_string(), json!("")),
        ("title".to_string(), json!("manager")),
        ("team".to_string(), json!(serde_json::Value::Null)),
    ]);
    store.upsert_person(two).unwrap();

    let person = store.person(id).unwrap();
    // Empty name and empty/null profile values never erase existing data.
    assert_eq!(person.name, "Alice");
    assert_eq!(person.profile["city"], json!("Paris"));
    assert!(!person.profile.contains_key("team"));
    // Conflicting non-empty values resolve last-import-wins.
    assert_eq!(person.profile["title"], json!("manager"));
}

#[test]
fn three_rows_with_two_shared_phones_produce_two_people() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    store
        .upsert_person(candidate("Row1", "138 0013 8000", ""))
        .unwrap();
    store
        .upsert_person(candidate("Row2", "13800138000", ""))
        .unwrap();
    store
        .upsert_person(candidate("Row3", "13900139000", ""))
        .unwrap();

    assert_eq!(store.people().len(), 2);
}

#[test]
fn identity_lookup_uses_current_candidate_data_only() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let id = store
        .upsert_person(candidate("Alice", "13800138000", "alice@example.com"))
        .unwrap()
        .person_id;

    // Phone-first precedence: a lookup carrying the phone resolves by phone.
    let by_phone = store.find_person_by_identity("(138)0013-8000", "");
    assert_eq!(by_phone.map(|p| p.id), Some(id));

    // The stored key is phone-based, so an email-only lookup misses; key
    // drift between imports is a documented limitation, not auto-repaired.
    assert!(store
        .find_person_by_identity("", "alice@example.com")
        .is_none());
    assert!(store.find_person_by_identity("", "").is_none());
}

#[test]
fn baseline_on_new_person_becomes_base_score_without_events() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let mut row = candidate("Alice", "13800138000", "");
    row.baseline = Some(85.0);
    let id = store.upsert_person(row).unwrap().person_id;

    let person = store.person(id).unwrap();
    assert_eq!(person.performance.base_score, 85.0);
    assert!(person.performance.events.is_empty());
    assert_eq!(store.current_score(id), Some(85.0));
}

#[test]
fn baseline_on_existing_person_appends_an_audit_event() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let mut row = candidate("Alice", "13800138000", "");
    row.baseline = Some(85.0);
    let id = store.upsert_person(row).unwrap().person_id;

    let mut again = candidate("Alice", "13800138000", "");
    again.baseline = Some(7.0);
    store.upsert_person(again).unwrap();

    let person = store.person(id).unwrap();
    assert_eq!(person.performance.base_score, 85.0);
    assert_eq!(person.performance.events.len(), 1);
    assert_eq!(person.performance.events[0].kind, EventKind::ImportBase);
    assert_eq!(store.current_score(id), Some(92.0));
}

#[test]
fn upsert_records_import_provenance() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let mut row = candidate("Alice", "13800138000", "");
    row.source = "csv_import".to_string();
    let id = store.upsert_person(row).unwrap().person_id;

    let mut again = candidate("Alice", "13800138000", "");
    again.source = "resume_import".to_string();
    store.upsert_person(again).unwrap();

    let kinds: Vec<&str> = store
        .person(id)
        .unwrap()
        .sources
        .iter()
        .map(|s| s.kind.as_str())
        .collect();
    assert_eq!(kinds, vec!["csv_import", "resume_import"]);
}
