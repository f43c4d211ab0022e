use orgstore_core::store::{load_document, save_document};
use orgstore_core::{Document, OrgStore, StoreError, UpsertCandidate, SCHEMA_VERSION};

#[test]
fn open_without_file_starts_fresh_at_current_version() {
    let dir = tempfile::tempdir().unwrap();
    let store = OrgStore::open(dir.path().join("org_store.json")).unwrap();

    assert_eq!(store.document().schema_version, SCHEMA_VERSION);
    assert!(store.document().groups.is_empty());
    assert!(store.document().people.is_empty());
}

#[test]
fn save_then_reload_roundtrips_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("org_store.json");

    let mut store = OrgStore::open(&path).unwrap();
    let group = store.create_group("backend", "server folks", vec!["eng".to_string()]);
    store
        .upsert_person(UpsertCandidate {
            name: "Alice".to_string(),
            phone: "138-0013-8000".to_string(),
            source: "manual".to_string(),
            group: Some(group),
            ..UpsertCandidate::default()
        })
        .unwrap();
    store.save().unwrap();

    let reloaded = OrgStore::open(&path).unwrap();
    assert_eq!(reloaded.document(), store.document());
    assert_eq!(reloaded.people().len(), 1);
    assert_eq!(reloaded.people()[0].phone, "13800138000");
}

#[test]
fn malformed_json_is_a_fatal_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("org_store.json");
    std::fs::write(&path, "{not json at all").unwrap();

    let err = OrgStore::open(&path).unwrap_err();
    assert!(matches!(err, StoreError::Malformed(_)), "got {err}");
}

#[test]
fn wrong_document_shape_is_malformed_not_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("org_store.json");
    // Valid JSON, but `org` is not an object.
    std::fs::write(
        &path,
        r#"{"_schema_version": 3, "org": 5, "groups": [], "people": []}"#,
    )
    .unwrap();

    let err = load_document(&path).unwrap_err();
    assert!(matches!(err, StoreError::Malformed(_)), "got {err}");
    // The file content is left as-is for the operator to inspect.
    assert!(std::fs::read_to_string(&path).unwrap().contains("\"org\": 5"));
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("org_store.json");
    std::fs::write(
        &path,
        r#"{"_schema_version": 99, "org": {}, "groups": [], "people": []}"#,
    )
    .unwrap();

    let err = load_document(&path).unwrap_err();
    match err {
        StoreError::UnsupportedSchemaVersion {
            found,
            latest_supported,
        } => {
            assert_eq!(found, 99);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn save_atomically_replaces_previous_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("org_store.json");

    let first = Document::empty();
    save_document(&path, &first).unwrap();

    let mut second = Document::empty();
    second.org.rename("updated org");
    save_document(&path, &second).unwrap();

    let loaded = load_document(&path).unwrap();
    assert_eq!(loaded.org.name, "updated org");
    // No temp files are left behind next to the target.
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path() != path)
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
}
