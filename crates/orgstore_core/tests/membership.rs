use orgstore_core::{OrgStore, StoreError, UpsertCandidate};
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

fn store_with_person_and_group(dir: &tempfile::TempDir) -> (OrgStore, Uuid, Uuid) {
    let mut store = OrgStore::open(dir.path().join("org_store.json")).unwrap();
    let group = store.create_group("backend", "", Vec::new());
    let person = store
        .upsert_person(UpsertCandidate {
            name: "Alice".to_string(),
            phone: "13800138000".to_string(),
            source: "test".to_string(),
            ..UpsertCandidate::default()
        })
        .unwrap()
        .person_id;
    (store, person, group)
}

#[test]
fn adding_the_same_pair_twice_keeps_exactly_one_membership() {
    let dir = tempfile::tempdir().unwrap();
    let (mut store, person, group) = store_with_person_and_group(&dir);

    store
        .add_or_update_membership(
            person,
            group,
            BTreeMap::from([("role".to_string(), json!("lead"))]),
        )
        .unwrap();
    store
        .add_or_update_membership(
            person,
            group,
            BTreeMap::from([("task".to_string(), json!("docs"))]),
        )
        .unwrap();

    let memberships = &store.person(person).unwrap().memberships;
    assert_eq!(memberships.len(), 1);
    // Attributes from both calls are shallow-merged onto the same pair.
    assert_eq!(memberships[0].attributes["role"], json!("lead"));
    assert_eq!(memberships[0].attributes["task"], json!("docs"));
}

#[test]
fn removal_is_an_idempotent_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let (mut store, person, group) = store_with_person_and_group(&dir);

    store
        .add_or_update_membership(person, group, BTreeMap::new())
        .unwrap();

    assert!(store.remove_membership(person, group));
    assert!(!store.remove_membership(person, group));
    assert!(!store.remove_membership(Uuid::new_v4(), group));
    assert!(store.person(person).unwrap().memberships.is_empty());
}

#[test]
fn unknown_references_are_rejected_before_any_state_change() {
    let dir = tempfile::tempdir().unwrap();
    let (mut store, person, group) = store_with_person_and_group(&dir);

    let missing_group = Uuid::new_v4();
    let err = store
        .add_or_update_membership(person, missing_group, BTreeMap::new())
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownGroup(id) if id == missing_group));

    let missing_person = Uuid::new_v4();
    let err = store
        .add_or_update_membership(missing_person, group, BTreeMap::new())
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownPerson(id) if id == missing_person));

    assert!(store.person(person).unwrap().memberships.is_empty());
}

#[test]
fn group_deletion_cascades_and_leaves_no_dangling_references() {
    let dir = tempfile::tempdir().unwrap();
    let (mut store, person, group) = store_with_person_and_group(&dir);

    store
        .add_or_update_membership(person, group, BTreeMap::new())
        .unwrap();
    assert_eq!(store.list_members(group).len(), 1);

    assert!(store.delete_group(group));
    assert!(!store.delete_group(group));

    assert!(store.group(group).is_none());
    assert!(store.person(person).unwrap().memberships.is_empty());
    assert!(store.list_members(group).is_empty());
}

#[test]
fn member_listing_and_group_listing_stay_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let (mut store, person, group) = store_with_person_and_group(&dir);
    let other_group = store.create_group("frontend", "", Vec::new());

    store
        .add_or_update_membership(person, group, BTreeMap::new())
        .unwrap();
    store
        .add_or_update_membership(person, other_group, BTreeMap::new())
        .unwrap();

    let members = store.list_members(group);
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].0.id, person);

    let groups: Vec<Uuid> = store
        .groups_of(person)
        .iter()
        .map(|(group, _)| group.id)
        .collect();
    assert_eq!(groups.len(), 2);
    assert!(groups.contains(&group));
    assert!(groups.contains(&other_group));
}

#[test]
fn upsert_can_join_a_group_in_the_same_operation() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = OrgStore::open(dir.path().join("org_store.json")).unwrap();
    let group = store.create_group("backend", "", Vec::new());

    let outcome = store
        .upsert_person(UpsertCandidate {
            name: "Alice".to_string(),
            phone: "13800138000".to_string(),
            source: "csv_import".to_string(),
            group: Some(group),
            membership_attributes: BTreeMap::from([("role".to_string(), json!("lead"))]),
            ..UpsertCandidate::default()
        })
        .unwrap();

    let members = store.list_members(group);
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].0.id, outcome.person_id);
    assert_eq!(members[0].1.attributes["role"], json!("lead"));

    // Upserting into an unknown group must not create the person either.
    let missing = Uuid::new_v4();
    let err = store
        .upsert_person(UpsertCandidate {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            group: Some(missing),
            ..UpsertCandidate::default()
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownGroup(id) if id == missing));
    assert_eq!(store.people().len(), 1);
}
