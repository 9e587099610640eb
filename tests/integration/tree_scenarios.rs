use serde_json::json;
use treedrive::error::ErrorKind;
use treedrive::tree::{Node, TreePath, MAX_DEPTH};
use treedrive::{BlobId, OwnerId};

use crate::support::create_test_api;

fn file_link(node: &Node) -> BlobId {
    match node {
        Node::File(file) => file.link,
        other => panic!("expected file, got {:?}", other),
    }
}

fn tree_json(api: &treedrive::DriveApi, scope: &treedrive::OwnerScope) -> serde_json::Value {
    serde_json::from_str(&api.fetch_tree_document(scope).unwrap()).unwrap()
}

#[test]
fn folder_file_delete_lifecycle() {
    let (api, _temp_dir) = create_test_api();
    let scope = api.authorize(&OwnerId::new("alice"), "alice").unwrap();
    assert_eq!(tree_json(&api, &scope), json!({"@type": "folder"}));

    let docs = api.create_folder(&scope, "", Some("Docs".to_string())).unwrap();
    assert_eq!(docs.key.to_string(), "f1");
    assert_eq!(
        tree_json(&api, &scope),
        json!({"@type": "folder", "entry": {"f1": {"@type": "folder", "#text": "Docs"}}})
    );

    let file = api
        .create_file(&scope, "f1", "hello".to_string(), Some("greeting".to_string()))
        .unwrap();
    assert_eq!(file.key.to_string(), "f2");
    let link = file_link(&file.value);
    assert_eq!(api.fetch_file(&scope, link).unwrap(), "hello");
    assert_eq!(
        tree_json(&api, &scope)["entry"]["f1"]["entry"]["f2"],
        json!({"@type": "file", "#text": "greeting", "@link": link.0})
    );

    let err = api.delete_entry(&scope, "f1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    api.delete_entry(&scope, "f1/f2").unwrap();
    let err = api.fetch_file(&scope, link).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    api.delete_entry(&scope, "/f1").unwrap();
    assert_eq!(tree_json(&api, &scope), json!({"@type": "folder"}));
}

#[test]
fn keys_are_never_reused() {
    let (api, _temp_dir) = create_test_api();
    let scope = api.authorize(&OwnerId::new("alice"), "alice").unwrap();

    for _ in 0..3 {
        api.create_folder(&scope, "", None).unwrap();
    }
    api.delete_entry(&scope, "f3").unwrap();
    let next = api.create_folder(&scope, "", None).unwrap();
    assert_eq!(next.key.to_string(), "f4");

    let record = api.open_session(scope.owner()).unwrap();
    assert_eq!(record.next_id, 4);
}

#[test]
fn create_under_file_is_rejected() {
    let (api, _temp_dir) = create_test_api();
    let scope = api.authorize(&OwnerId::new("alice"), "alice").unwrap();
    api.create_file(&scope, "", "x".to_string(), None).unwrap();
    let before = api.open_session(scope.owner()).unwrap();

    let err = api.create_folder(&scope, "f1", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(api.open_session(scope.owner()).unwrap(), before);
}

#[test]
fn missing_parent_and_bad_paths() {
    let (api, _temp_dir) = create_test_api();
    let scope = api.authorize(&OwnerId::new("alice"), "alice").unwrap();

    let err = api.create_folder(&scope, "f9", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = api.create_folder(&scope, "docs", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    let err = api.delete_entry(&scope, "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MethodNotAllowed);
}

#[test]
fn text_round_trips_through_store() {
    let (api, _temp_dir) = create_test_api();
    let scope = api.authorize(&OwnerId::new("alice"), "alice").unwrap();
    let label = "Quarterly \"report\" <draft> ünïcødé";

    api.create_folder(&scope, "", None).unwrap();
    api.update_text(&scope, "f1", Some(label.to_string())).unwrap();

    let tree = api.fetch_tree(&scope).unwrap();
    let folder = tree.as_folder().unwrap();
    let entry = folder.entries.values().next().unwrap();
    assert_eq!(entry.text(), label);
}

#[test]
fn owners_are_isolated() {
    let (api, _temp_dir) = create_test_api();
    let alice = api.authorize(&OwnerId::new("alice"), "alice").unwrap();
    let bob = api.authorize(&OwnerId::new("bob"), "bob").unwrap();

    let file = api.create_file(&alice, "", "secret".to_string(), None).unwrap();
    let link = file_link(&file.value);

    assert_eq!(tree_json(&api, &bob), json!({"@type": "folder"}));
    let err = api.fetch_file(&bob, link).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let created = api.create_folder(&bob, "", None).unwrap();
    assert_eq!(created.key.to_string(), "f1");
}

#[test]
fn nesting_is_capped_and_owner_stays_usable() {
    let (api, _temp_dir) = create_test_api();
    let scope = api.authorize(&OwnerId::new("alice"), "alice").unwrap();

    let mut parent = TreePath::root();
    for _ in 0..MAX_DEPTH {
        let created = api.create_folder(&scope, &parent.to_string(), None).unwrap();
        parent = parent.child(created.key);
    }

    let err = api
        .create_folder(&scope, &parent.to_string(), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let err = api
        .create_file(&scope, &parent.to_string(), "deep".to_string(), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let document = tree_json(&api, &scope);
    assert_eq!(document["entry"]["f1"]["@type"], "folder");
    let sibling = api.create_folder(&scope, "", None).unwrap();
    assert_eq!(sibling.key.id(), MAX_DEPTH as u64 + 1);
}
