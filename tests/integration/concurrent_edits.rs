use std::collections::BTreeSet;
use std::thread;

use treedrive::OwnerId;

use crate::support::create_test_api;

#[test]
fn concurrent_creates_get_distinct_keys() {
    let (api, _temp_dir) = create_test_api();
    let owner = OwnerId::new("alice");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let api = api.clone();
            let owner = owner.clone();
            thread::spawn(move || {
                let scope = api.authorize(&owner, "alice").unwrap();
                (0..5)
                    .map(|_| api.create_folder(&scope, "", None).unwrap().key.id())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut keys = BTreeSet::new();
    for handle in handles {
        for key in handle.join().unwrap() {
            assert!(keys.insert(key), "key f{} allocated twice", key);
        }
    }
    assert_eq!(keys.len(), 20);

    let scope = api.authorize(&owner, "alice").unwrap();
    let tree = api.fetch_tree(&scope).unwrap();
    assert_eq!(tree.as_folder().unwrap().entries.len(), 20);
    assert_eq!(api.open_session(&owner).unwrap().next_id, 20);
}

#[test]
fn concurrent_file_creates_keep_every_blob() {
    let (api, _temp_dir) = create_test_api();
    let owner = OwnerId::new("alice");

    let handles: Vec<_> = (0..3)
        .map(|worker| {
            let api = api.clone();
            let owner = owner.clone();
            thread::spawn(move || {
                let scope = api.authorize(&owner, "alice").unwrap();
                let content = format!("worker-{}", worker);
                let created = api.create_file(&scope, "", content.clone(), None).unwrap();
                (created, content)
            })
        })
        .collect();

    let scope = api.authorize(&owner, "alice").unwrap();
    for handle in handles {
        let (created, content) = handle.join().unwrap();
        let link = match created.value {
            treedrive::tree::Node::File(file) => file.link,
            other => panic!("expected file, got {:?}", other),
        };
        assert_eq!(api.fetch_file(&scope, link).unwrap(), content);
    }
}
