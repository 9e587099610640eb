use serde_json::json;
use treedrive::{Method, OwnerId, Request, Resource};

use crate::support::{create_test_handler, json_body};

#[test]
fn tree_and_file_round_trip_over_requests() {
    let (handler, _temp_dir) = create_test_handler(false);
    let caller = OwnerId::new("alice");

    let created = handler.handle(
        &caller,
        &Request::new(Method::Post, Resource::Tree, "alice").with_json(&json!({"#text": "Docs"})),
    );
    assert_eq!(created.status, 200);
    let created = json_body(&created.body);
    assert_eq!(created["key"], "f1");
    assert_eq!(created["value"], json!({"@type": "folder", "#text": "Docs"}));

    let file = handler.handle(
        &caller,
        &Request::new(Method::Post, Resource::File, "alice")
            .with_query("path", "f1")
            .with_json(&json!({"content": "hello", "#text": "greeting"})),
    );
    assert_eq!(file.status, 200);
    let file = json_body(&file.body);
    assert_eq!(file["key"], "f2");
    let link = file["value"]["@link"].as_u64().unwrap();

    let fetched = handler.handle(
        &caller,
        &Request::new(Method::Get, Resource::File, "alice").with_query("id", link.to_string()),
    );
    assert_eq!(json_body(&fetched.body), json!({"content": "hello"}));

    let updated = handler.handle(
        &caller,
        &Request::new(Method::Put, Resource::File, "alice")
            .with_query("id", link.to_string())
            .with_json(&json!({"content": "bye"})),
    );
    assert_eq!(updated.status, 200);
    assert_eq!(json_body(&updated.body), json!({}));

    let renamed = handler.handle(
        &caller,
        &Request::new(Method::Put, Resource::Tree, "alice")
            .with_query("path", "f1/f2")
            .with_json(&json!({"#text": "farewell"})),
    );
    assert_eq!(renamed.status, 200);

    let tree = handler.handle(&caller, &Request::new(Method::Get, Resource::Tree, "alice"));
    let tree = json_body(&tree.body);
    assert_eq!(tree["entry"]["f1"]["entry"]["f2"]["#text"], "farewell");

    let conflict = handler.handle(
        &caller,
        &Request::new(Method::Delete, Resource::Tree, "alice").with_query("path", "f1"),
    );
    assert_eq!(conflict.status, 409);

    let deleted = handler.handle(
        &caller,
        &Request::new(Method::Delete, Resource::Tree, "alice").with_query("path", "f1/f2"),
    );
    assert_eq!(deleted.status, 200);

    let gone = handler.handle(
        &caller,
        &Request::new(Method::Get, Resource::File, "alice").with_query("id", link.to_string()),
    );
    assert_eq!(gone.status, 404);
}

#[test]
fn error_bodies_depend_on_debug_mode() {
    let (quiet, _quiet_dir) = create_test_handler(false);
    let (verbose, _verbose_dir) = create_test_handler(true);
    let caller = OwnerId::new("alice");
    let request =
        Request::new(Method::Delete, Resource::Tree, "alice").with_query("path", "f404");

    let response = quiet.handle(&caller, &request);
    assert_eq!(response.status, 404);
    assert_eq!(response.body, "Error");

    let response = verbose.handle(&caller, &request);
    assert_eq!(response.status, 404);
    assert!(response.body.starts_with("HTTP ERROR : STATUS 404 : "));
    assert_eq!(response.content_type, "text/plain");
}

#[test]
fn authorization_precedes_validation() {
    let (handler, _temp_dir) = create_test_handler(false);
    let caller = OwnerId::new("mallory");
    let mut request = Request::new(Method::Post, Resource::Tree, "alice");
    request.content_type = Some("text/plain".to_string());
    request.body = b"not json".to_vec();

    assert_eq!(handler.handle(&caller, &request).status, 403);
}

#[test]
fn malformed_body_is_bad_request() {
    let (handler, _temp_dir) = create_test_handler(false);
    let caller = OwnerId::new("alice");
    let mut request = Request::new(Method::Post, Resource::Tree, "alice");
    request.content_type = Some("application/json".to_string());
    request.body = b"{not json".to_vec();

    assert_eq!(handler.handle(&caller, &request).status, 400);
}

#[test]
fn root_update_reports_allowed_methods() {
    let (handler, _temp_dir) = create_test_handler(false);
    let caller = OwnerId::new("alice");
    let response = handler.handle(
        &caller,
        &Request::new(Method::Put, Resource::Tree, "alice").with_json(&json!({"#text": "root"})),
    );
    assert_eq!(response.status, 405);
    assert_eq!(response.headers, vec![("Allow", "GET, POST".to_string())]);
}
