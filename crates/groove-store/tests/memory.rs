#![cfg(feature = "memory")]

use groove_store::{MemoryStore, StoreRequest, Transport};
use serde_json::{Value, json};

const DB: &str = "events";

fn execute(store: &MemoryStore, request: StoreRequest) -> (u16, Value) {
    let response = store.execute(request).unwrap();
    let status = response.status;
    let body = response.read_body().unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn put_doc(store: &MemoryStore, id: &str, doc: Value) -> String {
    let (status, body) = execute(
        store,
        StoreRequest::put(format!("{DB}/{id}"), doc.to_string().into_bytes()),
    );
    assert_eq!(status, 201, "put failed: {body}");
    body["rev"].as_str().unwrap().to_string()
}

/// Store with a by_user view over `[user, [y, m, d, h, min, s, ms]]` keys.
fn view_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.create_database(DB);
    store.register_view(DB, "events", "by_user", |_id, fields| {
        let user = fields["user"].clone();
        let stamp = fields["stamp"].clone();
        vec![(json!([user, stamp]), Value::Null)]
    });
    store
}

fn seed_events(store: &MemoryStore) {
    for (id, day) in [("e1", 1), ("e2", 2), ("e3", 3)] {
        put_doc(
            store,
            id,
            json!({ "user": "u1", "stamp": [2013, 5, day, 10, 0, 0, 0] }),
        );
    }
    put_doc(
        store,
        "other",
        json!({ "user": "u2", "stamp": [2013, 5, 2, 0, 0, 0, 0] }),
    );
}

fn view_request() -> StoreRequest {
    StoreRequest::get(format!("{DB}/_design/events/_view/by_user"))
}

fn row_ids(body: &Value) -> Vec<&str> {
    body["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap())
        .collect()
}

// ── Document CRUD ───────────────────────────────────────────────

#[test]
fn post_assigns_an_id_and_first_revision() {
    let store = MemoryStore::new();
    store.create_database(DB);

    let (status, body) = execute(
        &store,
        StoreRequest::post(DB, json!({ "user": "u1" }).to_string().into_bytes()),
    );
    assert_eq!(status, 201);
    assert_eq!(body["ok"], json!(true));
    let id = body["id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert!(body["rev"].as_str().unwrap().starts_with("1-"));

    let (status, doc) = execute(&store, StoreRequest::get(format!("{DB}/{id}")));
    assert_eq!(status, 200);
    assert_eq!(doc["user"], json!("u1"));
    assert_eq!(doc["_id"].as_str().unwrap(), id);
}

#[test]
fn get_missing_document_is_404() {
    let store = MemoryStore::new();
    store.create_database(DB);

    let (status, body) = execute(&store, StoreRequest::get(format!("{DB}/nope")));
    assert_eq!(status, 404);
    assert_eq!(body["error"], json!("not_found"));
}

#[test]
fn get_against_missing_database_is_404() {
    let store = MemoryStore::new();
    let (status, body) = execute(&store, StoreRequest::get("nowhere/doc"));
    assert_eq!(status, 404);
    assert_eq!(body["reason"], json!("no_db_file"));
}

#[test]
fn put_update_requires_the_current_revision() {
    let store = MemoryStore::new();
    store.create_database(DB);
    let rev = put_doc(&store, "d1", json!({ "n": 1 }));

    // stale or absent rev conflicts
    let (status, _) = execute(
        &store,
        StoreRequest::put(format!("{DB}/d1"), json!({ "n": 2 }).to_string().into_bytes()),
    );
    assert_eq!(status, 409);
    let (status, _) = execute(
        &store,
        StoreRequest::put(
            format!("{DB}/d1"),
            json!({ "n": 2, "_rev": "1-bogus" }).to_string().into_bytes(),
        ),
    );
    assert_eq!(status, 409);

    let (status, body) = execute(
        &store,
        StoreRequest::put(
            format!("{DB}/d1"),
            json!({ "n": 2, "_rev": rev }).to_string().into_bytes(),
        ),
    );
    assert_eq!(status, 201);
    assert!(body["rev"].as_str().unwrap().starts_with("2-"));

    let (_, doc) = execute(&store, StoreRequest::get(format!("{DB}/d1")));
    assert_eq!(doc["n"], json!(2));
}

#[test]
fn put_with_rev_against_missing_document_conflicts() {
    let store = MemoryStore::new();
    store.create_database(DB);
    let (status, _) = execute(
        &store,
        StoreRequest::put(
            format!("{DB}/ghost"),
            json!({ "_rev": "1-abc" }).to_string().into_bytes(),
        ),
    );
    assert_eq!(status, 409);
}

#[test]
fn delete_checks_revision_and_removes_the_document() {
    let store = MemoryStore::new();
    store.create_database(DB);
    let rev = put_doc(&store, "d1", json!({ "n": 1 }));

    let (status, _) = execute(
        &store,
        StoreRequest::delete(format!("{DB}/d1")).with_param("rev", "1-bogus"),
    );
    assert_eq!(status, 409);

    let (status, body) = execute(
        &store,
        StoreRequest::delete(format!("{DB}/d1")).with_param("rev", rev),
    );
    assert_eq!(status, 200);
    assert_eq!(body["ok"], json!(true));

    let (status, _) = execute(&store, StoreRequest::get(format!("{DB}/d1")));
    assert_eq!(status, 404);
}

#[test]
fn delete_without_rev_is_rejected() {
    let store = MemoryStore::new();
    store.create_database(DB);
    put_doc(&store, "d1", json!({}));

    let (status, body) = execute(&store, StoreRequest::delete(format!("{DB}/d1")));
    assert_eq!(status, 400);
    assert_eq!(body["error"], json!("bad_request"));
}

// ── View queries ────────────────────────────────────────────────

#[test]
fn view_rows_come_back_in_collation_order() {
    let store = view_store();
    seed_events(&store);

    let (status, body) = execute(&store, view_request());
    assert_eq!(status, 200);
    assert_eq!(body["total_rows"], json!(4));
    // "u1" < "u2", then stamps ascending within the user
    assert_eq!(row_ids(&body), vec!["e1", "e2", "e3", "other"]);
}

#[test]
fn startkey_and_endkey_bound_the_slice() {
    let store = view_store();
    seed_events(&store);

    let (_, body) = execute(
        &store,
        view_request()
            .with_param("startkey", json!(["u1", [2013, 5, 2, 0, 0, 0, 0]]).to_string())
            .with_param("endkey", json!(["u1", {}]).to_string()),
    );
    assert_eq!(row_ids(&body), vec!["e2", "e3"]);
    // total_rows still counts the whole view, not the slice
    assert_eq!(body["total_rows"], json!(4));
    assert_eq!(body["offset"], json!(1));
}

#[test]
fn descending_reverses_traversal_and_bounds() {
    let store = view_store();
    seed_events(&store);

    let (_, body) = execute(
        &store,
        view_request()
            .with_param("startkey", json!(["u1", {}]).to_string())
            .with_param("endkey", json!(["u1"]).to_string())
            .with_param("descending", "true"),
    );
    assert_eq!(row_ids(&body), vec!["e3", "e2", "e1"]);
}

#[test]
fn inclusive_end_false_drops_the_boundary_row() {
    let store = view_store();
    seed_events(&store);

    let (_, body) = execute(
        &store,
        view_request()
            .with_param("endkey", json!(["u1", [2013, 5, 2, 10, 0, 0, 0]]).to_string())
            .with_param("inclusive_end", "false"),
    );
    assert_eq!(row_ids(&body), vec!["e1"]);

    let (_, body) = execute(
        &store,
        view_request()
            .with_param("endkey", json!(["u1", [2013, 5, 2, 10, 0, 0, 0]]).to_string()),
    );
    assert_eq!(row_ids(&body), vec!["e1", "e2"]);
}

#[test]
fn limit_zero_returns_only_the_count() {
    let store = view_store();
    seed_events(&store);

    let (_, body) = execute(&store, view_request().with_param("limit", "0"));
    assert_eq!(body["total_rows"], json!(4));
    assert_eq!(body["rows"].as_array().unwrap().len(), 0);
}

#[test]
fn key_filters_to_exact_matches() {
    let store = view_store();
    seed_events(&store);

    let (_, body) = execute(
        &store,
        view_request().with_param("key", json!(["u1", [2013, 5, 2, 10, 0, 0, 0]]).to_string()),
    );
    assert_eq!(row_ids(&body), vec!["e2"]);
}

#[test]
fn include_docs_attaches_the_full_document() {
    let store = view_store();
    seed_events(&store);

    let (_, body) = execute(
        &store,
        view_request()
            .with_param("limit", "1")
            .with_param("include_docs", "true"),
    );
    let row = &body["rows"][0];
    assert_eq!(row["doc"]["user"], json!("u1"));
    assert_eq!(row["doc"]["_id"], json!("e1"));
    assert!(row["doc"]["_rev"].as_str().unwrap().starts_with("1-"));
}

#[test]
fn malformed_parameters_are_a_400() {
    let store = view_store();

    let (status, body) = execute(&store, view_request().with_param("startkey", "not-json"));
    assert_eq!(status, 400);
    assert_eq!(body["error"], json!("query_parse_error"));

    let (status, _) = execute(&store, view_request().with_param("descending", "yes"));
    assert_eq!(status, 400);
}

#[test]
fn unknown_view_is_404() {
    let store = view_store();
    let (status, body) = execute(
        &store,
        StoreRequest::get(format!("{DB}/_design/events/_view/nope")),
    );
    assert_eq!(status, 404);
    assert_eq!(body["reason"], json!("missing_named_view"));
}

#[test]
fn clones_share_the_same_data() {
    let store = view_store();
    let handle = store.clone();
    put_doc(&store, "d1", json!({ "user": "u1", "stamp": [2013, 1, 1, 0, 0, 0, 0] }));

    let (status, _) = execute(&handle, StoreRequest::get(format!("{DB}/d1")));
    assert_eq!(status, 200);
}
