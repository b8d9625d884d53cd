use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::DateTime;
use groove_catalog::{Artist, Catalog, CatalogError, Label, Session, SessionSweeper};
use groove_db::DbError;
use groove_store::MemoryStore;
use serde_json::{Value, json};

const ENTITY_DBS: [&str; 5] = ["artists", "albums", "tracks", "labels", "users"];

/// Store with the production database layout: one database per entity
/// kind with an `all` view for counting, plus the sessions database
/// keyed by expiry in epoch milliseconds.
fn setup() -> (Catalog<MemoryStore>, MemoryStore) {
    let store = MemoryStore::new();
    for db in ENTITY_DBS {
        store.create_database(db);
        store.register_view(db, db, "all", |_id, _fields| {
            vec![(Value::Null, Value::Null)]
        });
    }
    store.create_database("sessions");
    store.register_view("sessions", "sessions", "by_expiry", |_id, fields| {
        let Some(expires) = fields
            .get("expires_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        else {
            return vec![];
        };
        vec![(json!(expires.timestamp_millis()), Value::Null)]
    });
    (Catalog::new(store.clone()), store)
}

fn artist(name: &str) -> Artist {
    Artist {
        name: name.to_string(),
        ..Default::default()
    }
}

fn session(id: &str, expires_at: &str) -> Session {
    Session {
        id: Some(id.to_string()),
        rev: None,
        user_id: "u1".to_string(),
        created_at: "2026-01-01T00:00:00Z".parse().unwrap(),
        expires_at: expires_at.parse().unwrap(),
    }
}

// ── Entities ────────────────────────────────────────────────────

#[test]
fn counts_follow_the_view_size() {
    let (catalog, _) = setup();
    assert_eq!(catalog.artist_count().unwrap(), 0);

    catalog.save_artist(&artist("Plaid")).unwrap();
    catalog.save_artist(&artist("Squarepusher")).unwrap();
    catalog
        .save_label(&Label {
            name: "Warp".to_string(),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(catalog.artist_count().unwrap(), 2);
    assert_eq!(catalog.label_count().unwrap(), 1);
    assert_eq!(catalog.album_count().unwrap(), 0);
}

#[test]
fn entities_roundtrip_through_save_and_get() {
    let (catalog, _) = setup();

    let written = catalog.save_artist(&artist("Apex Twin")).unwrap();
    let mut stored = catalog.artist(&written.id).unwrap().unwrap();
    assert_eq!(stored.name, "Apex Twin");
    assert_eq!(stored.id.as_deref(), Some(written.id.as_str()));
    assert_eq!(stored.rev.as_deref(), Some(written.rev.as_str()));

    stored.name = "Aphex Twin".to_string();
    let written = catalog.save_artist(&stored).unwrap();
    assert!(written.rev.starts_with("2-"));

    let stored = catalog.artist(&written.id).unwrap().unwrap();
    assert_eq!(stored.name, "Aphex Twin");
}

#[test]
fn a_chosen_id_is_kept() {
    let (catalog, _) = setup();

    let mut own = artist("Clark");
    own.id = Some("artist-clark".to_string());
    let written = catalog.save_artist(&own).unwrap();
    assert_eq!(written.id, "artist-clark");
    assert!(catalog.artist("artist-clark").unwrap().is_some());
}

#[test]
fn saving_over_a_stale_revision_conflicts() {
    let (catalog, _) = setup();

    let written = catalog.save_artist(&artist("Luke Vibert")).unwrap();
    let stored = catalog.artist(&written.id).unwrap().unwrap();
    catalog.save_artist(&stored).unwrap();

    // second writer still holds the first revision
    let err = catalog.save_artist(&stored).unwrap_err();
    assert_eq!(err.status_code(), http::StatusCode::CONFLICT);
    let CatalogError::Db { entity, source } = err;
    assert_eq!(entity, "artists");
    assert!(matches!(source, DbError::Conflict(_)));
}

#[test]
fn errors_name_the_entity_database() {
    let (catalog, _) = setup();
    catalog
        .save_session(&session("s1", "2030-01-01T00:00:00Z"))
        .unwrap();

    let err = catalog.delete_session("s1", "1-bogus").unwrap_err();
    let CatalogError::Db { entity, source } = err;
    assert_eq!(entity, "sessions");
    assert!(matches!(source, DbError::Conflict(_)));
}

#[test]
fn a_missing_entity_is_none() {
    let (catalog, _) = setup();
    assert!(catalog.artist("nope").unwrap().is_none());
}

// ── Sessions ────────────────────────────────────────────────────

#[test]
fn purge_deletes_only_expired_sessions() {
    let (catalog, _) = setup();
    catalog
        .save_session(&session("stale", "2026-02-01T00:00:00Z"))
        .unwrap();
    catalog
        .save_session(&session("live", "2030-01-01T00:00:00Z"))
        .unwrap();

    let now = "2026-06-01T00:00:00Z".parse().unwrap();
    assert_eq!(catalog.purge_expired_sessions(now).unwrap(), 1);
    assert!(catalog.session("stale").unwrap().is_none());
    assert!(catalog.session("live").unwrap().is_some());

    assert_eq!(catalog.purge_expired_sessions(now).unwrap(), 0);
}

#[test]
fn sessions_expiring_at_the_cutoff_survive() {
    let (catalog, _) = setup();
    catalog
        .save_session(&session("edge", "2026-06-01T00:00:00Z"))
        .unwrap();

    let now = "2026-06-01T00:00:00Z".parse().unwrap();
    assert_eq!(catalog.purge_expired_sessions(now).unwrap(), 0);
    assert!(catalog.session("edge").unwrap().is_some());
}

#[test]
fn the_sweeper_purges_in_the_background() {
    let (catalog, _) = setup();
    let catalog = Arc::new(catalog);
    catalog
        .save_session(&session("stale", "2020-01-01T00:00:00Z"))
        .unwrap();

    let mut sweeper = SessionSweeper::spawn(Arc::clone(&catalog), Duration::from_millis(10));
    let deadline = Instant::now() + Duration::from_secs(5);
    while catalog.session("stale").unwrap().is_some() {
        assert!(
            Instant::now() < deadline,
            "sweeper never purged the session"
        );
        thread::sleep(Duration::from_millis(5));
    }
    sweeper.stop();
}
