//! SQLite audit store and live source against the fixture schema.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use rewind_core::errors::{RewindError, StorageError};
use rewind_core::models::{ColumnFilter, EntityKey, KeyValue, Query, Value};
use rewind_core::traits::{AuditStore, LiveSource};
use rewind_storage::{SqliteAuditStore, SqliteConnection, SqliteLiveSource};
use test_fixtures::{rev, AuditDb};

fn seeded() -> AuditDb {
    let db = AuditDb::new();
    db.seed_scenario();
    db
}

#[test]
fn fetch_all_binds_positionally_and_keeps_store_order() {
    let db = seeded();
    let store = SqliteAuditStore::new(Arc::clone(&db.conn));

    let rows = store
        .fetch_all(&Query::new(
            "SELECT rev, revtype, name FROM person_audit WHERE id = ? AND rev <= ? ORDER BY rev",
            vec![Value::Integer(1), Value::Integer(rev::RENAMED)],
        ))
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("rev"), Some(&Value::Integer(rev::CREATED)));
    assert_eq!(rows[0].get("revtype"), Some(&Value::from("INS")));
    assert_eq!(rows[1].get("name"), Some(&Value::from("Alice B.")));
}

#[test]
fn fetch_one_returns_first_row_or_none() {
    let db = seeded();
    let store = SqliteAuditStore::new(Arc::clone(&db.conn));

    let latest = store
        .fetch_one(&Query::new(
            "SELECT rev FROM person_audit WHERE id = ? ORDER BY rev DESC",
            vec![Value::Integer(1)],
        ))
        .unwrap()
        .unwrap();
    assert_eq!(latest.get("rev"), Some(&Value::Integer(rev::PERSON_DELETED)));

    let missing = store
        .fetch_one(&Query::new(
            "SELECT rev FROM person_audit WHERE id = ?",
            vec![Value::Integer(99)],
        ))
        .unwrap();
    assert!(missing.is_none());
}

#[test]
fn nulls_reals_and_text_come_back_as_stored() {
    let db = seeded();
    let store = SqliteAuditStore::new(Arc::clone(&db.conn));

    let bob = store
        .fetch_one(&Query::new(
            "SELECT address_id, name FROM person_audit WHERE id = ?",
            vec![Value::Integer(2)],
        ))
        .unwrap()
        .unwrap();
    assert_eq!(bob.get("address_id"), Some(&Value::Null));
    assert_eq!(bob.get("name"), Some(&Value::from("Bob")));

    let truck = store
        .fetch_one(&Query::new("SELECT payload FROM truck_audit", Vec::new()))
        .unwrap()
        .unwrap();
    assert_eq!(truck.get("payload"), Some(&Value::Real(12.5)));
}

#[test]
fn typed_values_are_lowered_when_bound() {
    let db = AuditDb::new();
    let r = db.revision("typed");
    let published = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    db.audit(
        "post",
        r,
        "INS",
        &[
            ("id", Value::Integer(1)),
            ("title", Value::from("t")),
            ("published", Value::DateTime(published)),
        ],
    );
    db.audit(
        "person",
        r,
        "INS",
        &[("id", Value::Integer(1)), ("active", Value::Boolean(true))],
    );

    let store = SqliteAuditStore::new(Arc::clone(&db.conn));
    let post = store
        .fetch_one(&Query::new("SELECT published FROM post_audit", Vec::new()))
        .unwrap()
        .unwrap();
    assert_eq!(post.get("published"), Some(&Value::from("2024-03-01 09:30:00")));

    let person = store
        .fetch_one(&Query::new(
            "SELECT id FROM person_audit WHERE active = ?",
            vec![Value::Boolean(true)],
        ))
        .unwrap();
    assert!(person.is_some());
}

#[test]
fn invalid_sql_surfaces_as_storage_error() {
    let db = AuditDb::new();
    let store = SqliteAuditStore::new(Arc::clone(&db.conn));

    let err = store
        .fetch_all(&Query::new("SELECT * FROM no_such_audit", Vec::new()))
        .unwrap_err();
    assert!(matches!(
        err,
        RewindError::Storage(StorageError::SqliteError { .. })
    ));
}

#[test]
fn live_load_by_key() {
    let db = seeded();
    let live = SqliteLiveSource::new(Arc::clone(&db.conn), Arc::clone(&db.catalog));
    let team = db.catalog.descriptor_for("Team").unwrap();

    let found = live
        .load(team, &EntityKey::new("Team", vec![KeyValue::Integer(1)]))
        .unwrap()
        .unwrap();
    assert_eq!(found.key, EntityKey::new("Team", vec![KeyValue::Integer(1)]));
    assert_eq!(found.field("name"), Some(&Value::from("Core")));

    let missing = live
        .load(team, &EntityKey::new("Team", vec![KeyValue::Integer(9)]))
        .unwrap();
    assert!(missing.is_none());
}

#[test]
fn live_collection_is_ordered_by_identifier() {
    let db = seeded();
    db.live(
        "badge",
        &[
            ("id", Value::Integer(3)),
            ("label", Value::from("bronze")),
            ("holder_id", Value::Integer(2)),
        ],
    );
    let live = SqliteLiveSource::new(Arc::clone(&db.conn), Arc::clone(&db.catalog));
    let badge = db.catalog.descriptor_for("Badge").unwrap();
    let filter = [ColumnFilter::new("holder_id", Value::Integer(1))];

    let badges = live.load_to_many_collection(badge, &filter).unwrap();
    let labels: Vec<&Value> = badges.iter().filter_map(|b| b.field("label")).collect();
    assert_eq!(labels, vec![&Value::from("gold"), &Value::from("silver")]);

    let first = live.load_to_one_entity(badge, &filter).unwrap().unwrap();
    assert_eq!(first.key.values, vec![KeyValue::Integer(1)]);

    let none = live
        .load_to_many_collection(badge, &[ColumnFilter::new("holder_id", Value::Integer(7))])
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn live_joined_subtype_reads_ancestor_columns() {
    let db = AuditDb::new();
    db.live(
        "vehicle",
        &[
            ("id", Value::Integer(21)),
            ("vtype", Value::from("car")),
            ("make", Value::from("VW")),
        ],
    );
    db.live("car", &[("id", Value::Integer(21)), ("doors", Value::Integer(4))]);
    let live = SqliteLiveSource::new(Arc::clone(&db.conn), Arc::clone(&db.catalog));
    let car = db.catalog.descriptor_for("Car").unwrap();

    let found = live
        .load(car, &EntityKey::new("Car", vec![KeyValue::Integer(21)]))
        .unwrap()
        .unwrap();
    assert_eq!(found.field("make"), Some(&Value::from("VW")));
    assert_eq!(found.field("doors"), Some(&Value::Integer(4)));
}

#[test]
fn file_backed_connection_persists_across_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.db");

    {
        let conn = SqliteConnection::open(&path).unwrap();
        conn.with_conn(|c| {
            c.execute_batch(
                "CREATE TABLE revisions (id INTEGER PRIMARY KEY, timestamp TEXT, author TEXT);
                 INSERT INTO revisions VALUES (1, '2024-01-01 00:01:00', 'alice');",
            )
            .map_err(|e| rewind_storage::to_storage_err(e.to_string()))
        })
        .unwrap();
    }

    let store = SqliteAuditStore::new(Arc::new(SqliteConnection::open(&path).unwrap()));
    let row = store
        .fetch_one(&Query::new("SELECT author FROM revisions WHERE id = ?", vec![Value::Integer(1)]))
        .unwrap()
        .unwrap();
    assert_eq!(row.get("author"), Some(&Value::from("alice")));
}
