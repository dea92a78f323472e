//! Shared fixtures for rewind tests and benches: a schema catalog covering
//! every relation kind and both inheritance strategies, and an in-memory
//! SQLite database with matching live, audit and revision tables.

use std::sync::Arc;

use rusqlite::params_from_iter;

use rewind_core::models::Value;
use rewind_core::schema::SchemaCatalog;
use rewind_core::traits::{AuditStore, LiveSource};
use rewind_storage::values::Bind;
use rewind_storage::{SqliteAuditStore, SqliteConnection, SqliteLiveSource};

pub const CATALOG_TOML: &str = include_str!("catalog.toml");
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Revisions written by [`AuditDb::seed_scenario`].
pub mod rev {
    /// Alice and her address are created; live team and badges exist.
    pub const CREATED: i64 = 1;
    /// Alice renamed and one year older; two posts written.
    pub const RENAMED: i64 = 2;
    /// Post 10 deleted, address city changed, profile created.
    pub const MOVED: i64 = 3;
    /// Bob created with a pet cat, no address.
    pub const SECOND_PERSON: i64 = 4;
    /// Alice deleted.
    pub const PERSON_DELETED: i64 = 5;
    /// Vehicles of every joined subtype and a dog.
    pub const FLEET: i64 = 6;
}

pub fn catalog() -> Arc<SchemaCatalog> {
    Arc::new(SchemaCatalog::from_toml(CATALOG_TOML).expect("fixture catalog is valid"))
}

/// In-memory database with the fixture schema applied.
pub struct AuditDb {
    pub conn: Arc<SqliteConnection>,
    pub catalog: Arc<SchemaCatalog>,
}

impl Default for AuditDb {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditDb {
    pub fn new() -> Self {
        let conn = Arc::new(SqliteConnection::open_in_memory().expect("open in-memory db"));
        conn.with_conn(|c| {
            c.execute_batch(SCHEMA_SQL)
                .map_err(|e| rewind_storage::to_storage_err(e.to_string()))
        })
        .expect("apply fixture schema");
        Self {
            conn,
            catalog: catalog(),
        }
    }

    pub fn audit_store(&self) -> Arc<dyn AuditStore> {
        Arc::new(SqliteAuditStore::new(Arc::clone(&self.conn)))
    }

    pub fn live_source(&self) -> Arc<dyn LiveSource> {
        Arc::new(SqliteLiveSource::new(
            Arc::clone(&self.conn),
            Arc::clone(&self.catalog),
        ))
    }

    /// Append a revision and return its id. Timestamps advance one minute
    /// per revision from 2024-01-01 00:00:00.
    pub fn revision(&self, author: &str) -> i64 {
        self.conn
            .with_conn(|c| {
                let next: i64 = c
                    .query_row("SELECT COALESCE(MAX(id), 0) + 1 FROM revisions", [], |r| r.get(0))
                    .map_err(|e| rewind_storage::to_storage_err(e.to_string()))?;
                let timestamp = format!("2024-01-01 {:02}:{:02}:00", (next / 60) % 24, next % 60);
                c.execute(
                    "INSERT INTO revisions (id, timestamp, author) VALUES (?1, ?2, ?3)",
                    rusqlite::params![next, timestamp, author],
                )
                .map_err(|e| rewind_storage::to_storage_err(e.to_string()))?;
                Ok(next)
            })
            .expect("insert revision")
    }

    /// Write one audit row into `<table>_audit`.
    pub fn audit(&self, table: &str, rev: i64, revtype: &str, columns: &[(&str, Value)]) {
        let mut all = vec![("rev", Value::Integer(rev)), ("revtype", Value::from(revtype))];
        all.extend(columns.iter().cloned());
        self.insert(&format!("{table}_audit"), &all);
    }

    /// Write one row into a live table.
    pub fn live(&self, table: &str, columns: &[(&str, Value)]) {
        self.insert(table, columns);
    }

    fn insert(&self, table: &str, columns: &[(&str, Value)]) {
        let names: Vec<&str> = columns.iter().map(|(n, _)| *n).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            names.join(", ")
        );
        self.conn
            .with_conn(|c| {
                c.execute(&sql, params_from_iter(columns.iter().map(|(_, v)| Bind(v))))
                    .map_err(|e| rewind_storage::to_storage_err(e.to_string()))
            })
            .unwrap_or_else(|e| panic!("insert into {table}: {e}"));
    }

    /// Seed the shared history; see [`rev`] for what each revision holds.
    pub fn seed_scenario(&self) {
        let r = self.revision("alice");
        self.live("team", &[("id", Value::Integer(1)), ("name", "Core".into())]);
        self.live("badge", &[("id", Value::Integer(1)), ("label", "gold".into()), ("holder_id", Value::Integer(1))]);
        self.live("badge", &[("id", Value::Integer(2)), ("label", "silver".into()), ("holder_id", Value::Integer(1))]);
        self.audit("person", r, "INS", &alice("Alice", 30));
        self.audit(
            "address",
            r,
            "INS",
            &[("id", Value::Integer(1)), ("street", "1 Main St".into()), ("city", "Springfield".into()), ("owner_id", Value::Integer(1))],
        );

        let r = self.revision("bob");
        self.audit("person", r, "UPD", &alice("Alice B.", 31));
        self.audit("post", r, "INS", &post(10, "Hello"));
        self.audit("post", r, "INS", &post(11, "World"));

        let r = self.revision("alice");
        self.audit("post", r, "DEL", &post(10, "Hello"));
        self.audit(
            "address",
            r,
            "UPD",
            &[("id", Value::Integer(1)), ("street", "1 Main St".into()), ("city", "Shelbyville".into()), ("owner_id", Value::Integer(1))],
        );
        self.audit("profile", r, "INS", &[("id", Value::Integer(5)), ("bio", "hi".into()), ("person_id", Value::Integer(1))]);

        let r = self.revision("carol");
        self.audit(
            "person",
            r,
            "INS",
            &[
                ("id", Value::Integer(2)),
                ("name", "Bob".into()),
                ("age", Value::Integer(40)),
                ("active", Value::Integer(0)),
                ("address_id", Value::Null),
                ("team_id", Value::Null),
                ("pet_id", Value::Integer(7)),
            ],
        );
        self.audit(
            "animal",
            r,
            "INS",
            &[("id", Value::Integer(7)), ("kind", "cat".into()), ("name", "Tom".into()), ("lives", Value::Integer(9))],
        );

        let r = self.revision("alice");
        self.audit("person", r, "DEL", &alice("Alice B.", 31));

        let r = self.revision("dave");
        self.audit("vehicle", r, "INS", &[("id", Value::Integer(20)), ("vtype", "vehicle".into()), ("make", "Generic".into())]);
        self.audit("vehicle", r, "INS", &[("id", Value::Integer(21)), ("vtype", "car".into()), ("make", "VW".into())]);
        self.audit("car", r, "INS", &[("id", Value::Integer(21)), ("doors", Value::Integer(4))]);
        self.audit("vehicle", r, "INS", &[("id", Value::Integer(22)), ("vtype", "sports".into()), ("make", "Porsche".into())]);
        self.audit("car", r, "INS", &[("id", Value::Integer(22)), ("doors", Value::Integer(2))]);
        self.audit("sports_car", r, "INS", &[("id", Value::Integer(22)), ("top_speed", Value::Integer(300))]);
        self.audit("vehicle", r, "INS", &[("id", Value::Integer(23)), ("vtype", "truck".into()), ("make", "MAN".into())]);
        self.audit("truck", r, "INS", &[("id", Value::Integer(23)), ("payload", Value::Real(12.5))]);
        self.audit(
            "animal",
            r,
            "INS",
            &[("id", Value::Integer(8)), ("kind", "dog".into()), ("name", "Rex".into()), ("good", Value::Integer(1))],
        );
    }
}

fn alice(name: &str, age: i64) -> Vec<(&'static str, Value)> {
    vec![
        ("id", Value::Integer(1)),
        ("name", name.into()),
        ("age", age.into()),
        ("active", Value::Integer(1)),
        ("address_id", Value::Integer(1)),
        ("team_id", Value::Integer(1)),
        ("pet_id", Value::Null),
    ]
}

fn post(id: i64, title: &str) -> Vec<(&'static str, Value)> {
    vec![
        ("id", id.into()),
        ("title", title.into()),
        ("published", "2024-01-02 10:00:00".into()),
        ("author_id", Value::Integer(1)),
    ]
}
