//! Reconstruction benchmarks over the fixture history plus a long run of
//! updates to one entity.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use rewind_core::config::{LoadPolicy, RewindConfig};
use rewind_core::models::Value;
use rewind_reader::AuditReader;
use test_fixtures::{rev, AuditDb};

const UPDATES: i64 = 500;

fn setup() -> (AuditDb, AuditReader) {
    let db = AuditDb::new();
    db.seed_scenario();
    for i in 0..UPDATES {
        let r = db.revision("bench");
        db.audit(
            "person",
            r,
            if i == 0 { "INS" } else { "UPD" },
            &[
                ("id", Value::Integer(100)),
                ("name", Value::from(format!("bench-{i}"))),
                ("age", Value::Integer(i % 90)),
                ("address_id", Value::Integer(1)),
            ],
        );
    }
    let reader = AuditReader::new(
        Arc::clone(&db.catalog),
        db.audit_store(),
        db.live_source(),
        RewindConfig::default(),
    )
    .unwrap();
    (db, reader)
}

fn bench_find(c: &mut Criterion) {
    let (_db, reader) = setup();
    let latest = rev::FLEET + UPDATES;

    c.bench_function("find_with_cycle", |b| {
        b.iter(|| reader.find("Person", 1, rev::MOVED).unwrap())
    });

    c.bench_function("find_long_history_latest", |b| {
        b.iter(|| reader.find("Person", 100, latest).unwrap())
    });

    let scalars = reader.clone().with_load_policy(LoadPolicy::none());
    c.bench_function("find_scalars_only", |b| {
        b.iter(|| scalars.find("Person", 100, latest).unwrap())
    });

    c.bench_function("find_joined_subtype", |b| {
        b.iter(|| reader.find("SportsCar", 22, rev::FLEET).unwrap())
    });
}

fn bench_history(c: &mut Criterion) {
    let (_db, reader) = setup();
    let scalars = reader.with_load_policy(LoadPolicy::none());

    c.bench_function("entity_history_500", |b| {
        b.iter(|| scalars.get_entity_history("Person", 100).unwrap())
    });

    c.bench_function("diff_far_revisions", |b| {
        b.iter(|| {
            scalars
                .diff("Person", 100, rev::FLEET + 1, rev::FLEET + UPDATES)
                .unwrap()
        })
    });

    c.bench_function("changes_at_revision", |b| {
        b.iter(|| scalars.find_entities_changed_at_revision(rev::FLEET).unwrap())
    });
}

criterion_group!(benches, bench_find, bench_history);
criterion_main!(benches);
