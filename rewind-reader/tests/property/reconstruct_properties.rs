//! Point-in-time lookups agree with a replay of the writes.

use std::sync::Arc;

use proptest::prelude::*;

use rewind_core::config::RewindConfig;
use rewind_core::models::Value;
use rewind_reader::AuditReader;
use test_fixtures::AuditDb;

/// One slot per revision: `Some(age)` writes the person, `None` writes
/// nothing for it.
fn writes() -> impl Strategy<Value = Vec<Option<i64>>> {
    prop::collection::vec(prop::option::weighted(0.6, 0i64..120), 1..12)
}

fn seeded(writes: &[Option<i64>]) -> (AuditDb, AuditReader) {
    let db = AuditDb::new();
    let mut first = true;
    for age in writes {
        let r = db.revision("prop");
        if let Some(age) = age {
            db.audit(
                "person",
                r,
                if first { "INS" } else { "UPD" },
                &[
                    ("id", Value::Integer(1)),
                    ("name", Value::from("P")),
                    ("age", Value::Integer(*age)),
                ],
            );
            first = false;
        }
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

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn find_matches_latest_write(writes in writes()) {
        let (_db, reader) = seeded(&writes);

        let mut latest: Option<i64> = None;
        for (i, age) in writes.iter().enumerate() {
            let revision = i as i64 + 1;
            if age.is_some() {
                latest = *age;
            }
            match (latest, reader.find("Person", 1, revision)) {
                (Some(expected), Ok(snap)) => {
                    prop_assert_eq!(snap.field("age"), Some(&Value::Integer(expected)));
                }
                (None, Err(e)) => prop_assert!(e.is_not_found()),
                (expected, got) => {
                    prop_assert!(false, "expected {:?}, got {:?}", expected, got.map(|s| s.revision()));
                }
            }
        }
    }

    #[test]
    fn history_and_revisions_agree(writes in writes()) {
        let (_db, reader) = seeded(&writes);

        let written: Vec<i64> = writes
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_some())
            .map(|(i, _)| i as i64 + 1)
            .rev()
            .collect();

        let history: Vec<i64> = reader
            .get_entity_history("Person", 1)
            .unwrap()
            .iter()
            .map(|s| s.revision())
            .collect();
        let revisions: Vec<i64> = reader
            .find_revisions("Person", 1)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();

        prop_assert_eq!(&history, &written);
        prop_assert_eq!(&revisions, &written);
        prop_assert_eq!(reader.get_current_revision("Person", 1).unwrap(), written.first().copied());
    }
}
