//! Local storage query tests

use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

use crate::db::{queries, Database, DbError};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    count: u32,
}

#[test]
fn test_set_then_get_overwrites_existing_value() {
    let db = Database::open_in_memory().expect("in-memory DB");

    queries::set_item(&db, "auth-storage", "{\"a\":1}").unwrap();
    queries::set_item(&db, "auth-storage", "{\"a\":2}").unwrap();

    let value = queries::get_item(&db, "auth-storage").unwrap();
    assert_eq!(value.as_deref(), Some("{\"a\":2}"));

    let stamped: i64 = db
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM local_storage WHERE key = 'auth-storage' AND updated_at <> ''",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stamped, 1);
}

#[test]
fn test_remove_reports_whether_row_existed() {
    let db = Database::open_in_memory().expect("in-memory DB");
    queries::set_item(&db, "entries-1", "[]").unwrap();

    assert!(queries::remove_item(&db, "entries-1").unwrap());
    assert!(!queries::remove_item(&db, "entries-1").unwrap());
    assert_eq!(queries::get_item(&db, "entries-1").unwrap(), None);
}

#[test]
fn test_list_keys_matches_prefix_literally() {
    let db = Database::open_in_memory().expect("in-memory DB");
    for key in ["entries-1", "entries-20", "entries_x", "auth-storage"] {
        queries::set_item(&db, key, "[]").unwrap();
    }

    let keys = queries::list_keys(&db, "entries-").unwrap();
    assert_eq!(keys, vec!["entries-1".to_string(), "entries-20".to_string()]);
}

#[test]
fn test_json_helpers_round_trip_and_flag_corruption() {
    let db = Database::open_in_memory().expect("in-memory DB");
    let sample = Sample {
        name: "joao".to_string(),
        count: 3,
    };
    queries::set_json(&db, "sample", &sample).unwrap();
    let loaded: Option<Sample> = queries::get_json(&db, "sample").unwrap();
    assert_eq!(loaded, Some(sample));

    queries::set_item(&db, "broken", "not json").unwrap();
    let err = queries::get_json::<Sample>(&db, "broken").unwrap_err();
    assert!(matches!(err, DbError::Corrupt { ref key, .. } if key == "broken"));
}

#[test]
fn test_file_database_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eventstaff.db");

    {
        let db = Database::open(&path).unwrap();
        queries::set_item(&db, "entries-9", "[1]").unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(queries::get_item(&db, "entries-9").unwrap().as_deref(), Some("[1]"));
}
