//! Tests for the SQLite destination store.

use polars::prelude::*;
use tempfile::tempdir;

use etl_load::{LoadError, Store};
use etl_model::TableName;

fn clients() -> DataFrame {
    DataFrame::new(vec![
        Series::new("client_id".into(), vec![1i64, 2, 3]).into(),
        Series::new("email".into(), vec![Some("a@x.com"), None, Some("c@x.com")]).into(),
        Series::new("total_spent".into(), vec![10.5f64, 0.0, 99.9]).into(),
    ])
    .unwrap()
}

fn table(name: &str) -> TableName {
    TableName::new(name).unwrap()
}

#[test]
fn test_load_creates_table_and_appends() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(&dir.path().join("warehouse.db")).unwrap();
    let clients_table = table("clients");

    let first = store.load(&clients_table, &clients(), &[]).unwrap();
    assert!(first.created);
    assert_eq!(first.loaded, 3);
    assert_eq!(first.errors, 0);

    let second = store.load(&clients_table, &clients(), &[]).unwrap();
    assert!(!second.created);
    assert_eq!(second.loaded, 3);
    assert_eq!(store.row_count(&clients_table).unwrap(), 6);
}

#[test]
fn test_column_types_follow_frame() {
    let mut store = Store::open_in_memory().unwrap();
    store.load(&table("clients"), &clients(), &[]).unwrap();

    let mut stmt = store
        .connection()
        .prepare("SELECT name, type FROM pragma_table_info('clients') ORDER BY cid")
        .unwrap();
    let columns: Vec<(String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<std::result::Result<_, _>>()
        .unwrap();
    assert_eq!(
        columns,
        vec![
            ("client_id".to_string(), "INTEGER".to_string()),
            ("email".to_string(), "TEXT".to_string()),
            ("total_spent".to_string(), "REAL".to_string()),
        ]
    );
}

#[test]
fn test_row_level_failures_are_counted() {
    let mut store = Store::open_in_memory().unwrap();
    store
        .connection()
        .execute(
            "CREATE TABLE clients (client_id INTEGER PRIMARY KEY, email TEXT NOT NULL, total_spent REAL)",
            [],
        )
        .unwrap();

    let outcome = store.load(&table("clients"), &clients(), &[]).unwrap();
    assert!(!outcome.created);
    assert_eq!(outcome.loaded, 2);
    assert_eq!(outcome.errors, 1);

    let again = store.load(&table("clients"), &clients(), &[]).unwrap();
    assert_eq!(again.loaded, 0);
    assert_eq!(again.errors, 3);
    assert_eq!(store.row_count(&table("clients")).unwrap(), 2);
}

#[test]
fn test_missing_destination_column_is_fatal() {
    let mut store = Store::open_in_memory().unwrap();
    store
        .connection()
        .execute("CREATE TABLE clients (client_id INTEGER)", [])
        .unwrap();

    let err = store.load(&table("clients"), &clients(), &[]).unwrap_err();
    assert!(matches!(err, LoadError::Batch { .. }));
    assert_eq!(store.row_count(&table("clients")).unwrap(), 0);
}

#[test]
fn test_empty_frame_creates_empty_table() {
    let mut store = Store::open_in_memory().unwrap();
    let df = DataFrame::new(vec![
        Series::new("email".into(), Vec::<Option<&str>>::new()).into(),
        Series::new("age".into(), Vec::<Option<&str>>::new()).into(),
    ])
    .unwrap();

    let outcome = store.load(&table("clients"), &df, &[]).unwrap();
    assert!(outcome.created);
    assert_eq!(outcome.loaded, 0);
    assert!(store.table_exists(&table("clients")).unwrap());
    assert_eq!(store.row_count(&table("clients")).unwrap(), 0);
}

#[test]
fn test_indexes_are_created() {
    let mut store = Store::open_in_memory().unwrap();
    store
        .load(
            &table("clients"),
            &clients(),
            &["email".to_string(), "phone".to_string()],
        )
        .unwrap();

    let mut stmt = store
        .connection()
        .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'clients' ORDER BY name")
        .unwrap();
    let names: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<std::result::Result<_, _>>()
        .unwrap();
    assert_eq!(names, vec!["idx_clients_client_id", "idx_clients_email"]);
}

#[test]
fn test_open_unreachable_path() {
    let dir = tempdir().unwrap();
    let err = Store::open(&dir.path().join("missing").join("warehouse.db")).err().unwrap();
    assert!(err.is_storage());
}
