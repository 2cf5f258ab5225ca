//! Reporting catalogue against a small fixture database.

use std::path::Path;

use rusqlite::Connection;
use tempfile::TempDir;

use etl_report::{Cell, ReportError, Reporter};

fn fixture(with_sales: bool) -> (TempDir, Reporter) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warehouse.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE clients (client_id INTEGER, first_name TEXT, last_name TEXT, email TEXT, \
             age INTEGER, city TEXT, signup_date TEXT, total_spent REAL, status TEXT);
         INSERT INTO clients VALUES (1, 'Ana', 'Martin', 'ana@x.com', 30, 'Lyon', '2024-01-02', 120.5, 'Active');
         INSERT INTO clients VALUES (2, 'Luc', 'Petit', 'luc@x.com', 45, 'Paris', '2024-02-03', 980.0, 'Premium');
         INSERT INTO clients VALUES (3, 'Eva', 'Simon', 'eva@x.com', 22, 'Lyon', '2024-03-04', 50.0, 'Active');",
    )
    .unwrap();
    if with_sales {
        conn.execute_batch(
            "CREATE TABLE sales (sale_id INTEGER, client_id INTEGER, product TEXT, category TEXT, \
                 quantity INTEGER, unit_price REAL, amount REAL, sale_date TEXT);
             INSERT INTO sales VALUES (1, 1, 'Laptop', 'Computers', 1, 800.0, 800.0, '2024-05-10');
             INSERT INTO sales VALUES (2, 1, 'Mouse', 'Accessories', 2, 30.0, 60.0, '2024-06-01');
             INSERT INTO sales VALUES (3, 2, 'Laptop', 'Computers', 2, 750.0, 1500.0, '2024-06-15');",
        )
        .unwrap();
    }
    drop(conn);
    let reporter = Reporter::open(&path).unwrap();
    (dir, reporter)
}

#[test]
fn test_list_tables_and_counts() {
    let (_dir, reporter) = fixture(true);
    let tables = reporter.list_tables().unwrap();
    assert_eq!(tables.columns, vec!["table", "rows"]);
    assert_eq!(
        tables.rows,
        vec![
            vec![Cell::Text("clients".into()), Cell::Integer(3)],
            vec![Cell::Text("sales".into()), Cell::Integer(3)],
        ]
    );
    assert_eq!(reporter.row_count("sales").unwrap(), 3);
}

#[test]
fn test_table_names_are_validated() {
    let (_dir, reporter) = fixture(false);
    assert!(matches!(
        reporter.row_count("clients; DROP TABLE clients"),
        Err(ReportError::InvalidTable(_))
    ));
    assert!(matches!(
        reporter.row_count("sales"),
        Err(ReportError::UnknownTable { .. })
    ));
    let info = reporter.table_info("clients").unwrap();
    assert_eq!(info.len(), 9);
    assert_eq!(info.value(0, "name"), Some(&Cell::Text("client_id".into())));
}

#[test]
fn test_client_queries() {
    let (_dir, reporter) = fixture(false);

    let top = reporter.top_clients(2).unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top.value(0, "first_name"), Some(&Cell::Text("Luc".into())));

    let by_city = reporter.clients_by_city().unwrap();
    assert_eq!(by_city.value(0, "city"), Some(&Cell::Text("Lyon".into())));
    assert_eq!(by_city.value(0, "clients"), Some(&Cell::Integer(2)));

    let ages = reporter.age_statistics().unwrap();
    assert_eq!(ages.value(0, "min_age"), Some(&Cell::Integer(22)));
    assert_eq!(ages.value(0, "max_age"), Some(&Cell::Integer(45)));
}

#[test]
fn test_sales_and_join_queries() {
    let (_dir, reporter) = fixture(true);

    let summary = reporter.sales_summary().unwrap();
    assert_eq!(summary.value(0, "revenue"), Some(&Cell::Real(2360.0)));

    let products = reporter.top_products(10).unwrap();
    assert_eq!(products.value(0, "product"), Some(&Cell::Text("Laptop".into())));
    assert_eq!(products.value(0, "sales"), Some(&Cell::Integer(2)));

    let monthly = reporter.monthly_sales().unwrap();
    assert_eq!(monthly.value(0, "month"), Some(&Cell::Text("2024-06".into())));
    assert_eq!(monthly.value(0, "sales"), Some(&Cell::Integer(2)));

    let history = reporter.client_purchase_history(1).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.value(0, "product"), Some(&Cell::Text("Mouse".into())));

    let idle = reporter.customers_without_purchases().unwrap();
    assert_eq!(idle.len(), 1);
    assert_eq!(idle.value(0, "client_id"), Some(&Cell::Integer(3)));
}

#[test]
fn test_full_report_skips_missing_tables() {
    let (_dir, reporter) = fixture(false);
    let titles: Vec<String> = reporter
        .full_report(5)
        .unwrap()
        .into_iter()
        .map(|section| section.title)
        .collect();
    assert_eq!(
        titles,
        vec![
            "Tables",
            "Client ages",
            "Top 5 clients",
            "Clients by status",
            "Clients by city",
        ]
    );
}

#[test]
fn test_missing_database() {
    let err = Reporter::open(Path::new("/nonexistent/warehouse.db")).err().unwrap();
    assert!(matches!(err, ReportError::DatabaseNotFound { .. }));
}

#[test]
fn test_result_table_serializes() {
    let (_dir, reporter) = fixture(false);
    let json = serde_json::to_value(reporter.age_statistics().unwrap()).unwrap();
    assert_eq!(json["columns"][0], "min_age");
    assert_eq!(json["rows"][0][3], 3);
}
