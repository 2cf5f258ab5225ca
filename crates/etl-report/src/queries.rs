//! The reporting catalogue.
//!
//! Queries target the `clients` and `sales` tables written by the pipeline.
//! User-supplied values are bound as parameters; table names are validated
//! before they are interpolated.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, Params, params};
use tracing::{debug, info_span};

use etl_model::TableName;

use crate::error::{ReportError, Result};
use crate::table::{Cell, ResultTable};

pub const CLIENTS_TABLE: &str = "clients";
pub const SALES_TABLE: &str = "sales";

/// Row limit for the "top" queries when none is given.
pub const DEFAULT_LIMIT: usize = 10;

/// A titled block of the full report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub title: String,
    pub table: ResultTable,
}

impl ReportSection {
    fn new(title: impl Into<String>, table: ResultTable) -> Self {
        Self {
            title: title.into(),
            table,
        }
    }
}

/// Read-only connection to a destination database.
pub struct Reporter {
    conn: Connection,
}

impl Reporter {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::DatabaseNotFound {
                path: path.to_path_buf(),
            });
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| ReportError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened database read-only");
        Ok(Self { conn })
    }

    fn query<P: Params>(&self, sql: &str, params: P) -> Result<ResultTable> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = columns.len();
        let mut cursor = stmt.query(params)?;
        let mut rows = Vec::new();
        while let Some(row) = cursor.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(Cell::from(row.get_ref(idx)?));
            }
            rows.push(cells);
        }
        Ok(ResultTable { columns, rows })
    }

    fn existing_table(&self, table: &str) -> Result<TableName> {
        let name = TableName::new(table)?;
        if !self.table_names()?.iter().any(|t| t == name.as_str()) {
            return Err(ReportError::UnknownTable {
                table: name.to_string(),
            });
        }
        Ok(name)
    }

    /// Names of the user tables, sorted.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    pub fn has_table(&self, table: &str) -> Result<bool> {
        Ok(self.table_names()?.iter().any(|t| t == table))
    }

    /// Every user table with its row count.
    pub fn list_tables(&self) -> Result<ResultTable> {
        let mut rows = Vec::new();
        for name in self.table_names()? {
            let count = self.row_count(&name)?;
            rows.push(vec![
                Cell::Text(name),
                Cell::Integer(i64::try_from(count).unwrap_or(i64::MAX)),
            ]);
        }
        Ok(ResultTable {
            columns: vec!["table".to_string(), "rows".to_string()],
            rows,
        })
    }

    pub fn row_count(&self, table: &str) -> Result<usize> {
        let name = self.existing_table(table)?;
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", name.as_str());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Column layout of a table as reported by SQLite.
    pub fn table_info(&self, table: &str) -> Result<ResultTable> {
        let name = self.existing_table(table)?;
        self.query(
            "SELECT cid, name, type, \"notnull\", dflt_value, pk \
             FROM pragma_table_info(?1) ORDER BY cid",
            params![name.as_str()],
        )
    }

    // === Clients ===

    pub fn top_clients(&self, limit: usize) -> Result<ResultTable> {
        self.query(
            "SELECT client_id, first_name, last_name, email, city, total_spent, status \
             FROM clients ORDER BY total_spent DESC, client_id LIMIT ?1",
            params![sql_limit(limit)],
        )
    }

    pub fn clients_by_city(&self) -> Result<ResultTable> {
        self.query(
            "SELECT city, COUNT(*) AS clients, AVG(total_spent) AS avg_spent \
             FROM clients GROUP BY city ORDER BY clients DESC, city",
            [],
        )
    }

    pub fn clients_by_status(&self) -> Result<ResultTable> {
        self.query(
            "SELECT status, COUNT(*) AS clients, SUM(total_spent) AS revenue, \
             AVG(total_spent) AS avg_spent \
             FROM clients GROUP BY status ORDER BY revenue DESC, status",
            [],
        )
    }

    pub fn age_statistics(&self) -> Result<ResultTable> {
        self.query(
            "SELECT MIN(age) AS min_age, MAX(age) AS max_age, AVG(age) AS avg_age, \
             COUNT(*) AS clients FROM clients",
            [],
        )
    }

    // === Sales ===

    pub fn sales_summary(&self) -> Result<ResultTable> {
        self.query(
            "SELECT COUNT(*) AS sales, SUM(amount) AS revenue, AVG(amount) AS avg_sale, \
             SUM(quantity) AS total_quantity FROM sales",
            [],
        )
    }

    pub fn top_products(&self, limit: usize) -> Result<ResultTable> {
        self.query(
            "SELECT product, category, COUNT(*) AS sales, SUM(quantity) AS total_quantity, \
             SUM(amount) AS revenue, AVG(unit_price) AS avg_price \
             FROM sales GROUP BY product, category \
             ORDER BY revenue DESC, product, category LIMIT ?1",
            params![sql_limit(limit)],
        )
    }

    pub fn sales_by_category(&self) -> Result<ResultTable> {
        self.query(
            "SELECT category, COUNT(*) AS sales, SUM(amount) AS revenue, AVG(amount) AS avg_sale \
             FROM sales GROUP BY category ORDER BY revenue DESC, category",
            [],
        )
    }

    /// Sales per calendar month, most recent twelve months first.
    pub fn monthly_sales(&self) -> Result<ResultTable> {
        self.query(
            "SELECT strftime('%Y-%m', sale_date) AS month, COUNT(*) AS sales, \
             SUM(amount) AS revenue \
             FROM sales GROUP BY month ORDER BY month DESC LIMIT 12",
            [],
        )
    }

    // === Joins ===

    pub fn client_purchase_history(&self, client_id: i64) -> Result<ResultTable> {
        self.query(
            "SELECT s.sale_id, s.product, s.category, s.quantity, s.amount, s.sale_date, \
             c.first_name, c.last_name, c.email \
             FROM sales s JOIN clients c ON s.client_id = c.client_id \
             WHERE c.client_id = ?1 ORDER BY s.sale_date DESC, s.sale_id",
            params![client_id],
        )
    }

    pub fn customers_without_purchases(&self) -> Result<ResultTable> {
        self.query(
            "SELECT c.client_id, c.first_name, c.last_name, c.email, c.status \
             FROM clients c LEFT JOIN sales s ON c.client_id = s.client_id \
             WHERE s.sale_id IS NULL ORDER BY c.client_id",
            [],
        )
    }

    /// Runs every section whose source tables exist.
    pub fn full_report(&self, limit: usize) -> Result<Vec<ReportSection>> {
        let span = info_span!("report", limit);
        let _guard = span.enter();

        let tables = self.table_names()?;
        let has = |name: &str| tables.iter().any(|t| t == name);
        let mut sections = vec![ReportSection::new("Tables", self.list_tables()?)];

        if has(CLIENTS_TABLE) {
            sections.push(ReportSection::new("Client ages", self.age_statistics()?));
            sections.push(ReportSection::new(
                format!("Top {limit} clients"),
                self.top_clients(limit)?,
            ));
            sections.push(ReportSection::new("Clients by status", self.clients_by_status()?));
            sections.push(ReportSection::new("Clients by city", self.clients_by_city()?));
        }
        if has(SALES_TABLE) {
            sections.push(ReportSection::new("Sales summary", self.sales_summary()?));
            sections.push(ReportSection::new(
                format!("Top {limit} products"),
                self.top_products(limit)?,
            ));
            sections.push(ReportSection::new("Sales by category", self.sales_by_category()?));
            sections.push(ReportSection::new("Monthly sales", self.monthly_sales()?));
        }
        if has(CLIENTS_TABLE) && has(SALES_TABLE) {
            sections.push(ReportSection::new(
                "Clients without purchases",
                self.customers_without_purchases()?,
            ));
        }
        debug!(sections = sections.len(), "report complete");
        Ok(sections)
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
