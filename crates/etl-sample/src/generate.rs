use std::path::PathBuf;

use chrono::{Duration, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::{SliceRandom, index};
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, info_span};

use crate::write::{CsvRecord, SampleError, write_csv};

const FIRST_NAMES: &[&str] = &[
    "Jean", "Marie", "Pierre", "Sophie", "Luc", "Anne", "Paul", "Claire", "Marc", "Julie",
    "Thomas", "Emma", "Nicolas", "Laura", "David",
];
const LAST_NAMES: &[&str] = &[
    "Dupont", "Martin", "Bernard", "Dubois", "Thomas", "Robert", "Richard", "Petit", "Durand",
    "Leroy", "Moreau", "Simon", "Laurent", "Lefebvre",
];
const CITIES: &[&str] = &[
    "Paris",
    "Lyon",
    "Marseille",
    "Toulouse",
    "Nice",
    "Nantes",
    "Bordeaux",
    "Lille",
    "Rennes",
    "Strasbourg",
];
const STATUSES: &[&str] = &["Active", "Inactive", "Premium"];
const CATEGORIES: &[&str] = &["Computers", "Electronics", "Accessories"];
/// Product name and base unit price.
const PRODUCTS: &[(&str, f64)] = &[
    ("Laptop", 800.0),
    ("Phone", 600.0),
    ("Tablet", 400.0),
    ("Monitor", 300.0),
    ("Keyboard", 50.0),
    ("Mouse", 30.0),
    ("Headset", 80.0),
    ("Webcam", 100.0),
    ("Printer", 200.0),
    ("Hard drive", 100.0),
];

const BAD_EMAIL_RATE: f64 = 0.05;
const BAD_AGE_RATE: f64 = 0.10;
const PADDED_CITY_RATE: f64 = 0.20;
const DUPLICATE_PERCENT: usize = 5;
const NULL_PERCENT: usize = 2;
const SIGNUP_WINDOW_DAYS: i64 = 730;
const SALE_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRecord {
    pub client_id: u32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub age: u32,
    pub city: Option<String>,
    pub signup_date: String,
    pub total_spent: f64,
    pub status: String,
}

impl CsvRecord for ClientRecord {
    const HEADERS: &'static [&'static str] = &[
        "client_id",
        "first_name",
        "last_name",
        "email",
        "age",
        "city",
        "signup_date",
        "total_spent",
        "status",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRecord {
    pub sale_id: u32,
    pub client_id: u32,
    pub product: String,
    pub category: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub amount: f64,
    pub sale_date: String,
}

impl CsvRecord for SaleRecord {
    const HEADERS: &'static [&'static str] = &[
        "sale_id",
        "client_id",
        "product",
        "category",
        "quantity",
        "unit_price",
        "amount",
        "sale_date",
    ];
}

/// Settings for [`generate`].
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub clients: usize,
    pub sales: usize,
    pub seed: Option<u64>,
    pub output_dir: PathBuf,
    /// Dates are drawn backwards from this day.
    pub today: NaiveDate,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            clients: 1000,
            sales: 500,
            seed: None,
            output_dir: PathBuf::from("data"),
            today: Local::now().date_naive(),
        }
    }
}

/// Paths and row counts of the written files.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSummary {
    pub clients_path: PathBuf,
    pub clients_rows: usize,
    pub sales_path: PathBuf,
    pub sales_rows: usize,
}

fn pick<'a, R: Rng>(rng: &mut R, values: &[&'a str]) -> &'a str {
    values.choose(rng).copied().unwrap_or_default()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn days_before(today: NaiveDate, days: i64) -> String {
    (today - Duration::days(days)).format("%Y-%m-%d").to_string()
}

/// Generates `n` clients plus the injected duplicates.
///
/// 5% of emails lack the `@`, 10% of ages are drawn from 10..=120, 20% of
/// cities carry surrounding spaces. 5% of rows are then appended again as
/// exact duplicates, and 2% of the rows lose their email and, separately, 2%
/// their city.
pub fn generate_clients<R: Rng>(n: usize, rng: &mut R, today: NaiveDate) -> Vec<ClientRecord> {
    let mut clients: Vec<ClientRecord> = (0..n)
        .map(|i| {
            let first_name = pick(rng, FIRST_NAMES);
            let last_name = pick(rng, LAST_NAMES);
            let (first, last) = (first_name.to_lowercase(), last_name.to_lowercase());
            let email = if rng.gen_bool(BAD_EMAIL_RATE) {
                format!("{first}{last}email.com")
            } else {
                format!("{first}.{last}@email.com")
            };
            let age = if rng.gen_bool(BAD_AGE_RATE) {
                rng.gen_range(10..=120)
            } else {
                rng.gen_range(18..=80)
            };
            let mut city = pick(rng, CITIES).to_string();
            if rng.gen_bool(PADDED_CITY_RATE) {
                city = format!("  {city}  ");
            }
            ClientRecord {
                client_id: u32::try_from(i + 1).unwrap_or(u32::MAX),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: Some(email),
                age,
                city: Some(city),
                signup_date: days_before(today, rng.gen_range(0..=SIGNUP_WINDOW_DAYS)),
                total_spent: round2(rng.gen_range(50.0..5000.0)),
                status: pick(rng, STATUSES).to_string(),
            }
        })
        .collect();

    let duplicates = n * DUPLICATE_PERCENT / 100;
    let picked: Vec<ClientRecord> = index::sample(rng, n, duplicates)
        .into_iter()
        .map(|idx| clients[idx].clone())
        .collect();
    clients.extend(picked);

    let total = clients.len();
    let nulls = total * NULL_PERCENT / 100;
    for idx in index::sample(rng, total, nulls) {
        clients[idx].email = None;
    }
    for idx in index::sample(rng, total, nulls) {
        clients[idx].city = None;
    }
    clients
}

/// Generates `n` sales referencing client ids `1..=client_count`.
pub fn generate_sales<R: Rng>(
    n: usize,
    client_count: usize,
    rng: &mut R,
    today: NaiveDate,
) -> Vec<SaleRecord> {
    let max_client = u32::try_from(client_count.max(1)).unwrap_or(u32::MAX);
    (0..n)
        .map(|i| {
            let (product, base_price) = PRODUCTS.choose(rng).copied().unwrap_or(("Mouse", 30.0));
            let unit_price = base_price + rng.gen_range(-50.0..100.0);
            let quantity = rng.gen_range(1..=10);
            SaleRecord {
                sale_id: u32::try_from(i + 1).unwrap_or(u32::MAX),
                client_id: rng.gen_range(1..=max_client),
                product: product.to_string(),
                category: pick(rng, CATEGORIES).to_string(),
                quantity,
                unit_price: round2(unit_price),
                amount: round2(unit_price * f64::from(quantity)),
                sale_date: days_before(today, rng.gen_range(0..=SALE_WINDOW_DAYS)),
            }
        })
        .collect()
}

/// Generates both files into `config.output_dir`.
pub fn generate(config: &SampleConfig) -> Result<SampleSummary, SampleError> {
    let span = info_span!("generate", clients = config.clients, sales = config.sales);
    let _guard = span.enter();

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let clients = generate_clients(config.clients, &mut rng, config.today);
    let clients_path = config.output_dir.join("clients.csv");
    let clients_rows = write_csv(&clients, &clients_path)?;
    info!(path = %clients_path.display(), rows = clients_rows, "wrote clients");

    let sales = generate_sales(config.sales, config.clients, &mut rng, config.today);
    let sales_path = config.output_dir.join("sales.csv");
    let sales_rows = write_csv(&sales, &sales_path)?;
    info!(path = %sales_path.display(), rows = sales_rows, "wrote sales");

    Ok(SampleSummary {
        clients_path,
        clients_rows,
        sales_path,
        sales_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()
    }

    #[test]
    fn test_client_defects() {
        let mut rng = StdRng::seed_from_u64(7);
        let clients = generate_clients(1000, &mut rng, today());
        assert_eq!(clients.len(), 1050);
        assert_eq!(clients.iter().filter(|c| c.email.is_none()).count(), 21);
        assert_eq!(clients.iter().filter(|c| c.city.is_none()).count(), 21);
        assert!(clients.iter().any(|c| c.age < 18 || c.age > 100));
        assert!(
            clients
                .iter()
                .filter_map(|c| c.email.as_deref())
                .any(|email| !email.contains('@'))
        );
        assert!(
            clients
                .iter()
                .filter_map(|c| c.city.as_deref())
                .any(|city| city.starts_with(' '))
        );
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = generate_clients(50, &mut StdRng::seed_from_u64(1), today());
        let b = generate_clients(50, &mut StdRng::seed_from_u64(1), today());
        assert_eq!(a, b);
    }

    #[test]
    fn test_sales_reference_clients() {
        let mut rng = StdRng::seed_from_u64(3);
        let sales = generate_sales(200, 20, &mut rng, today());
        assert_eq!(sales.len(), 200);
        for sale in &sales {
            assert!((1..=20).contains(&sale.client_id));
            assert!((1..=10).contains(&sale.quantity));
            assert!(sale.sale_date.as_str() <= "2024-10-01");
            assert!(sale.sale_date.as_str() >= "2023-10-02");
        }
    }
}
