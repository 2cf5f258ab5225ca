//! Sample data for exercising the pipeline.
//!
//! Generates a `clients` file with deliberate defects (malformed emails,
//! out-of-range ages, padded cities, duplicate rows and missing values) and a
//! clean `sales` file referencing the clients.

mod generate;
mod write;

pub use generate::{
    ClientRecord, SaleRecord, SampleConfig, SampleSummary, generate, generate_clients,
    generate_sales,
};
pub use write::{CsvRecord, SampleError, write_csv};
