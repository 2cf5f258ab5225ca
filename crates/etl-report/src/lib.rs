//! Read-only reporting over the destination database.
//!
//! Every query returns a [`ResultTable`]; rendering is left to the caller.

mod error;
mod queries;
mod table;

pub use error::{ReportError, Result};
pub use queries::{CLIENTS_TABLE, DEFAULT_LIMIT, ReportSection, Reporter, SALES_TABLE};
pub use table::{Cell, ResultTable};
