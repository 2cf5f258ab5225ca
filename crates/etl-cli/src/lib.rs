//! Command-line front end library components.

pub mod cli;
pub mod logging;
pub mod summary;
