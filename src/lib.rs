//! costctl library
//!
//! Estimates AWS Lambda and DynamoDB cost from CloudWatch metrics and writes
//! the results as CSV. The binary is a thin clap front end over `report`.

pub mod aws;
pub mod config;
pub mod cost;
pub mod error;
pub mod metrics;
pub mod pricing;
pub mod provider;
pub mod report;
pub mod summary;
pub mod utils;

// Re-export commonly used types
pub use error::{CostctlError, Result};
pub use pricing::PriceBook;
pub use report::{run_report, ReportOverrides, ReportSettings};
