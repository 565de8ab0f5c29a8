//! Error types for costctl
//!
//! Library code returns `crate::error::Result<T>` carrying a `CostctlError`.
//! The binary works in `anyhow::Result<T>` and converts at the CLI boundary,
//! so the full error chain is printed when a run aborts.
//!
//! ## When to Use Which Error
//!
//! - `ConfigError`: missing or invalid configuration values
//!   - Converted to `CostctlError::Config` via `#[from]`
//!
//! - `Aws`: any failure reported by an AWS SDK call
//!   - The message names the operation that failed
//!   - Never retried here; the SDK's own defaults are all there is
//!
//! - `MalformedResponse`: a call succeeded but the payload lacks a field we need
//!   (no timestamp on a datapoint, no requested statistic, non-finite values)
//!
//! - `UnknownRegion`: no price table entry exists for the selected region
//!
//! - `CostOverflow`: a bucket's cost does not fit in a `Decimal`; only absurd
//!   metric values get here
//!
//! - `Validation`: user input that cannot produce a meaningful query
//!   (inverted windows, periods CloudWatch would reject)

use thiserror::Error;

/// Main error type for costctl
#[derive(Error, Debug)]
pub enum CostctlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("AWS SDK error: {0}")]
    Aws(String),

    #[error("Malformed response from {operation}: {reason}")]
    MalformedResponse { operation: String, reason: String },

    #[error("No {service} pricing configured for region '{region}'")]
    UnknownRegion { service: String, region: String },

    #[error("Cost of {resource} at {timestamp} overflows")]
    CostOverflow { resource: String, timestamp: String },

    #[error("Validation error: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CostctlError>;

impl CostctlError {
    pub(crate) fn malformed(operation: &str, reason: impl Into<String>) -> Self {
        CostctlError::MalformedResponse {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}
