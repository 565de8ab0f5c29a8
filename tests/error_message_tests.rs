//! Tests for error message quality
//!
//! A failed run prints one of these and exits, so each message has to name
//! what went wrong and where.

use chrono::{TimeZone, Utc};
use costctl::config::Config;
use costctl::error::{ConfigError, CostctlError};
use costctl::pricing::PriceBook;
use costctl::provider::Window;
use costctl::report::{ReportOverrides, ReportSettings};

#[test]
fn test_unknown_region_message_names_service_and_region() {
    let err = PriceBook::default().dynamodb("sa-east-1").unwrap_err();

    let msg = format!("{}", err);
    assert!(msg.contains("dynamodb"));
    assert!(msg.contains("sa-east-1"));
}

#[test]
fn test_malformed_response_message_names_operation() {
    let err = CostctlError::MalformedResponse {
        operation: "GetMetricStatistics".to_string(),
        reason: "datapoint without timestamp".to_string(),
    };

    let msg = format!("{}", err);
    assert!(msg.contains("GetMetricStatistics"));
    assert!(msg.contains("without timestamp"));
}

#[test]
fn test_bad_period_message_is_actionable() {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();

    let msg = Window::new(start, end, 90).unwrap_err().to_string();
    assert!(msg.contains("period"));
    assert!(msg.contains("multiple of 60"));
}

#[test]
fn test_bad_timestamp_message_quotes_input() {
    let overrides = ReportOverrides {
        start: Some("last tuesday".to_string()),
        ..Default::default()
    };
    let now = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();

    let msg = ReportSettings::resolve(overrides, &Config::default(), now)
        .unwrap_err()
        .to_string();
    assert!(msg.contains("start"));
    assert!(msg.contains("last tuesday"));
}

#[test]
fn test_config_error_converts() {
    let err: CostctlError = ConfigError::MissingField("aws.region".to_string()).into();

    let msg = format!("{}", err);
    assert!(msg.starts_with("Configuration error"));
    assert!(msg.contains("aws.region"));
}
