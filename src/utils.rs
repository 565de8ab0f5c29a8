use crate::error::{CostctlError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

/// Parse a CLI timestamp.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`, any offset), a naive ISO-8601
/// date-time (`2024-01-01T00:00:00`, optionally with fractional seconds) or a
/// bare date. Naive values are taken as UTC.
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }

    Err(CostctlError::Validation {
        field: field.to_string(),
        reason: format!("'{}' is not an ISO-8601 timestamp", value),
    })
}

/// Money for display, rounded to six decimal places
pub fn format_cost(cost: Decimal) -> String {
    format!("${}", cost.round_dp(6).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn test_parse_rfc3339() {
        let parsed = parse_timestamp("start", "2024-01-01T09:00:00+09:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_is_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("end", "2024-01-01T12:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("end", "2024-01-01 12:30:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("end", "2024-01-01T12:30:00.000000").unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_bare_date() {
        assert_eq!(
            parse_timestamp("start", "2024-02-29").unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_timestamp("start", "yesterday").unwrap_err();
        assert!(err.to_string().contains("start"));
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(Decimal::from_str("1.24166875").unwrap()), "$1.241669");
        assert_eq!(format_cost(Decimal::from_str("1.4269").unwrap()), "$1.4269");
        assert_eq!(format_cost(Decimal::ZERO), "$0");
    }
}
