//! Metric series retrieval and timestamp join
//!
//! Each metric a cost formula needs is fetched as its own series. Series are
//! merged per bucket by timestamp: a bucket present in any series appears in
//! the output, and a series with no datapoint for that bucket contributes 0.
//! CloudWatch returns datapoints in no particular order, so the merged output is
//! sorted by timestamp.

use crate::error::{CostctlError, Result};
use crate::provider::{Datapoint, MetricQuery, MonitoringApi, Statistic, Window};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

/// A metric to fetch and the aggregation to request for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesSpec {
    pub metric_name: &'static str,
    pub statistic: Statistic,
}

impl SeriesSpec {
    pub const fn sum(metric_name: &'static str) -> Self {
        Self {
            metric_name,
            statistic: Statistic::Sum,
        }
    }

    pub const fn average(metric_name: &'static str) -> Self {
        Self {
            metric_name,
            statistic: Statistic::Average,
        }
    }
}

/// One time bucket with a value for every requested series, in request order
pub type Bucket<const N: usize> = (DateTime<Utc>, [f64; N]);

/// Merge `N` independently fetched series into buckets keyed by timestamp.
pub fn join_by_timestamp<const N: usize>(series: [Vec<Datapoint>; N]) -> Vec<Bucket<N>> {
    let mut buckets: BTreeMap<DateTime<Utc>, [f64; N]> = BTreeMap::new();

    for (idx, points) in series.into_iter().enumerate() {
        for point in points {
            buckets.entry(point.timestamp).or_insert([0.0; N])[idx] = point.value;
        }
    }

    buckets.into_iter().collect()
}

/// Fetch every series in `specs` for one resource and join them by timestamp.
///
/// Queries are issued one after another in `specs` order.
pub async fn fetch_joined<const N: usize>(
    api: &dyn MonitoringApi,
    namespace: &str,
    dimension_name: &str,
    dimension_value: &str,
    specs: &[SeriesSpec; N],
    window: &Window,
) -> Result<Vec<Bucket<N>>> {
    let mut series: [Vec<Datapoint>; N] = std::array::from_fn(|_| Vec::new());

    for (slot, spec) in series.iter_mut().zip(specs.iter()) {
        let query = MetricQuery {
            namespace: namespace.to_string(),
            metric_name: spec.metric_name.to_string(),
            dimension_name: dimension_name.to_string(),
            dimension_value: dimension_value.to_string(),
            statistic: spec.statistic,
            window: *window,
        };
        *slot = api.metric_statistics(&query).await?;
        debug!(
            "{} {} for {}: {} datapoint(s)",
            namespace,
            spec.metric_name,
            dimension_value,
            slot.len()
        );
    }

    Ok(join_by_timestamp(series))
}

/// Convert a raw metric value to a `Decimal`.
///
/// Usage metrics are never negative; NaN, infinities and negatives are rejected.
pub fn to_decimal(value: f64, metric_name: &str) -> Result<Decimal> {
    if value < 0.0 {
        return Err(CostctlError::malformed(
            "GetMetricStatistics",
            format!("{} value {} is negative", metric_name, value),
        ));
    }
    Decimal::from_f64(value).ok_or_else(|| {
        CostctlError::malformed(
            "GetMetricStatistics",
            format!("{} value {} is not a finite number", metric_name, value),
        )
    })
}

/// Convert a Sum of counts to a whole count, truncating any fraction
pub fn to_count(value: f64, metric_name: &str) -> Result<u64> {
    if !value.is_finite() || value < 0.0 {
        return Err(CostctlError::malformed(
            "GetMetricStatistics",
            format!("{} value {} is not a valid count", metric_name, value),
        ));
    }
    Ok(value.trunc() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    fn point(day: u32, value: f64) -> Datapoint {
        Datapoint {
            timestamp: at(day),
            value,
        }
    }

    #[test]
    fn test_join_sorts_out_of_order_datapoints() {
        let joined = join_by_timestamp([
            vec![point(3, 30.0), point(1, 10.0), point(2, 20.0)],
            vec![point(2, 0.2), point(3, 0.3), point(1, 0.1)],
        ]);

        assert_eq!(
            joined,
            vec![
                (at(1), [10.0, 0.1]),
                (at(2), [20.0, 0.2]),
                (at(3), [30.0, 0.3]),
            ]
        );
    }

    #[test]
    fn test_join_zero_fills_missing_buckets() {
        // Provisioned series is empty for an on-demand table.
        let joined = join_by_timestamp([
            vec![point(1, 5.0), point(2, 6.0)],
            vec![point(2, 7.0)],
            vec![],
        ]);

        assert_eq!(
            joined,
            vec![(at(1), [5.0, 0.0, 0.0]), (at(2), [6.0, 7.0, 0.0])]
        );
    }

    #[test]
    fn test_join_keeps_buckets_only_present_in_later_series() {
        let joined = join_by_timestamp([vec![point(1, 1.0)], vec![point(4, 2.0)]]);
        assert_eq!(joined, vec![(at(1), [1.0, 0.0]), (at(4), [0.0, 2.0])]);
    }

    #[test]
    fn test_join_empty() {
        let joined: Vec<Bucket<2>> = join_by_timestamp([vec![], vec![]]);
        assert!(joined.is_empty());
    }

    #[test]
    fn test_to_decimal_rejects_non_finite() {
        assert_eq!(to_decimal(0.5, "Duration").unwrap(), Decimal::new(5, 1));
        assert!(to_decimal(f64::NAN, "Duration").is_err());
        assert!(to_decimal(f64::INFINITY, "Duration").is_err());
    }

    #[test]
    fn test_to_decimal_rejects_negative() {
        assert_eq!(to_decimal(0.0, "ConsumedWriteCapacityUnits").unwrap(), Decimal::ZERO);
        let err = to_decimal(-1_000_000.0, "ConsumedWriteCapacityUnits").unwrap_err();
        assert!(matches!(err, CostctlError::MalformedResponse { .. }));
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_to_count_truncates() {
        assert_eq!(to_count(1_000_000.0, "Invocations").unwrap(), 1_000_000);
        assert_eq!(to_count(2.9, "Invocations").unwrap(), 2);
        assert!(to_count(-1.0, "Invocations").is_err());
        assert!(to_count(f64::NAN, "Invocations").is_err());
    }
}
