//! Provider-agnostic seams for inventory and monitoring calls
//!
//! The report pipeline never talks to an SDK client directly. It goes through
//! `InventoryApi` (what resources exist) and `MonitoringApi` (what they did),
//! which `crate::aws::AwsClients` implements for real accounts and tests
//! implement with fakes.

use crate::error::{CostctlError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use tracing::debug;

/// One page of a listing call plus the token for the next one, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }

    /// Final page: no continuation token
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

/// CPU architecture a function runs on; it selects the GB-second rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    #[default]
    X86_64,
    Arm64,
}

/// Billing mode a table was created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityMode {
    OnDemand,
    Provisioned,
}

/// Snapshot of a function taken at enumeration time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub name: String,
    pub memory_size_mb: u32,
    pub architecture: Architecture,
}

/// Snapshot of a table taken at enumeration time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub capacity_mode: CapacityMode,
}

/// Aggregation requested from the statistics endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Sum,
    Average,
}

/// Query window `[start, end)` sampled every `period_secs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub period_secs: u32,
}

impl Window {
    /// Build a window, rejecting anything CloudWatch would refuse.
    ///
    /// `start` must precede `end` and the period must be a positive multiple of 60.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, period_secs: u32) -> Result<Self> {
        if start >= end {
            return Err(CostctlError::Validation {
                field: "start".to_string(),
                reason: format!("start ({}) must be before end ({})", start, end),
            });
        }
        if period_secs == 0 || period_secs % 60 != 0 {
            return Err(CostctlError::Validation {
                field: "period".to_string(),
                reason: format!("{} is not a positive multiple of 60 seconds", period_secs),
            });
        }
        Ok(Self {
            start,
            end,
            period_secs,
        })
    }

    /// The `days` days ending at `end`
    pub fn trailing_days(end: DateTime<Utc>, days: u32, period_secs: u32) -> Result<Self> {
        Self::new(end - Duration::days(i64::from(days)), end, period_secs)
    }
}

/// A single statistics request: one metric, one resource, one aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub namespace: String,
    pub metric_name: String,
    pub dimension_name: String,
    pub dimension_value: String,
    pub statistic: Statistic,
    pub window: Window,
}

/// One timestamped aggregate, already reduced to the requested statistic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Listing calls for the resources we price
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// List one page of functions, starting after `marker`
    async fn list_functions(&self, marker: Option<String>) -> Result<Page<FunctionDescriptor>>;

    /// List one page of table names, starting after `start_table`
    async fn list_tables(&self, start_table: Option<String>) -> Result<Page<String>>;

    /// Read the billing mode of a single table
    async fn describe_table(&self, table_name: &str) -> Result<CapacityMode>;
}

/// Metric catalog and statistics calls
#[async_trait]
pub trait MonitoringApi: Send + Sync {
    /// One page of the metric catalog for `namespace`/`metric_name`, reduced to
    /// the values of `dimension_name` found on each metric
    async fn list_dimension_values(
        &self,
        namespace: &str,
        metric_name: &str,
        dimension_name: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>>;

    /// Datapoints for a single metric of a single resource
    async fn metric_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>>;
}

/// Drain a paginated listing call.
///
/// `fetch` is called with `None` first and then with each continuation token
/// until a page comes back without one. Items are returned in page order.
pub async fn collect_pages<T, F, Fut>(what: &str, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut token = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(token.take()).await?;
        pages += 1;
        debug!("{} page {}: {} item(s)", what, pages, page.items.len());
        items.extend(page.items);

        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    Ok(items)
}

/// Distinct dimension values reporting `metric_name`, following catalog pages
pub async fn discover_dimension_values(
    api: &dyn MonitoringApi,
    namespace: &str,
    metric_name: &str,
    dimension_name: &str,
) -> Result<BTreeSet<String>> {
    let values = collect_pages(&format!("{}/{}", namespace, metric_name), |token| {
        api.list_dimension_values(namespace, metric_name, dimension_name, token)
    })
    .await?;

    Ok(values.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_collect_pages_follows_tokens() {
        let pages = vec![
            Page::new(vec![1, 2], Some("a".to_string())),
            Page::new(vec![3], Some("b".to_string())),
            Page::last(vec![4, 5]),
        ];
        let mut seen_tokens = Vec::new();

        let items = collect_pages("numbers", |token| {
            let idx = seen_tokens.len();
            seen_tokens.push(token);
            let page = pages[idx].clone();
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            seen_tokens,
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[tokio::test]
    async fn test_collect_pages_propagates_errors() {
        let mut calls = 0;
        let result: Result<Vec<u32>> = collect_pages("failing", |_| {
            calls += 1;
            async { Err(CostctlError::Aws("throttled".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(CostctlError::Aws(ref m)) if m == "throttled"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_window_validation() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();

        assert!(Window::new(start, end, 86400).is_ok());
        assert!(Window::new(end, start, 86400).is_err());
        assert!(Window::new(start, start, 86400).is_err());
        assert!(Window::new(start, end, 0).is_err());

        let err = Window::new(start, end, 90).unwrap_err();
        assert!(matches!(err, CostctlError::Validation { ref field, .. } if field == "period"));
    }

    #[test]
    fn test_trailing_days() {
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let window = Window::trailing_days(end, 30, 86400).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(window.end, end);
        assert_eq!(window.period_secs, 86400);
    }

    #[tokio::test]
    async fn test_collect_pages_single_empty_page() {
        let items: Vec<String> = collect_pages("empty", |_| async { Ok(Page::last(vec![])) })
            .await
            .unwrap();
        assert!(items.is_empty());
    }
}
