//! Shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use costctl::error::Result;
use costctl::provider::{
    CapacityMode, Datapoint, FunctionDescriptor, InventoryApi, MetricQuery, MonitoringApi, Page,
};
use mockall::mock;
use std::collections::HashMap;
use std::sync::Mutex;

mock! {
    pub Inventory {}

    #[async_trait]
    impl InventoryApi for Inventory {
        async fn list_functions(&self, marker: Option<String>) -> Result<Page<FunctionDescriptor>>;
        async fn list_tables(&self, start_table: Option<String>) -> Result<Page<String>>;
        async fn describe_table(&self, table_name: &str) -> Result<CapacityMode>;
    }
}

/// In-memory CloudWatch: a metric catalog plus datapoints per (metric, resource)
#[derive(Default)]
pub struct FakeMonitoring {
    catalog: HashMap<(String, String), Vec<String>>,
    series: HashMap<(String, String), Vec<Datapoint>>,
    pub queries: Mutex<Vec<MetricQuery>>,
}

impl FakeMonitoring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources that report `metric` in `namespace`
    pub fn with_catalog(mut self, namespace: &str, metric: &str, names: &[&str]) -> Self {
        self.catalog.insert(
            (namespace.to_string(), metric.to_string()),
            names.iter().map(|n| n.to_string()).collect(),
        );
        self
    }

    pub fn with_series(mut self, metric: &str, resource: &str, points: &[(DateTime<Utc>, f64)]) -> Self {
        self.series.insert(
            (metric.to_string(), resource.to_string()),
            points
                .iter()
                .map(|&(timestamp, value)| Datapoint { timestamp, value })
                .collect(),
        );
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl MonitoringApi for FakeMonitoring {
    // Serves the catalog one name per page to exercise token handling.
    async fn list_dimension_values(
        &self,
        namespace: &str,
        metric_name: &str,
        _dimension_name: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        let names = self
            .catalog
            .get(&(namespace.to_string(), metric_name.to_string()))
            .cloned()
            .unwrap_or_default();
        let idx: usize = next_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let items = names.get(idx).cloned().into_iter().collect();
        let next = if idx + 1 < names.len() {
            Some((idx + 1).to_string())
        } else {
            None
        };
        Ok(Page::new(items, next))
    }

    async fn metric_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self
            .series
            .get(&(query.metric_name.clone(), query.dimension_value.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

pub fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, n, 0, 0, 0).unwrap()
}

pub fn function(name: &str, memory_size_mb: u32) -> FunctionDescriptor {
    FunctionDescriptor {
        name: name.to_string(),
        memory_size_mb,
        architecture: Default::default(),
    }
}
