//! Lambda function costs

use crate::cost::{function_cost, FunctionCostRecord, FunctionSample};
use crate::error::Result;
use crate::metrics::{fetch_joined, to_count, to_decimal, SeriesSpec};
use crate::pricing::{LambdaPricing, PriceBook};
use crate::provider::{
    collect_pages, discover_dimension_values, FunctionDescriptor, InventoryApi, MonitoringApi,
    Window,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ResourceKind;

pub const NAMESPACE: &str = "AWS/Lambda";
pub const DIMENSION: &str = "FunctionName";
pub const INVOCATIONS: &str = "Invocations";
pub const DURATION: &str = "Duration";

const SERIES: [SeriesSpec; 2] = [SeriesSpec::sum(INVOCATIONS), SeriesSpec::average(DURATION)];

pub const HEADER: [&str; 7] = [
    "function_name",
    "timestamp",
    "period",
    "memory_size",
    "invocations",
    "avg_duration",
    "cost",
];

/// One exported line of the function file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCostRow {
    pub function_name: String,
    pub timestamp: DateTime<Utc>,
    pub period: u32,
    pub memory_size: u32,
    pub invocations: u64,
    /// Seconds
    #[serde(with = "rust_decimal::serde::str")]
    pub avg_duration: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub cost: Decimal,
}

/// Lambda cost report priced for a single region
#[derive(Debug, Clone)]
pub struct LambdaReport {
    pricing: LambdaPricing,
}

impl LambdaReport {
    /// Fails with `UnknownRegion` if `region` has no Lambda prices
    pub fn new(book: &PriceBook, region: &str) -> Result<Self> {
        Ok(Self {
            pricing: book.lambda(region)?.clone(),
        })
    }
}

#[async_trait]
impl ResourceKind for LambdaReport {
    type Descriptor = FunctionDescriptor;
    type Sample = FunctionSample;
    type Record = FunctionCostRecord;
    type Row = FunctionCostRow;

    fn kind(&self) -> &'static str {
        "lambda"
    }

    fn header(&self) -> &'static [&'static str] {
        &HEADER
    }

    fn descriptor_name<'a>(&self, descriptor: &'a FunctionDescriptor) -> &'a str {
        &descriptor.name
    }

    async fn enumerate(&self, inventory: &dyn InventoryApi) -> Result<Vec<FunctionDescriptor>> {
        collect_pages("ListFunctions", |marker| inventory.list_functions(marker)).await
    }

    async fn fetch_metrics(
        &self,
        monitoring: &dyn MonitoringApi,
        window: &Window,
    ) -> Result<BTreeMap<String, Vec<FunctionSample>>> {
        let names = discover_dimension_values(monitoring, NAMESPACE, INVOCATIONS, DIMENSION).await?;

        let mut samples = BTreeMap::new();
        for name in names {
            let buckets = fetch_joined(monitoring, NAMESPACE, DIMENSION, &name, &SERIES, window).await?;
            let series = buckets
                .into_iter()
                .map(|(timestamp, [invocations, duration_ms])| {
                    Ok(FunctionSample {
                        timestamp,
                        invocations: to_count(invocations, INVOCATIONS)?,
                        avg_duration_secs: to_decimal(duration_ms, DURATION)? / Decimal::ONE_THOUSAND,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            samples.insert(name, series);
        }

        Ok(samples)
    }

    fn compute_cost(
        &self,
        descriptor: &FunctionDescriptor,
        sample: &FunctionSample,
        period_secs: u32,
    ) -> Result<FunctionCostRecord> {
        function_cost(descriptor, sample, &self.pricing, period_secs)
    }

    fn record_cost(&self, record: &FunctionCostRecord) -> Decimal {
        record.cost
    }

    fn to_row(&self, name: &str, record: &FunctionCostRecord) -> FunctionCostRow {
        FunctionCostRow {
            function_name: name.to_string(),
            timestamp: record.timestamp,
            period: record.period_secs,
            memory_size: record.memory_size_mb,
            invocations: record.invocations,
            avg_duration: record.avg_duration_secs.normalize(),
            cost: record.cost.normalize(),
        }
    }
}
