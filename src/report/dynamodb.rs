//! DynamoDB table costs

use crate::cost::{table_cost, TableCostRecord, TableSample};
use crate::error::Result;
use crate::metrics::{fetch_joined, to_decimal, SeriesSpec};
use crate::pricing::{DynamoDbPricing, PriceBook};
use crate::provider::{
    collect_pages, discover_dimension_values, InventoryApi, MonitoringApi, TableDescriptor, Window,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::ResourceKind;

pub const NAMESPACE: &str = "AWS/DynamoDB";
pub const DIMENSION: &str = "TableName";
pub const CONSUMED_WRITE: &str = "ConsumedWriteCapacityUnits";
pub const CONSUMED_READ: &str = "ConsumedReadCapacityUnits";
pub const PROVISIONED_WRITE: &str = "ProvisionedWriteCapacityUnits";
pub const PROVISIONED_READ: &str = "ProvisionedReadCapacityUnits";

const SERIES: [SeriesSpec; 4] = [
    SeriesSpec::sum(CONSUMED_WRITE),
    SeriesSpec::sum(CONSUMED_READ),
    SeriesSpec::average(PROVISIONED_WRITE),
    SeriesSpec::average(PROVISIONED_READ),
];

pub const HEADER: [&str; 6] = ["table_name", "timestamp", "period", "w_cost", "r_cost", "cost"];

/// One exported line of the table file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCostRow {
    pub table_name: String,
    pub timestamp: DateTime<Utc>,
    pub period: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub w_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub r_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub cost: Decimal,
}

/// DynamoDB cost report priced for a single region
#[derive(Debug, Clone)]
pub struct DynamoDbReport {
    pricing: DynamoDbPricing,
}

impl DynamoDbReport {
    /// Fails with `UnknownRegion` if `region` has no DynamoDB prices
    pub fn new(book: &PriceBook, region: &str) -> Result<Self> {
        Ok(Self {
            pricing: book.dynamodb(region)?.clone(),
        })
    }
}

#[async_trait]
impl ResourceKind for DynamoDbReport {
    type Descriptor = TableDescriptor;
    type Sample = TableSample;
    type Record = TableCostRecord;
    type Row = TableCostRow;

    fn kind(&self) -> &'static str {
        "dynamodb"
    }

    fn header(&self) -> &'static [&'static str] {
        &HEADER
    }

    fn descriptor_name<'a>(&self, descriptor: &'a TableDescriptor) -> &'a str {
        &descriptor.name
    }

    async fn enumerate(&self, inventory: &dyn InventoryApi) -> Result<Vec<TableDescriptor>> {
        let names = collect_pages("ListTables", |start| inventory.list_tables(start)).await?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let capacity_mode = inventory.describe_table(&name).await?;
            debug!("Table {} is {:?}", name, capacity_mode);
            tables.push(TableDescriptor {
                name,
                capacity_mode,
            });
        }
        Ok(tables)
    }

    async fn fetch_metrics(
        &self,
        monitoring: &dyn MonitoringApi,
        window: &Window,
    ) -> Result<BTreeMap<String, Vec<TableSample>>> {
        let names =
            discover_dimension_values(monitoring, NAMESPACE, CONSUMED_WRITE, DIMENSION).await?;

        let mut samples = BTreeMap::new();
        for name in names {
            let buckets = fetch_joined(monitoring, NAMESPACE, DIMENSION, &name, &SERIES, window).await?;
            let series = buckets
                .into_iter()
                .map(|(timestamp, [cw, cr, pw, pr])| {
                    Ok(TableSample {
                        timestamp,
                        consumed_write_units: to_decimal(cw, CONSUMED_WRITE)?,
                        consumed_read_units: to_decimal(cr, CONSUMED_READ)?,
                        avg_provisioned_write: to_decimal(pw, PROVISIONED_WRITE)?,
                        avg_provisioned_read: to_decimal(pr, PROVISIONED_READ)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            samples.insert(name, series);
        }

        Ok(samples)
    }

    fn compute_cost(
        &self,
        descriptor: &TableDescriptor,
        sample: &TableSample,
        period_secs: u32,
    ) -> Result<TableCostRecord> {
        table_cost(descriptor, sample, &self.pricing, period_secs)
    }

    fn record_cost(&self, record: &TableCostRecord) -> Decimal {
        record.cost
    }

    fn to_row(&self, name: &str, record: &TableCostRecord) -> TableCostRow {
        TableCostRow {
            table_name: name.to_string(),
            timestamp: record.timestamp,
            period: record.period_secs,
            w_cost: record.w_cost.normalize(),
            r_cost: record.r_cost.normalize(),
            cost: record.cost.normalize(),
        }
    }
}
