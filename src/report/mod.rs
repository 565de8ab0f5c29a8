//! Cost report pipeline
//!
//! A report for one resource kind is four steps: enumerate descriptors, fetch
//! metric samples, price every sample, and write the rows out. The steps that
//! differ between kinds live behind `ResourceKind`; `build_report` and
//! `run_kind` are shared by every kind.

pub mod dynamodb;
pub mod export;
pub mod lambda;
pub mod types;

use crate::error::Result;
use crate::pricing::PriceBook;
use crate::provider::{InventoryApi, MonitoringApi, Window};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

pub use dynamodb::DynamoDbReport;
pub use lambda::LambdaReport;
pub use types::{KindSelection, ReportOverrides, ReportSettings};

/// The per-kind half of the pipeline
#[async_trait]
pub trait ResourceKind: Send + Sync {
    type Descriptor: Send + Sync;
    type Sample: Send + Sync;
    type Record: Send + Sync;
    type Row: Serialize + DeserializeOwned;

    /// Short name used in logs and summaries
    fn kind(&self) -> &'static str;

    /// Fixed column header of the exported file
    fn header(&self) -> &'static [&'static str];

    fn descriptor_name<'a>(&self, descriptor: &'a Self::Descriptor) -> &'a str;

    /// Every resource of this kind, in listing order
    async fn enumerate(&self, inventory: &dyn InventoryApi) -> Result<Vec<Self::Descriptor>>;

    /// Samples for every resource that reported metrics in the window, by name
    async fn fetch_metrics(
        &self,
        monitoring: &dyn MonitoringApi,
        window: &Window,
    ) -> Result<BTreeMap<String, Vec<Self::Sample>>>;

    fn compute_cost(
        &self,
        descriptor: &Self::Descriptor,
        sample: &Self::Sample,
        period_secs: u32,
    ) -> Result<Self::Record>;

    fn record_cost(&self, record: &Self::Record) -> Decimal;

    fn to_row(&self, name: &str, record: &Self::Record) -> Self::Row;
}

/// Priced buckets of one resource, in chronological order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCosts<R> {
    pub name: String,
    pub records: Vec<R>,
}

/// Per-resource totals of a finished report, for display only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceTotal {
    pub name: String,
    pub buckets: usize,
    pub total_cost: Decimal,
}

/// What `run_kind` produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    pub kind: String,
    pub output: PathBuf,
    pub rows: usize,
    pub resources: Vec<ResourceTotal>,
}

/// Enumerate, fetch and price one resource kind.
///
/// Resources keep their enumeration order. A resource with no samples yields
/// an empty entry; samples for names absent from the inventory are dropped.
pub async fn build_report<K: ResourceKind>(
    kind: &K,
    inventory: &dyn InventoryApi,
    monitoring: &dyn MonitoringApi,
    window: &Window,
) -> Result<Vec<ResourceCosts<K::Record>>> {
    let descriptors = kind.enumerate(inventory).await?;
    info!("Found {} {} resource(s)", descriptors.len(), kind.kind());

    let mut samples = kind.fetch_metrics(monitoring, window).await?;
    info!(
        "{} resource(s) of kind {} reported metrics",
        samples.len(),
        kind.kind()
    );

    let mut report = Vec::with_capacity(descriptors.len());
    for descriptor in &descriptors {
        let name = kind.descriptor_name(descriptor);
        let records = samples
            .remove(name)
            .unwrap_or_default()
            .iter()
            .map(|sample| kind.compute_cost(descriptor, sample, window.period_secs))
            .collect::<Result<Vec<_>>>()?;
        report.push(ResourceCosts {
            name: name.to_string(),
            records,
        });
    }

    Ok(report)
}

/// Totals per resource, in report order. Display only, so totals saturate.
pub fn summarize<K: ResourceKind>(
    kind: &K,
    report: &[ResourceCosts<K::Record>],
) -> Vec<ResourceTotal> {
    report
        .iter()
        .map(|resource| ResourceTotal {
            name: resource.name.clone(),
            buckets: resource.records.len(),
            total_cost: resource
                .records
                .iter()
                .map(|record| kind.record_cost(record))
                .fold(Decimal::ZERO, Decimal::saturating_add),
        })
        .collect()
}

/// Run the whole pipeline for one kind and write its file to `output`
pub async fn run_kind<K: ResourceKind>(
    kind: &K,
    inventory: &dyn InventoryApi,
    monitoring: &dyn MonitoringApi,
    window: &Window,
    output: &Path,
) -> Result<KindSummary> {
    let report = build_report(kind, inventory, monitoring, window).await?;
    let rows = export::write_report(output, kind, &report)?;

    Ok(KindSummary {
        kind: kind.kind().to_string(),
        output: output.to_path_buf(),
        rows,
        resources: summarize(kind, &report),
    })
}

/// Run every selected kind in turn, Lambda first.
///
/// Prices for all selected kinds are resolved before the first API call, so an
/// unpriced region fails without touching the account.
pub async fn run_report(
    settings: &ReportSettings,
    pricing: &PriceBook,
    inventory: &dyn InventoryApi,
    monitoring: &dyn MonitoringApi,
) -> Result<Vec<KindSummary>> {
    let lambda = if settings.kinds.includes_lambda() {
        Some(LambdaReport::new(pricing, &settings.region)?)
    } else {
        None
    };
    let dynamodb = if settings.kinds.includes_dynamodb() {
        Some(DynamoDbReport::new(pricing, &settings.region)?)
    } else {
        None
    };

    info!(
        "Reporting {} to {} in {} with {}s buckets",
        settings.window.start, settings.window.end, settings.region, settings.window.period_secs
    );

    let mut summaries = Vec::new();
    if let Some(kind) = &lambda {
        summaries.push(
            run_kind(kind, inventory, monitoring, &settings.window, &settings.lambda_output)
                .await?,
        );
    }
    if let Some(kind) = &dynamodb {
        summaries.push(
            run_kind(kind, inventory, monitoring, &settings.window, &settings.dynamodb_output)
                .await?,
        );
    }

    Ok(summaries)
}
