//! AWS SDK implementation of the inventory and monitoring seams
//!
//! Every call is awaited before the next is issued and SDK errors are returned
//! as `CostctlError::Aws` with the failing operation in the message. Retries,
//! timeouts and credential resolution are whatever `aws-config` sets up.

use crate::error::{CostctlError, Result};
use crate::provider::{
    Architecture, CapacityMode, Datapoint, FunctionDescriptor, InventoryApi, MetricQuery,
    MonitoringApi, Page, Statistic,
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_cloudwatch::config::Region;
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types::{
    Datapoint as AwsDatapoint, Dimension, Metric, Statistic as AwsStatistic,
};
use aws_sdk_cloudwatch::Client as CloudWatchClient;
use aws_sdk_dynamodb::types::BillingMode;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_lambda::types::{Architecture as LambdaArchitecture, FunctionConfiguration};
use aws_sdk_lambda::Client as LambdaClient;
use chrono::{DateTime, Utc};
use tracing::info;

/// Lambda, DynamoDB and CloudWatch clients sharing one SDK config
#[derive(Debug, Clone)]
pub struct AwsClients {
    lambda: LambdaClient,
    dynamodb: DynamoDbClient,
    cloudwatch: CloudWatchClient,
}

impl AwsClients {
    /// Resolve credentials for `profile` (or the default chain) in `region`
    pub async fn connect(profile: Option<&str>, region: &str) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
        if let Some(profile) = profile {
            info!("Using AWS profile {}", profile);
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;
        Self::from_sdk_config(&sdk_config)
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Self {
        Self {
            lambda: LambdaClient::new(sdk_config),
            dynamodb: DynamoDbClient::new(sdk_config),
            cloudwatch: CloudWatchClient::new(sdk_config),
        }
    }
}

#[async_trait]
impl InventoryApi for AwsClients {
    async fn list_functions(&self, marker: Option<String>) -> Result<Page<FunctionDescriptor>> {
        let response = self
            .lambda
            .list_functions()
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| CostctlError::Aws(format!("Failed to list Lambda functions: {}", e)))?;

        let functions = response
            .functions()
            .iter()
            .map(function_descriptor)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(
            functions,
            response.next_marker().map(str::to_string),
        ))
    }

    async fn list_tables(&self, start_table: Option<String>) -> Result<Page<String>> {
        let response = self
            .dynamodb
            .list_tables()
            .set_exclusive_start_table_name(start_table)
            .send()
            .await
            .map_err(|e| CostctlError::Aws(format!("Failed to list DynamoDB tables: {}", e)))?;

        Ok(Page::new(
            response.table_names().to_vec(),
            response.last_evaluated_table_name().map(str::to_string),
        ))
    }

    async fn describe_table(&self, table_name: &str) -> Result<CapacityMode> {
        let response = self
            .dynamodb
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| {
                CostctlError::Aws(format!("Failed to describe table {}: {}", table_name, e))
            })?;

        let table = response.table().ok_or_else(|| {
            CostctlError::malformed("DescribeTable", format!("no table description for {}", table_name))
        })?;

        // Tables created before on-demand existed carry no summary.
        let mode = match table.billing_mode_summary().and_then(|s| s.billing_mode()) {
            Some(BillingMode::PayPerRequest) => CapacityMode::OnDemand,
            _ => CapacityMode::Provisioned,
        };
        Ok(mode)
    }
}

#[async_trait]
impl MonitoringApi for AwsClients {
    async fn list_dimension_values(
        &self,
        namespace: &str,
        metric_name: &str,
        dimension_name: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        let response = self
            .cloudwatch
            .list_metrics()
            .namespace(namespace)
            .metric_name(metric_name)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                CostctlError::Aws(format!(
                    "Failed to list metrics {}/{}: {}",
                    namespace, metric_name, e
                ))
            })?;

        Ok(Page::new(
            dimension_values(response.metrics(), dimension_name),
            response.next_token().map(str::to_string),
        ))
    }

    async fn metric_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>> {
        let period = i32::try_from(query.window.period_secs).map_err(|_| CostctlError::Validation {
            field: "period".to_string(),
            reason: format!("{} seconds is out of range", query.window.period_secs),
        })?;
        let dimension = Dimension::builder()
            .name(&query.dimension_name)
            .value(&query.dimension_value)
            .build();
        let statistic = match query.statistic {
            Statistic::Sum => AwsStatistic::Sum,
            Statistic::Average => AwsStatistic::Average,
        };

        let response = self
            .cloudwatch
            .get_metric_statistics()
            .namespace(&query.namespace)
            .metric_name(&query.metric_name)
            .dimensions(dimension)
            .start_time(to_aws_time(query.window.start))
            .end_time(to_aws_time(query.window.end))
            .period(period)
            .statistics(statistic)
            .send()
            .await
            .map_err(|e| {
                CostctlError::Aws(format!(
                    "Failed to get {} statistics for {}: {}",
                    query.metric_name, query.dimension_value, e
                ))
            })?;

        response
            .datapoints()
            .iter()
            .map(|dp| datapoint(dp, query))
            .collect()
    }
}

/// Values of `dimension_name` across a page of catalog entries
fn dimension_values(metrics: &[Metric], dimension_name: &str) -> Vec<String> {
    metrics
        .iter()
        .flat_map(|metric| metric.dimensions())
        .filter(|dimension| dimension.name() == Some(dimension_name))
        .filter_map(|dimension| dimension.value().map(str::to_string))
        .collect()
}

fn function_descriptor(function: &FunctionConfiguration) -> Result<FunctionDescriptor> {
    let name = function
        .function_name()
        .ok_or_else(|| CostctlError::malformed("ListFunctions", "function without a name"))?;
    let memory = function.memory_size().ok_or_else(|| {
        CostctlError::malformed("ListFunctions", format!("{} has no memory size", name))
    })?;
    let memory_size_mb = u32::try_from(memory).map_err(|_| {
        CostctlError::malformed("ListFunctions", format!("{} has memory size {}", name, memory))
    })?;
    let architecture = match function.architectures().first() {
        Some(LambdaArchitecture::Arm64) => Architecture::Arm64,
        _ => Architecture::X86_64,
    };

    Ok(FunctionDescriptor {
        name: name.to_string(),
        memory_size_mb,
        architecture,
    })
}

fn datapoint(dp: &AwsDatapoint, query: &MetricQuery) -> Result<Datapoint> {
    let timestamp = dp
        .timestamp()
        .and_then(from_aws_time)
        .ok_or_else(|| {
            CostctlError::malformed(
                "GetMetricStatistics",
                format!("{} datapoint without a usable timestamp", query.metric_name),
            )
        })?;
    let value = match query.statistic {
        Statistic::Sum => dp.sum(),
        Statistic::Average => dp.average(),
    }
    .ok_or_else(|| {
        CostctlError::malformed(
            "GetMetricStatistics",
            format!(
                "{} datapoint at {} lacks the {:?} statistic",
                query.metric_name, timestamp, query.statistic
            ),
        )
    })?;

    Ok(Datapoint { timestamp, value })
}

fn to_aws_time(time: DateTime<Utc>) -> AwsDateTime {
    AwsDateTime::from_millis(time.timestamp_millis())
}

fn from_aws_time(time: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(time.secs(), time.subsec_nanos())
}
