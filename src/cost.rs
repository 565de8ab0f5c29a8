//! Cost arithmetic for one resource and one time bucket
//!
//! Both calculators are pure: they read a descriptor, a sample and a price
//! entry and return a record. Nothing is summed across buckets or resources.
//! All money is `Decimal` and every step is checked, so an absurd metric value
//! is a `CostOverflow` error rather than a panic.

use crate::error::{CostctlError, Result};
use crate::pricing::{DynamoDbPricing, LambdaPricing};
use crate::provider::{Architecture, CapacityMode, FunctionDescriptor, TableDescriptor};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

const MB_PER_GB: u32 = 1024;
const SECONDS_PER_HOUR: u32 = 3600;
const ONE_MILLION: u32 = 1_000_000;

/// `factors[0] * factors[1] * ... / divisor`, or `None` on overflow
fn scaled_product(factors: &[Decimal], divisor: u32) -> Option<Decimal> {
    factors
        .iter()
        .try_fold(Decimal::ONE, |acc, factor| acc.checked_mul(*factor))?
        .checked_div(Decimal::from(divisor))
}

fn overflow(resource: &str, timestamp: DateTime<Utc>) -> CostctlError {
    CostctlError::CostOverflow {
        resource: resource.to_string(),
        timestamp: timestamp.to_rfc3339(),
    }
}

/// Lambda usage in one bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSample {
    pub timestamp: DateTime<Utc>,
    pub invocations: u64,
    pub avg_duration_secs: Decimal,
}

/// DynamoDB usage in one bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSample {
    pub timestamp: DateTime<Utc>,
    pub consumed_write_units: Decimal,
    pub consumed_read_units: Decimal,
    pub avg_provisioned_write: Decimal,
    pub avg_provisioned_read: Decimal,
}

impl TableSample {
    /// Billing mode implied by the sample itself.
    ///
    /// A bucket with no provisioned capacity on either side was served on demand.
    pub fn inferred_mode(&self) -> CapacityMode {
        if self.avg_provisioned_read.is_zero() && self.avg_provisioned_write.is_zero() {
            CapacityMode::OnDemand
        } else {
            CapacityMode::Provisioned
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionCostRecord {
    pub timestamp: DateTime<Utc>,
    pub period_secs: u32,
    pub cost: Decimal,
    pub memory_size_mb: u32,
    pub invocations: u64,
    pub avg_duration_secs: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCostRecord {
    pub timestamp: DateTime<Utc>,
    pub period_secs: u32,
    pub billed_as: CapacityMode,
    pub w_cost: Decimal,
    pub r_cost: Decimal,
    pub cost: Decimal,
}

/// Request charge plus compute charge for one bucket of one function.
///
/// `per_million_invocations * invocations / 1e6`
/// `+ per_gb_second[arch] * memory_gb * avg_duration_secs * invocations`
pub fn function_cost(
    descriptor: &FunctionDescriptor,
    sample: &FunctionSample,
    pricing: &LambdaPricing,
    period_secs: u32,
) -> Result<FunctionCostRecord> {
    let invocations = Decimal::from(sample.invocations);
    let gb_second_rate = match descriptor.architecture {
        Architecture::X86_64 => pricing.per_gb_second_x86,
        Architecture::Arm64 => pricing.per_gb_second_arm,
    };
    let memory_mb = Decimal::from(descriptor.memory_size_mb);

    let request_cost = scaled_product(&[pricing.per_million_invocations, invocations], ONE_MILLION);
    let compute_cost = scaled_product(
        &[gb_second_rate, memory_mb, sample.avg_duration_secs, invocations],
        MB_PER_GB,
    );
    let cost = request_cost
        .zip(compute_cost)
        .and_then(|(request, compute)| request.checked_add(compute))
        .ok_or_else(|| overflow(&descriptor.name, sample.timestamp))?;

    Ok(FunctionCostRecord {
        timestamp: sample.timestamp,
        period_secs,
        cost,
        memory_size_mb: descriptor.memory_size_mb,
        invocations: sample.invocations,
        avg_duration_secs: sample.avg_duration_secs,
    })
}

/// Write and read charges for one bucket of one table.
///
/// The branch follows `TableSample::inferred_mode`, not the descriptor.
/// On-demand buckets: `price_per_million * consumed * period / 1e6`.
/// Provisioned buckets: `price_per_hour * avg_provisioned * period / 3600`.
pub fn table_cost(
    descriptor: &TableDescriptor,
    sample: &TableSample,
    pricing: &DynamoDbPricing,
    period_secs: u32,
) -> Result<TableCostRecord> {
    let billed_as = sample.inferred_mode();
    let period = Decimal::from(period_secs);

    let (w_cost, r_cost) = match billed_as {
        CapacityMode::OnDemand => (
            scaled_product(
                &[pricing.on_demand_write_per_million, sample.consumed_write_units, period],
                ONE_MILLION,
            ),
            scaled_product(
                &[pricing.on_demand_read_per_million, sample.consumed_read_units, period],
                ONE_MILLION,
            ),
        ),
        CapacityMode::Provisioned => (
            scaled_product(
                &[pricing.provisioned_wcu_hour, sample.avg_provisioned_write, period],
                SECONDS_PER_HOUR,
            ),
            scaled_product(
                &[pricing.provisioned_rcu_hour, sample.avg_provisioned_read, period],
                SECONDS_PER_HOUR,
            ),
        ),
    };
    let (w_cost, r_cost, cost) = w_cost
        .zip(r_cost)
        .and_then(|(w, r)| Some((w, r, w.checked_add(r)?)))
        .ok_or_else(|| overflow(&descriptor.name, sample.timestamp))?;

    if billed_as != descriptor.capacity_mode {
        debug!(
            "{} at {} billed as {:?} but table reports {:?}",
            descriptor.name, sample.timestamp, billed_as, descriptor.capacity_mode
        );
    }

    Ok(TableCostRecord {
        timestamp: sample.timestamp,
        period_secs,
        billed_as,
        w_cost,
        r_cost,
        cost,
    })
}
