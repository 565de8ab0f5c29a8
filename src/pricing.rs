//! Per-region unit prices
//!
//! Prices are plain configuration: a `PriceBook` maps a region identifier to
//! the unit prices of each service. The built-in book only knows
//! `ap-northeast-1`; anything else has to be added to the config file.
//! Prices are stored as decimal strings in TOML so no precision is lost on load.

use crate::error::{CostctlError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Region used when neither the CLI nor the config names one
pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// Lambda unit prices for one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaPricing {
    /// Currency per one million requests
    pub per_million_invocations: Decimal,
    /// Currency per GB-second of compute on x86_64
    pub per_gb_second_x86: Decimal,
    /// Currency per GB-second of compute on arm64
    pub per_gb_second_arm: Decimal,
}

/// DynamoDB unit prices for one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamoDbPricing {
    /// Currency per one million on-demand write request units
    pub on_demand_write_per_million: Decimal,
    /// Currency per one million on-demand read request units
    pub on_demand_read_per_million: Decimal,
    /// Currency per provisioned WCU-hour
    pub provisioned_wcu_hour: Decimal,
    /// Currency per provisioned RCU-hour
    pub provisioned_rcu_hour: Decimal,
}

/// Price tables for every supported service, keyed by region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBook {
    #[serde(default)]
    pub lambda: BTreeMap<String, LambdaPricing>,
    #[serde(default)]
    pub dynamodb: BTreeMap<String, DynamoDbPricing>,
}

impl PriceBook {
    /// The same book limited to `region`, or a copy of everything for `None`
    pub fn for_region(&self, region: Option<&str>) -> PriceBook {
        let wanted = |r: &str| region.map_or(true, |want| want == r);
        PriceBook {
            lambda: self
                .lambda
                .iter()
                .filter(|(r, _)| wanted(r.as_str()))
                .map(|(r, p)| (r.clone(), p.clone()))
                .collect(),
            dynamodb: self
                .dynamodb
                .iter()
                .filter(|(r, _)| wanted(r.as_str()))
                .map(|(r, p)| (r.clone(), p.clone()))
                .collect(),
        }
    }

    /// Look up Lambda prices; an unconfigured region is an error, never a default
    pub fn lambda(&self, region: &str) -> Result<&LambdaPricing> {
        self.lambda
            .get(region)
            .ok_or_else(|| unknown_region("lambda", region))
    }

    /// Look up DynamoDB prices; an unconfigured region is an error, never a default
    pub fn dynamodb(&self, region: &str) -> Result<&DynamoDbPricing> {
        self.dynamodb
            .get(region)
            .ok_or_else(|| unknown_region("dynamodb", region))
    }
}

fn unknown_region(service: &str, region: &str) -> CostctlError {
    CostctlError::UnknownRegion {
        service: service.to_string(),
        region: region.to_string(),
    }
}

impl Default for PriceBook {
    fn default() -> Self {
        let mut lambda = BTreeMap::new();
        lambda.insert(
            DEFAULT_REGION.to_string(),
            LambdaPricing {
                per_million_invocations: Decimal::new(20, 2),
                per_gb_second_x86: Decimal::new(166667, 10),
                per_gb_second_arm: Decimal::new(133334, 10),
            },
        );

        let mut dynamodb = BTreeMap::new();
        dynamodb.insert(
            DEFAULT_REGION.to_string(),
            DynamoDbPricing {
                on_demand_write_per_million: Decimal::new(14269, 4),
                on_demand_read_per_million: Decimal::new(285, 3),
                provisioned_wcu_hour: Decimal::new(7424, 7),
                provisioned_rcu_hour: Decimal::new(1484, 7),
            },
        );

        Self { lambda, dynamodb }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_book_has_tokyo_prices() {
        let book = PriceBook::default();
        let lambda = book.lambda("ap-northeast-1").unwrap();
        assert_eq!(lambda.per_million_invocations.to_string(), "0.20");
        assert_eq!(lambda.per_gb_second_x86.to_string(), "0.0000166667");

        let dynamodb = book.dynamodb("ap-northeast-1").unwrap();
        assert_eq!(dynamodb.on_demand_write_per_million.to_string(), "1.4269");
    }

    #[test]
    fn test_unknown_region_is_named_error() {
        let book = PriceBook::default();

        let err = book.lambda("eu-west-3").unwrap_err();
        assert!(matches!(
            err,
            CostctlError::UnknownRegion { ref service, ref region }
                if service == "lambda" && region == "eu-west-3"
        ));

        let err = book.dynamodb("eu-west-3").unwrap_err();
        assert!(err.to_string().contains("dynamodb"));
        assert!(err.to_string().contains("eu-west-3"));
    }

    #[test]
    fn test_extra_regions_are_injectable() {
        let mut book = PriceBook::default();
        let tokyo = book.lambda(DEFAULT_REGION).unwrap().clone();
        book.lambda.insert("us-east-1".to_string(), tokyo.clone());

        assert_eq!(book.lambda("us-east-1").unwrap(), &tokyo);
        assert!(book.dynamodb("us-east-1").is_err());
    }

    #[test]
    fn test_for_region_keeps_only_that_region() {
        let mut book = PriceBook::default();
        let tokyo = book.lambda(DEFAULT_REGION).unwrap().clone();
        book.lambda.insert("us-east-1".to_string(), tokyo);

        let only_tokyo = book.for_region(Some(DEFAULT_REGION));
        assert_eq!(only_tokyo.lambda.keys().collect::<Vec<_>>(), vec![DEFAULT_REGION]);
        assert_eq!(only_tokyo.dynamodb.len(), 1);

        let json = serde_json::to_string(&book.for_region(Some("us-east-1"))).unwrap();
        assert!(json.contains("us-east-1"));
        assert!(!json.contains(DEFAULT_REGION));

        assert_eq!(book.for_region(None), book);
    }
}
