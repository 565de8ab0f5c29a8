//! Options for a report run
//!
//! `ReportOverrides` is what the command line supplied; `ReportSettings` is the
//! result of layering it over the config file and the built-in defaults.

use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::provider::Window;
use crate::utils::parse_timestamp;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use std::path::PathBuf;

/// Which resource kinds to report on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum KindSelection {
    Lambda,
    Dynamodb,
    #[default]
    All,
}

impl KindSelection {
    pub fn includes_lambda(self) -> bool {
        matches!(self, KindSelection::Lambda | KindSelection::All)
    }

    pub fn includes_dynamodb(self) -> bool {
        matches!(self, KindSelection::Dynamodb | KindSelection::All)
    }
}

/// Values given on the command line; `None` defers to the config file
#[derive(Debug, Clone, Default)]
pub struct ReportOverrides {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub period_secs: Option<u32>,
    pub kinds: KindSelection,
    pub lambda_output: Option<PathBuf>,
    pub dynamodb_output: Option<PathBuf>,
}

/// Fully resolved inputs of one report run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub profile: Option<String>,
    pub region: String,
    pub window: Window,
    pub kinds: KindSelection,
    pub lambda_output: PathBuf,
    pub dynamodb_output: PathBuf,
}

impl ReportSettings {
    /// Layer `overrides` over `config`.
    ///
    /// Without `--end` the window ends at `now`; without `--start` it spans the
    /// configured number of days before the end.
    pub fn resolve(overrides: ReportOverrides, config: &Config, now: DateTime<Utc>) -> Result<Self> {
        let region = overrides
            .region
            .unwrap_or_else(|| config.aws.region.clone());
        if region.trim().is_empty() {
            return Err(ConfigError::MissingField("aws.region".to_string()).into());
        }
        if config.report.window_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "report.window_days".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }

        let end = match overrides.end.as_deref() {
            Some(value) => parse_timestamp("end", value)?,
            None => now,
        };
        let period_secs = overrides.period_secs.unwrap_or(config.report.period_secs);
        let window = match overrides.start.as_deref() {
            Some(value) => Window::new(parse_timestamp("start", value)?, end, period_secs)?,
            None => Window::trailing_days(end, config.report.window_days, period_secs)?,
        };

        Ok(Self {
            profile: overrides.profile.or_else(|| config.aws.profile.clone()),
            region,
            window,
            kinds: overrides.kinds,
            lambda_output: overrides
                .lambda_output
                .unwrap_or_else(|| config.report.lambda_output.clone()),
            dynamodb_output: overrides
                .dynamodb_output
                .unwrap_or_else(|| config.report.dynamodb_output.clone()),
        })
    }
}
