use crate::pricing::{PriceBook, DEFAULT_REGION};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Every section is optional; missing sections and fields take the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub aws: AwsConfig,
    pub report: ReportConfig,
    pub pricing: PriceBook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Shared-config profile; the default credential chain is used if unset
    pub profile: Option<String>,
    /// Region to query; also the key into the price tables
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Length of the trailing window when no start is given
    pub window_days: u32,
    /// Sampling period in seconds
    pub period_secs: u32,
    pub lambda_output: PathBuf,
    pub dynamodb_output: PathBuf,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            profile: None,
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            period_secs: 60 * 60 * 24,
            lambda_output: PathBuf::from("lambda_cost.csv"),
            dynamodb_output: PathBuf::from("dynamodb_cost.csv"),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            // Try .costctl.toml in current dir, then ~/.config/costctl/config.toml
            let local = PathBuf::from(".costctl.toml");
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("costctl").join("config.toml"))
                    .unwrap_or_else(|| PathBuf::from(".costctl.toml"))
            }
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
            let config: Config = toml::from_str(&content).with_context(|| {
                let mut err = format!("Failed to parse config: {}", config_path.display());
                err.push_str("\n  Common issues:");
                err.push_str("\n    - Invalid TOML syntax");
                err.push_str("\n    - Prices written as floats instead of quoted decimals");
                err.push_str("\n  Tip: Run 'costctl init' to create a new config file");
                err
            })?;
            Ok(config)
        } else {
            if path.is_some() {
                eprintln!("WARNING: Config file not found: {}", config_path.display());
                eprintln!("   Using default configuration. Run 'costctl init' to create a config file.");
            }
            Ok(Config::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

pub fn init_config(output: &Path) -> Result<()> {
    let config = Config::default();
    config.save(output)?;
    println!("Created config file: {}", output.display());
    Ok(())
}
