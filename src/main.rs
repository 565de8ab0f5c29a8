use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use costctl::aws::AwsClients;
use costctl::config::{self, Config};
use costctl::report::{self, KindSelection, ReportOverrides, ReportSettings};
use costctl::summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "costctl")]
#[command(
    about = "Estimate AWS Lambda and DynamoDB cost from CloudWatch metrics",
    long_about = "costctl lists Lambda functions and DynamoDB tables, pulls their CloudWatch\nusage for a time window and prices every bucket with per-region unit prices.\n\nOutputs:\n  - lambda_cost.csv   (function_name,timestamp,period,memory_size,invocations,avg_duration,cost)\n  - dynamodb_cost.csv (table_name,timestamp,period,w_cost,r_cost,cost)"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    output: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch metrics, price them and write the CSV files
    ///
    /// Examples:
    ///   costctl report
    ///   costctl report --profile billing --region ap-northeast-1
    ///   costctl report --start 2024-06-01 --end 2024-07-01 --period 3600 --kind dynamodb
    Report {
        /// AWS shared-config profile
        #[arg(long, env = "AWS_PROFILE")]
        profile: Option<String>,
        /// AWS region; also selects the price table
        #[arg(long)]
        region: Option<String>,
        /// Inclusive start (RFC 3339 or ISO-8601, naive values are UTC)
        #[arg(long)]
        start: Option<String>,
        /// Exclusive end (defaults to now)
        #[arg(long)]
        end: Option<String>,
        /// Sampling period in seconds (multiple of 60)
        #[arg(long)]
        period: Option<u32>,
        /// Resource kinds to report on
        #[arg(long, value_enum, default_value_t = KindSelection::All)]
        kind: KindSelection,
        /// Output path for the Lambda file
        #[arg(long)]
        lambda_output: Option<PathBuf>,
        /// Output path for the DynamoDB file
        #[arg(long)]
        dynamodb_output: Option<PathBuf>,
    },
    /// Show the configured unit prices
    Prices {
        /// Only show this region
        #[arg(long)]
        region: Option<String>,
    },
    /// Write a config file with the built-in defaults and prices
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = ".costctl.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Report {
            profile,
            region,
            start,
            end,
            period,
            kind,
            lambda_output,
            dynamodb_output,
        } => {
            let overrides = ReportOverrides {
                profile,
                region,
                start,
                end,
                period_secs: period,
                kinds: kind,
                lambda_output,
                dynamodb_output,
            };
            let settings = ReportSettings::resolve(overrides, &config, Utc::now())
                .context("Invalid report settings")?;

            let clients = AwsClients::connect(settings.profile.as_deref(), &settings.region).await;
            let summaries = report::run_report(&settings, &config.pricing, &clients, &clients)
                .await
                .context("Cost report failed")?;

            if cli.output == "json" {
                summary::print_json(&summaries)?;
            } else {
                summary::print_text(&summaries);
            }
        }
        Commands::Prices { region } => {
            if cli.output == "json" {
                let book = config.pricing.for_region(region.as_deref());
                println!("{}", serde_json::to_string_pretty(&book)?);
            } else {
                println!("{}", summary::prices_table(&config.pricing, region.as_deref()));
            }
        }
        Commands::Init { output } => {
            config::init_config(&output)?;
        }
    }

    Ok(())
}
