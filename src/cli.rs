use std::path::PathBuf;

use clap::Parser;

use crate::config::OutputFormat;

/// Live CO2, temperature and humidity readings from an air quality sensor.
#[derive(Parser, Debug)]
#[command(name = "air_quality_dashboard", version, long_about = None)]
pub struct Cli {
    /// Path to a TOML config file (defaults to ./air_quality_dashboard.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base url of the sensor's web server
    #[arg(long)]
    pub base_url: Option<String>,

    /// Milliseconds between refresh cycles
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[arg(long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long)]
    pub log_level: Option<String>,

    /// Run a single refresh cycle, print the dashboard and exit
    #[arg(long)]
    pub once: bool,
}
