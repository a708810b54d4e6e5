pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::cluster::DEFAULT_CELL_DEGREES;
#[cfg(feature = "cli")]
use crate::core::{ClusterPolicy, ConfigProvider, TimeFilter};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use std::time::Duration;

/// The published sheet the map was built for.
pub const DEFAULT_SOURCE_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vTuT8A5dVlZLc7so9ycNYn-rX6kyknKKxz4gSUp5nKrPS5r91fnOb07P4yRzc3WNjJeHVjoMbTZGusK/pub?output=csv";

pub(crate) const MIN_CELL_DEGREES: f64 = 0.0001;
pub(crate) const MAX_CELL_DEGREES: f64 = 10.0;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "activity-map")]
#[command(about = "Fetches the activity sheet and keeps a clustered map snapshot up to date")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Initial time filter: "all" or "24h"
    #[arg(long)]
    pub filter: Option<String>,

    /// Cluster icon sizing: count, weight or compact
    #[arg(long, default_value = "weight")]
    pub cluster_policy: ClusterPolicy,

    #[arg(long, default_value_t = DEFAULT_CELL_DEGREES)]
    pub cluster_cell_degrees: f64,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Load settings from a TOML file instead of the flags above
    #[arg(short, long)]
    pub config: Option<String>,

    /// Fetch and render once, then exit
    #[arg(long)]
    pub once: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU and memory per refresh phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn source_url(&self) -> &str {
        &self.source_url
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    fn initial_filter(&self) -> TimeFilter {
        TimeFilter::from_selection(self.filter.as_deref())
    }

    fn cluster_policy(&self) -> ClusterPolicy {
        self.cluster_policy
    }

    fn cluster_cell_degrees(&self) -> f64 {
        self.cluster_cell_degrees
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("source_url", &self.source_url)?;
        validate_path("output_path", &self.output_path)?;
        validate_range(
            "cluster_cell_degrees",
            self.cluster_cell_degrees,
            MIN_CELL_DEGREES,
            MAX_CELL_DEGREES,
        )?;
        Ok(())
    }
}
