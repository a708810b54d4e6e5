use crate::config::{MAX_CELL_DEGREES, MIN_CELL_DEGREES};
use crate::core::cluster::DEFAULT_CELL_DEGREES;
use crate::core::{ClusterPolicy, ConfigProvider, TimeFilter};
use crate::utils::error::{MapError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub map: MapSection,
    pub source: SourceConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub initial_filter: Option<String>,
    pub cluster_policy: Option<ClusterPolicy>,
    pub cluster_cell_degrees: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MapError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| MapError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SHEET_URL})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn source_url(&self) -> &str {
        &self.source.endpoint
    }

    fn output_path(&self) -> &str {
        &self.output.output_path
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.source.timeout_seconds.map(Duration::from_secs)
    }

    fn initial_filter(&self) -> TimeFilter {
        TimeFilter::from_selection(self.display.initial_filter.as_deref())
    }

    fn cluster_policy(&self) -> ClusterPolicy {
        self.display.cluster_policy.unwrap_or_default()
    }

    fn cluster_cell_degrees(&self) -> f64 {
        self.display
            .cluster_cell_degrees
            .unwrap_or(DEFAULT_CELL_DEGREES)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("map.name", &self.map.name)?;
        validate_url("source.endpoint", &self.source.endpoint)?;
        validate_path("output.output_path", &self.output.output_path)?;
        validate_range(
            "display.cluster_cell_degrees",
            self.cluster_cell_degrees(),
            MIN_CELL_DEGREES,
            MAX_CELL_DEGREES,
        )?;
        Ok(())
    }
}
