use crate::domain::model::{ActivityRecord, ClusterPolicy, MapSnapshot, RawRow, TimeFilter};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Source of the raw sheet text.
pub trait Fetcher: Send + Sync {
    fn source(&self) -> &str;
    fn fetch_text(&self) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Where render passes end up. Each call replaces the previous contents.
pub trait DisplaySurface: Send + Sync {
    fn present(
        &self,
        snapshot: &MapSnapshot,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn source_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn request_timeout(&self) -> Option<Duration>;
    fn initial_filter(&self) -> TimeFilter;
    fn cluster_policy(&self) -> ClusterPolicy;
    fn cluster_cell_degrees(&self) -> f64;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<RawRow>>;
    async fn transform(&self, rows: Vec<RawRow>) -> Result<Vec<ActivityRecord>>;
}
