use crate::core::{ActivityRecord, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Runs one ingest cycle (extract + transform) and hands back the fresh
/// record set. Loading it into the view is the caller's job.
pub struct IngestEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> IngestEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<Vec<ActivityRecord>> {
        tracing::debug!("Starting ingest cycle");

        // Extract
        let rows = self.pipeline.extract().await?;
        tracing::debug!("Extracted {} rows", rows.len());
        self.monitor.log_stats("Extract");

        // Transform
        let row_count = rows.len();
        let records = self.pipeline.transform(rows).await?;
        tracing::info!(
            "📥 Loaded {} records ({} rows without coordinates dropped)",
            records.len(),
            row_count - records.len()
        );
        self.monitor.log_stats("Transform");

        Ok(records)
    }
}
