use crate::core::parser::{normalize_rows, parse_rows};
use crate::core::{ActivityRecord, Fetcher, Pipeline, RawRow};
use crate::utils::error::Result;

/// Fetch → parse → normalize for the published sheet.
pub struct SheetPipeline<F: Fetcher> {
    fetcher: F,
}

impl<F: Fetcher> SheetPipeline<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn source(&self) -> &str {
        self.fetcher.source()
    }
}

#[async_trait::async_trait]
impl<F: Fetcher> Pipeline for SheetPipeline<F> {
    async fn extract(&self) -> Result<Vec<RawRow>> {
        let text = self.fetcher.fetch_text().await?;
        let rows = parse_rows(&text)?;
        tracing::debug!("Parsed {} rows from {}", rows.len(), self.fetcher.source());
        Ok(rows)
    }

    async fn transform(&self, rows: Vec<RawRow>) -> Result<Vec<ActivityRecord>> {
        // 座標無效的列在這裡被丟掉
        let records = normalize_rows(&rows);
        tracing::debug!("Normalized {} of {} rows", records.len(), rows.len());
        Ok(records)
    }
}
