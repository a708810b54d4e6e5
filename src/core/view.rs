use crate::core::filter::{MapRenderer, RecordStore};
use crate::core::{ActivityRecord, DisplaySurface, TimeFilter};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};

/// Owns the record store, the selected filter and the display surface.
/// Only the refresh loop (or a one-shot run) writes to it.
pub struct MapView<D: DisplaySurface> {
    store: RecordStore,
    filter: TimeFilter,
    renderer: MapRenderer,
    surface: D,
}

impl<D: DisplaySurface> MapView<D> {
    pub fn new(surface: D, renderer: MapRenderer, filter: TimeFilter) -> Self {
        Self {
            store: RecordStore::new(),
            filter,
            renderer,
            surface,
        }
    }

    pub fn filter(&self) -> TimeFilter {
        self.filter
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    /// Swaps in a freshly fetched record set and redraws.
    pub async fn load(&mut self, records: Vec<ActivityRecord>) -> Result<usize> {
        self.store.replace(records);
        self.render().await
    }

    /// Redraws the cached records under a new filter. Never fetches.
    pub async fn set_filter(&mut self, filter: TimeFilter) -> Result<usize> {
        if filter != self.filter {
            tracing::info!("🔀 Time filter changed: {} -> {}", self.filter.as_str(), filter.as_str());
        }
        self.filter = filter;
        self.render().await
    }

    pub async fn render(&self) -> Result<usize> {
        self.render_at(Utc::now()).await
    }

    /// Returns how many markers were shown.
    pub async fn render_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let snapshot = self.renderer.render(&self.store, self.filter, now);
        let visible = snapshot.markers.len();

        self.surface.present(&snapshot).await?;

        tracing::info!(
            "🗺️ Rendered {} of {} records ({} clusters, filter: {})",
            visible,
            snapshot.total_records,
            snapshot.clusters.len(),
            self.filter.as_str()
        );
        Ok(visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MapSnapshot;
    use crate::domain::model::AgentCount;
    use crate::utils::error::MapError;
    use chrono::Duration;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSurface {
        snapshots: Arc<Mutex<Vec<MapSnapshot>>>,
        fail: bool,
    }

    impl DisplaySurface for RecordingSurface {
        async fn present(&self, snapshot: &MapSnapshot) -> Result<()> {
            if self.fail {
                return Err(MapError::RenderError {
                    message: "surface offline".to_string(),
                });
            }
            self.snapshots.lock().unwrap().push(snapshot.clone());
            Ok(())
        }
    }

    fn record(hours_ago: i64) -> ActivityRecord {
        ActivityRecord {
            latitude: 40.7 + hours_ago as f64,
            longitude: -73.9,
            occurred_at: Some(Utc::now() - Duration::hours(hours_ago)),
            date_text: String::new(),
            time_of_day: String::new(),
            agent_count: AgentCount::SixToTen,
            agent_count_text: "6 to 10".to_string(),
            location: "Canal St".to_string(),
            borough: "Manhattan".to_string(),
            description: String::new(),
            marker_radius: 16.0,
            cluster_weight: 8,
        }
    }

    #[tokio::test]
    async fn test_load_replaces_store_and_presents() {
        let surface = RecordingSurface::default();
        let mut view = MapView::new(surface.clone(), MapRenderer::default(), TimeFilter::All);

        assert_eq!(view.load(vec![record(1), record(48)]).await.unwrap(), 2);
        assert_eq!(view.load(vec![record(1)]).await.unwrap(), 1);

        let snapshots = surface.snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1].markers.len(), 1);
        assert_eq!(view.store().len(), 1);
    }

    #[tokio::test]
    async fn test_set_filter_rerenders_cached_records() {
        let surface = RecordingSurface::default();
        let mut view = MapView::new(surface.clone(), MapRenderer::default(), TimeFilter::All);
        view.load(vec![record(1), record(48)]).await.unwrap();

        assert_eq!(view.set_filter(TimeFilter::Recent24h).await.unwrap(), 1);
        assert_eq!(view.set_filter(TimeFilter::All).await.unwrap(), 2);

        let snapshots = surface.snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[1].filter, TimeFilter::Recent24h);
        assert_eq!(view.filter(), TimeFilter::All);
    }

    #[tokio::test]
    async fn test_surface_failure_is_reported() {
        let surface = RecordingSurface {
            fail: true,
            ..Default::default()
        };
        let mut view = MapView::new(surface, MapRenderer::default(), TimeFilter::All);

        let err = view.load(vec![record(1)]).await.unwrap_err();
        assert!(matches!(err, MapError::RenderError { .. }));
    }
}
