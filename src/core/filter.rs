use crate::core::cluster::{cluster_markers, strategy_for, ClusterIconStrategy, DEFAULT_CELL_DEGREES};
use crate::core::presentation::PopupContent;
use crate::domain::model::{ActivityRecord, ClusterPolicy, MapMarker, MapSnapshot, TimeFilter};
use chrono::{DateTime, Duration, Utc};

pub fn recent_window() -> Duration {
    Duration::hours(24)
}

impl TimeFilter {
    /// Maps the selected control value to a filter. No selection, or a value
    /// nobody offers, shows everything.
    pub fn from_selection(selection: Option<&str>) -> Self {
        match selection.map(str::trim) {
            Some("24h") => TimeFilter::Recent24h,
            Some("all") => TimeFilter::All,
            None | Some("") => {
                tracing::debug!("No time filter selected, showing all records");
                TimeFilter::All
            }
            Some(other) => {
                tracing::warn!("Unknown time filter '{}', showing all records", other);
                TimeFilter::All
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeFilter::All => "all",
            TimeFilter::Recent24h => "24h",
        }
    }

    /// Records without a readable date never pass the recency window.
    /// The window is inclusive and future timestamps pass.
    pub fn matches(self, record: &ActivityRecord, now: DateTime<Utc>) -> bool {
        match self {
            TimeFilter::All => true,
            TimeFilter::Recent24h => record
                .occurred_at
                .is_some_and(|occurred_at| now - occurred_at <= recent_window()),
        }
    }
}

/// Owned cache of the last successful fetch. Replaced wholesale, never
/// patched.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<ActivityRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, records: Vec<ActivityRecord>) {
        self.records = records;
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn visible(
        &self,
        filter: TimeFilter,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = &ActivityRecord> {
        self.records
            .iter()
            .filter(move |record| filter.matches(record, now))
    }
}

pub fn to_marker(record: &ActivityRecord) -> MapMarker {
    MapMarker {
        latitude: record.latitude,
        longitude: record.longitude,
        radius: record.marker_radius,
        weight: record.cluster_weight,
        popup_html: PopupContent::from_record(record).to_html(),
        cluster: None,
    }
}

pub struct MapRenderer {
    strategy: Box<dyn ClusterIconStrategy>,
    cell_degrees: f64,
}

impl MapRenderer {
    pub fn new(strategy: Box<dyn ClusterIconStrategy>, cell_degrees: f64) -> Self {
        Self {
            strategy,
            cell_degrees,
        }
    }

    pub fn for_policy(policy: ClusterPolicy, cell_degrees: f64) -> Self {
        Self::new(strategy_for(policy), cell_degrees)
    }

    /// Turns the visible records into a [`MapSnapshot`].
    pub fn render(&self, store: &RecordStore, filter: TimeFilter, now: DateTime<Utc>) -> MapSnapshot {
        let mut markers: Vec<MapMarker> = store.visible(filter, now).map(to_marker).collect();
        let clusters = cluster_markers(&mut markers, self.cell_degrees, self.strategy.as_ref());

        MapSnapshot {
            filter,
            generated_at: now,
            total_records: store.len(),
            markers,
            clusters,
        }
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::for_policy(ClusterPolicy::default(), DEFAULT_CELL_DEGREES)
    }
}
