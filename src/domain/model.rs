use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One spreadsheet row keyed by header name, as produced by the CSV reader.
pub type RawRow = HashMap<String, String>;

/// Header names of the published sheet.
pub mod columns {
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
    pub const DATE: &str = "Date of ICE activity";
    pub const TIME: &str = "Time of ICE activity";
    pub const AGENT_COUNT: &str = "Approximate number of ICE agents";
    pub const LOCATION: &str = "Location of ICE activity";
    pub const BOROUGH: &str = "Borough of ICE activity";
    pub const DESCRIPTION: &str = "Description of ICE activity";
}

/// Reported number of agents, bucketed the way the sheet's form offers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentCount {
    OneOrTwo,
    ThreeToFive,
    SixToTen,
    MoreThanTen,
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub latitude: f64,
    pub longitude: f64,
    /// `None` when the date text could not be read; such records never pass
    /// the recency filter.
    pub occurred_at: Option<DateTime<Utc>>,
    pub date_text: String,
    pub time_of_day: String,
    pub agent_count: AgentCount,
    pub agent_count_text: String,
    pub location: String,
    pub borough: String,
    pub description: String,
    pub marker_radius: f64,
    pub cluster_weight: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeFilter {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "24h")]
    Recent24h,
}

/// A record ready for the display surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub weight: u32,
    pub popup_html: String,
    /// Id of the cluster this marker is folded into, if any.
    pub cluster: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterIcon {
    pub radius: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerCluster {
    pub id: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub count: usize,
    pub total_weight: u64,
    pub icon: ClusterIcon,
}

/// Everything one render pass hands to the display surface. The surface
/// replaces whatever it showed before with exactly this content.
#[derive(Debug, Clone, Serialize)]
pub struct MapSnapshot {
    pub filter: TimeFilter,
    pub generated_at: DateTime<Utc>,
    pub total_records: usize,
    pub markers: Vec<MapMarker>,
    pub clusters: Vec<MarkerCluster>,
}

/// Which cluster icon strategy sizes aggregated markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterPolicy {
    Count,
    #[default]
    Weight,
    Compact,
}
