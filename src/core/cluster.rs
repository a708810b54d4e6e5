use crate::domain::model::{ClusterIcon, ClusterPolicy, MapMarker, MarkerCluster};
use crate::utils::error::{MapError, Result};
use std::collections::BTreeMap;
use std::str::FromStr;

pub const DEFAULT_CELL_DEGREES: f64 = 0.01;

/// Sizes a cluster icon from its members only, so the same member set always
/// yields the same icon.
pub trait ClusterIconStrategy: Send + Sync {
    fn icon(&self, members: &[&MapMarker]) -> ClusterIcon;
}

/// Zero weights still count as one agent.
fn member_weight(marker: &MapMarker) -> u64 {
    u64::from(marker.weight.max(1))
}

fn count_label(members: &[&MapMarker]) -> String {
    members.len().to_string()
}

fn capped_linear(base: f64, cap: f64, count: usize) -> f64 {
    (base + count as f64).min(cap)
}

/// `min(base + count, cap)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountRadius {
    pub base: f64,
    pub cap: f64,
}

impl Default for CountRadius {
    fn default() -> Self {
        Self { base: 10.0, cap: 40.0 }
    }
}

impl ClusterIconStrategy for CountRadius {
    fn icon(&self, members: &[&MapMarker]) -> ClusterIcon {
        ClusterIcon {
            radius: capped_linear(self.base, self.cap, members.len()),
            label: count_label(members),
        }
    }
}

/// `base + sqrt(total weight) * scale`, so a few high-count incidents
/// outweigh many small ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightRadius {
    pub base: f64,
    pub scale: f64,
}

impl Default for WeightRadius {
    fn default() -> Self {
        Self {
            base: 10.0,
            scale: 3.0,
        }
    }
}

impl ClusterIconStrategy for WeightRadius {
    fn icon(&self, members: &[&MapMarker]) -> ClusterIcon {
        let total: u64 = members.iter().map(|m| member_weight(m)).sum();
        ClusterIcon {
            radius: self.base + (total as f64).sqrt() * self.scale,
            label: count_label(members),
        }
    }
}

/// Same shape as [`CountRadius`] with larger constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompactCount {
    pub base: f64,
    pub cap: f64,
}

impl Default for CompactCount {
    fn default() -> Self {
        Self { base: 20.0, cap: 50.0 }
    }
}

impl ClusterIconStrategy for CompactCount {
    fn icon(&self, members: &[&MapMarker]) -> ClusterIcon {
        ClusterIcon {
            radius: capped_linear(self.base, self.cap, members.len()),
            label: count_label(members),
        }
    }
}

pub fn strategy_for(policy: ClusterPolicy) -> Box<dyn ClusterIconStrategy> {
    match policy {
        ClusterPolicy::Count => Box::new(CountRadius::default()),
        ClusterPolicy::Weight => Box::new(WeightRadius::default()),
        ClusterPolicy::Compact => Box::new(CompactCount::default()),
    }
}

impl ClusterPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ClusterPolicy::Count => "count",
            ClusterPolicy::Weight => "weight",
            ClusterPolicy::Compact => "compact",
        }
    }
}

impl FromStr for ClusterPolicy {
    type Err = MapError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "count" => Ok(ClusterPolicy::Count),
            "weight" => Ok(ClusterPolicy::Weight),
            "compact" => Ok(ClusterPolicy::Compact),
            _ => Err(MapError::InvalidConfigValueError {
                field: "cluster_policy".to_string(),
                value: value.to_string(),
                reason: "Expected one of: count, weight, compact".to_string(),
            }),
        }
    }
}

fn grid_cell(marker: &MapMarker, cell_degrees: f64) -> (i64, i64) {
    (
        (marker.latitude / cell_degrees).floor() as i64,
        (marker.longitude / cell_degrees).floor() as i64,
    )
}

/// Buckets markers on a lat/lon grid. Cells with two or more markers become a
/// cluster centred on the members' mean position, and each member marker is
/// tagged with that cluster's id. Single markers stay unclustered with no id.
/// Output is ordered by grid cell and ids follow that order.
pub fn cluster_markers(
    markers: &mut [MapMarker],
    cell_degrees: f64,
    strategy: &dyn ClusterIconStrategy,
) -> Vec<MarkerCluster> {
    let mut cells: BTreeMap<(i64, i64), Vec<usize>> = BTreeMap::new();
    for (index, marker) in markers.iter_mut().enumerate() {
        marker.cluster = None;
        cells
            .entry(grid_cell(marker, cell_degrees))
            .or_default()
            .push(index);
    }

    let member_sets: Vec<Vec<usize>> = cells
        .into_values()
        .filter(|indices| indices.len() >= 2)
        .collect();

    let clusters: Vec<MarkerCluster> = member_sets
        .iter()
        .enumerate()
        .map(|(id, indices)| {
            let members: Vec<&MapMarker> = indices.iter().map(|&i| &markers[i]).collect();
            let count = members.len();
            let latitude = members.iter().map(|m| m.latitude).sum::<f64>() / count as f64;
            let longitude = members.iter().map(|m| m.longitude).sum::<f64>() / count as f64;
            MarkerCluster {
                id,
                latitude,
                longitude,
                count,
                total_weight: members.iter().map(|m| member_weight(m)).sum(),
                icon: strategy.icon(&members),
            }
        })
        .collect();

    for (id, indices) in member_sets.iter().enumerate() {
        for &index in indices {
            markers[index].cluster = Some(id);
        }
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(latitude: f64, longitude: f64, weight: u32) -> MapMarker {
        MapMarker {
            latitude,
            longitude,
            radius: 10.0,
            weight,
            popup_html: String::new(),
            cluster: None,
        }
    }

    #[test]
    fn test_weight_radius_uses_sqrt_of_summed_weight() {
        let markers = [marker(40.7, -73.9, 1), marker(40.7, -73.9, 1), marker(40.7, -73.9, 15)];
        let members: Vec<&MapMarker> = markers.iter().collect();

        let icon = WeightRadius::default().icon(&members);

        assert_eq!(icon.radius, 10.0 + 17f64.sqrt() * 3.0);
        assert_eq!(icon.label, "3");
        // 同一組成員必須得到相同結果
        assert_eq!(WeightRadius::default().icon(&members), icon);
    }

    #[test]
    fn test_weight_radius_treats_zero_weight_as_one() {
        let markers = [marker(0.0, 0.0, 0), marker(0.0, 0.0, 0)];
        let members: Vec<&MapMarker> = markers.iter().collect();

        let icon = WeightRadius::default().icon(&members);
        assert_eq!(icon.radius, 10.0 + 2f64.sqrt() * 3.0);
    }

    #[test]
    fn test_count_radius_is_capped() {
        let small: Vec<MapMarker> = (0..5).map(|_| marker(0.0, 0.0, 15)).collect();
        let large: Vec<MapMarker> = (0..100).map(|_| marker(0.0, 0.0, 1)).collect();

        let strategy = CountRadius::default();
        assert_eq!(strategy.icon(&small.iter().collect::<Vec<_>>()).radius, 15.0);
        assert_eq!(strategy.icon(&large.iter().collect::<Vec<_>>()).radius, 40.0);

        let compact = CompactCount::default();
        assert_eq!(compact.icon(&small.iter().collect::<Vec<_>>()).radius, 25.0);
        assert_eq!(compact.icon(&large.iter().collect::<Vec<_>>()).radius, 50.0);
    }

    #[test]
    fn test_strategy_for_policy() {
        let markers = [marker(0.0, 0.0, 15), marker(0.0, 0.0, 15)];
        let members: Vec<&MapMarker> = markers.iter().collect();

        assert_eq!(strategy_for(ClusterPolicy::Count).icon(&members).radius, 12.0);
        assert_eq!(strategy_for(ClusterPolicy::Compact).icon(&members).radius, 22.0);
        assert_eq!(
            strategy_for(ClusterPolicy::Weight).icon(&members).radius,
            10.0 + 30f64.sqrt() * 3.0
        );
    }

    #[test]
    fn test_cluster_markers_groups_by_cell_and_skips_singletons() {
        let mut markers = vec![
            marker(40.7001, -73.9001, 1),
            marker(40.7003, -73.9004, 15),
            marker(40.7502, -73.8002, 4),
        ];

        let clusters = cluster_markers(&mut markers, 0.01, &WeightRadius::default());

        assert_eq!(clusters.len(), 1);
        let cluster = &clusters[0];
        assert_eq!(cluster.count, 2);
        assert_eq!(cluster.total_weight, 16);
        assert!((cluster.latitude - 40.7002).abs() < 1e-9);
        assert!((cluster.longitude - (-73.90025)).abs() < 1e-9);
        assert_eq!(cluster.icon.radius, 10.0 + 4.0 * 3.0);
    }

    #[test]
    fn test_cluster_policy_from_str() {
        assert_eq!("Weight".parse::<ClusterPolicy>().unwrap(), ClusterPolicy::Weight);
        assert_eq!(" count ".parse::<ClusterPolicy>().unwrap(), ClusterPolicy::Count);
        assert_eq!(ClusterPolicy::Compact.as_str(), "compact");
        assert!("bubbles".parse::<ClusterPolicy>().is_err());
    }

    #[test]
    fn test_cluster_markers_empty_input() {
        assert!(cluster_markers(&mut [], DEFAULT_CELL_DEGREES, &CountRadius::default()).is_empty());
    }

    #[test]
    fn test_cluster_markers_tags_members_and_leaves_singletons_untagged() {
        let mut markers = vec![
            marker(40.7001, -73.9001, 1),
            marker(40.8001, -73.8001, 1),
            marker(40.7003, -73.9004, 1),
            marker(40.8004, -73.8002, 1),
            marker(40.8005, -73.8003, 1),
            marker(40.9001, -73.7001, 1),
        ];
        // 舊的標記要被清掉
        markers[5].cluster = Some(7);

        let clusters = cluster_markers(&mut markers, 0.01, &CountRadius::default());

        assert_eq!(clusters.len(), 2);
        for cluster in &clusters {
            let members = markers
                .iter()
                .filter(|m| m.cluster == Some(cluster.id))
                .count();
            assert_eq!(members, cluster.count);
        }
        assert_eq!(markers[0].cluster, markers[2].cluster);
        assert_eq!(markers[1].cluster, markers[3].cluster);
        assert_eq!(markers[1].cluster, markers[4].cluster);
        assert_ne!(markers[0].cluster, markers[1].cluster);
        assert_eq!(markers[5].cluster, None);
    }
}
