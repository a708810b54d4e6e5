pub mod cluster;
pub mod engine;
pub mod fetcher;
pub mod filter;
pub mod parser;
pub mod pipeline;
pub mod presentation;
pub mod scheduler;
pub mod view;

pub use crate::domain::model::{
    ActivityRecord, AgentCount, ClusterIcon, ClusterPolicy, MapMarker, MapSnapshot, MarkerCluster, RawRow,
    TimeFilter,
};
pub use crate::domain::ports::{ConfigProvider, DisplaySurface, Fetcher, Pipeline, Storage};
pub use crate::utils::error::Result;
