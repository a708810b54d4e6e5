pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::surface::GeoJsonSurface;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{
    engine::IngestEngine,
    fetcher::HttpFetcher,
    filter::MapRenderer,
    pipeline::SheetPipeline,
    scheduler::{RefreshScheduler, RefreshSummary, ViewCommand},
    view::MapView,
};
pub use utils::error::{MapError, Result};
