pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, RunConfig};

pub use app::pipelines::snapshot_pipeline::SnapshotPipeline;
pub use app::pipelines::unsupported_pipeline::UnsupportedPipeline;
pub use crate::core::{engine::DiscontinuationEngine, etl::EtlEngine};
pub use utils::error::{EtlError, Result};
