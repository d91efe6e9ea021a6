pub mod cli;
pub mod releases;

use crate::domain::model::ReleaseSource;
use crate::domain::ports::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};

#[cfg(feature = "cli")]
use clap::Parser;

/// Command-line surface of the snapshot stage.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "win-cpu-etl")]
#[command(about = "Fetch Windows supported-CPU tables and persist per-release snapshots")]
pub struct CliConfig {
    /// Release-list TOML file; the built-in Microsoft list is used when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    /// Snapshot output directory (overrides the config file)
    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long, default_value = "5")]
    pub concurrent_requests: usize,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Log CPU/memory usage per pipeline phase
    #[arg(long)]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.output_path {
            validation::validate_path("output_path", path)?;
        }
        validation::validate_positive_number("concurrent_requests", self.concurrent_requests, 1)?;
        Ok(())
    }
}

/// Fully resolved configuration handed to the snapshot pipeline: the release
/// list (chronological) plus the knobs merged from CLI and config file.
#[derive(Debug, Clone)]
pub struct RunConfig {
    releases: Vec<ReleaseSource>,
    output_path: String,
    concurrent_requests: usize,
}

impl RunConfig {
    pub fn new(
        releases: Vec<ReleaseSource>,
        output_path: String,
        concurrent_requests: usize,
    ) -> Self {
        Self {
            releases,
            output_path,
            concurrent_requests,
        }
    }
}

impl ConfigProvider for RunConfig {
    fn releases(&self) -> &[ReleaseSource] {
        &self.releases
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }
}
