pub mod utils;

pub mod analysis;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod field;
pub mod forecast;
pub mod models;
pub mod notifications;
pub mod pipeline;
pub mod session;
pub mod settings;

use anyhow::{Context, Result};
use clap::Parser;

pub use config::PipelineConfig;
pub use error::{FailureKind, PipelineError, PipelineResult};
pub use session::{DashboardSummary, FarmSession};

pub fn run() -> Result<()> {
    let cli = cli::Cli::parse();

    // Explicit -v/-q wins over RUST_LOG; otherwise RUST_LOG or the info default.
    let mut logger = env_logger::Builder::new();
    match cli.global.level_filter() {
        Some(level) => {
            logger.filter_level(level);
        }
        None => {
            logger.filter_level(log::LevelFilter::Info);
            logger.parse_env("RUST_LOG");
        }
    }
    logger.init();

    log::debug!("AgriGuard starting up...");

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(cli::execute(cli))
}
