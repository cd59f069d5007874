//! CLI command implementations.

pub mod build;
pub mod check;

pub use build::build_site;
pub use check::check_site;

use anyhow::{Context, Result};
use scientia_core::Config;
use std::path::Path;

/// Load the site configuration; relative paths resolve against its directory
pub(crate) fn load_config(config_path: &Path) -> Result<Config> {
    tracing::info!("Loading config from {:?}", config_path);
    Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))
}
