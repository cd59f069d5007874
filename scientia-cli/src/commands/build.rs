//! Build command implementation.

use super::load_config;
use anyhow::{Context, Result};
use scientia_core::SiteBuilder;
use scientia_render::render_site;
use std::path::Path;

/// Build the whole site into the configured (or given) output directory
pub fn build_site(config_path: &Path, output: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = output {
        let dir = std::env::current_dir()
            .context("Failed to read current directory")?
            .join(dir);
        config = config.with_output_dir(dir);
    }
    let output_dir = config.output_dir();

    tracing::info!("Building site: {}", config.title);
    let site = SiteBuilder::new(config).build().context("Build failed")?;

    let stats = render_site(&site, &output_dir)
        .with_context(|| format!("Failed to render site into {:?}", output_dir))?;

    println!(
        "✓ Built {} documents in {} modules",
        stats.documents, stats.modules
    );
    println!("  fingerprint {}", site.fingerprint());
    println!("  output written to {:?}", output_dir);
    Ok(())
}
