//! Check command implementation.

use super::load_config;
use anyhow::{Context, Result};
use scientia_core::SiteBuilder;
use serde_json::json;
use std::path::Path;

/// Convert and validate every module, then report the fingerprint
pub fn check_site(config_path: &Path, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let site = SiteBuilder::new(config).build().context("Check failed")?;

    let store = site.store();
    let registry = site.registry();
    let links: usize = registry.backlinks().values().map(|s| s.len()).sum();
    let knowls: usize = registry.knowls().values().map(|s| s.len()).sum();

    if json {
        let report = json!({
            "fingerprint": site.fingerprint(),
            "modules": store.modules().count(),
            "documents": store.document_count(),
            "links": links,
            "knowls": knowls,
            "hashtags": registry.hashtags().len(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("✓ Site is consistent");
    for module in store.modules() {
        println!(
            "  {:<16} {} documents",
            module.namespace().as_str(),
            module.len()
        );
    }
    println!(
        "  {} links, {} knowls, {} hashtags",
        links,
        knowls,
        registry.hashtags().len()
    );
    println!("  fingerprint {}", site.fingerprint());
    Ok(())
}
