pub mod crawl;
pub mod fetch;

use anyhow::{Context, Result};
use std::path::Path;

use gallwatch::config::Config;

// Re-export command functions for convenience
pub use crawl::{crawl, CrawlParams};
pub use fetch::fetch;

/// Defaults, then the optional TOML file, then `GALLWATCH_*` overrides
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
