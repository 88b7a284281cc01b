use anyhow::{Context, Result};

use gallwatch::config::Config;
use gallwatch::crawler::{fetch_once_with, PostExtractor};
use gallwatch::render::{CancelToken, HttpRenderer};

pub async fn fetch(config: Config, url: String) -> Result<()> {
    let renderer = HttpRenderer::new(&config).context("Failed to create HTTP renderer")?;
    let extractor = PostExtractor::new(&config.selectors, config.navigation_timeout())
        .context("Invalid post selectors")?;

    let response = fetch_once_with(renderer, &extractor, &url, &CancelToken::never()).await;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.is_success() {
        tracing::warn!(url = %url, status = response.status_code, "Fetch returned an error payload");
    }
    Ok(())
}
