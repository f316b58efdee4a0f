pub mod backends;
pub mod config;
pub mod front;
pub mod violation;

use std::path::Path;

use anyhow::{Context, Result};
use nlp_adapter::AdapterConfig;
use tracing::debug;

/// Load the configuration named by `--config`, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<AdapterConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading adapter configuration");
            AdapterConfig::load_from(path)
                .with_context(|| format!("loading configuration from {}", path.display()))
        }
        None => Ok(AdapterConfig::default()),
    }
}
