use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use nlp_adapter::AdapterConfig;
use tracing::info;

/// Write the default configuration to `out`, or to stdout.
pub fn handle_init(out: Option<&Path>) -> Result<()> {
    let config = AdapterConfig::default();
    match out {
        Some(path) => {
            config
                .save_to(path)
                .with_context(|| format!("writing configuration to {}", path.display()))?;
            info!(path = %path.display(), "wrote default configuration");
        }
        None => {
            let text = config.to_toml_string().context("rendering configuration")?;
            io::stdout().write_all(text.as_bytes())?;
        }
    }
    Ok(())
}
