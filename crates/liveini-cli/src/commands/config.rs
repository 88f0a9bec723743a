//! Config command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use liveini_core::Config;

/// Run the config command
pub fn run(path: &Path, init: bool) -> Result<()> {
    if init {
        Config::default()
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Default config written to: {}", path.display());
        return Ok(());
    }

    let config = Config::load(path)?;
    println!("# {}", path.display());
    println!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to serialize config")?
    );
    Ok(())
}
