//! Dump command implementation.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::{Target, build_filter};

/// Run the dump command
pub fn run(
    target: &Target,
    query: Option<&str>,
    output: Option<PathBuf>,
    include: &[String],
    exclude: &[String],
) -> Result<()> {
    let filter = build_filter(query, include, exclude)?;
    let process = target.open()?;
    let session = target.scanned(&process)?;

    let path = output.unwrap_or_else(|| PathBuf::from(&target.config.dump.path));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let count = session.dump(&mut writer, &filter)?;

    println!("{} settings saved to: {}", count, path.display());
    Ok(())
}
