//! RTTI command implementation.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use liveini_core::{Address, write_rtti_json};

use super::Target;

/// Run the rtti command
pub fn run(target: &Target, query: Option<&str>, json: Option<&Path>, limit: usize) -> Result<()> {
    let process = target.open()?;
    let session = target.scanned(&process)?;
    let Some(analysis) = session.analysis() else {
        return Ok(());
    };

    let base = process.base_address;
    let entries = analysis.rtti.search(query.unwrap_or(""));
    println!("Results: {}/{}", entries.len(), analysis.rtti.len());
    println!();

    for entry in entries.iter().take(limit) {
        println!(
            "  0x{:X}  {:>4} methods  {}",
            base + entry.vtable_offset as u64,
            entry.method_count,
            entry.name
        );
    }
    if entries.len() > limit {
        println!("  ... and {} more", entries.len() - limit);
    }

    if let Some(path) = json {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_rtti_json(&mut BufWriter::new(file), &entries, Address::new(base))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!();
        println!("RTTI table saved to: {}", path.display());
    }

    Ok(())
}
