//! Heap command implementation.

use anyhow::Result;
use liveini_core::{MemoryReader, Session};

use super::{Target, parse_address};

/// Run the heap command
pub fn run(target: &Target, address: &str) -> Result<()> {
    let process = target.open()?;
    let needle = parse_address(address, process.base_address)?;
    // No image analysis needed
    let session = Session::new(MemoryReader::new(&process), target.config.clone());

    let regions = session.large_regions();
    println!("Large regions: {}", regions.len());
    for block in &regions {
        println!("  {} ({} MiB)", block.address, block.size_mib());
    }

    println!();
    let found = session.find_heap_references(needle);
    let total: usize = found.iter().map(|m| m.hits.len()).sum();
    println!("Pointers to {}: {}", needle, total);
    for matches in &found {
        for hit in &matches.hits {
            let offset = hit.value() - matches.block.address.value();
            println!("  {}  (region {} +{:X})", hit, matches.block.address, offset);
        }
    }
    Ok(())
}
