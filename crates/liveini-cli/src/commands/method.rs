//! Method command implementation.

use anyhow::Result;

use super::{Target, parse_address};

/// Run the method command
pub fn run(target: &Target, address: &str) -> Result<()> {
    let process = target.open()?;
    let session = target.scanned(&process)?;
    let function = parse_address(address, process.base_address)?;

    let hits = session.find_methods(function)?;
    if hits.is_empty() {
        println!("No vtable slot points at {}", function);
        return Ok(());
    }

    println!("Vtable slots pointing at {}:", function);
    for hit in &hits {
        println!(
            "  {} [{}/{}]  slot +{:X}",
            hit.class, hit.index, hit.method_count, hit.slot_offset
        );
    }
    Ok(())
}
