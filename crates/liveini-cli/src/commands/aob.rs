//! AOB command implementation.

use anyhow::Result;

use super::Target;

/// Run the aob command
pub fn run(target: &Target, pattern: &str) -> Result<()> {
    // Reject a malformed pattern before attaching
    liveini_core::signature::compile(pattern)?;

    let process = target.open()?;
    let session = target.scanned(&process)?;
    let hits = session.aob_search(pattern)?;

    let exe = &target.config.target.exe_name;
    println!("Matches: {}", hits.len());
    for hit in &hits {
        let offset = hit.value() - process.base_address;
        println!("  {}+{:X}  ({})", exe, offset, hit);
    }
    Ok(())
}
