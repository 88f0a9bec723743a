//! Settings command implementation.

use anyhow::Result;

use super::{Target, build_filter, print_records};

/// Run the settings command
pub fn run(
    target: &Target,
    query: Option<&str>,
    include: &[String],
    exclude: &[String],
    limit: usize,
) -> Result<()> {
    let filter = build_filter(query, include, exclude)?;
    let process = target.open()?;
    let session = target.scanned(&process)?;

    let records = session.search(&filter);
    println!("Results: {}/{}", records.len(), session.store().len());
    println!();
    print_records(&session, &records, limit);
    Ok(())
}
