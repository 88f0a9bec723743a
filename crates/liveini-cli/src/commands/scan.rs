//! Scan command implementation.

use anyhow::Result;
use liveini_core::{OriginTag, SettingFilter, SettingProperties};

use super::Target;

/// Run the scan command
pub fn run(target: &Target) -> Result<()> {
    let process = target.open()?;
    let session = target.scanned(&process)?;

    let Some(analysis) = session.analysis() else {
        return Ok(());
    };

    println!();
    println!("=== Sections ===");
    println!("  .text   {}", analysis.sections.code);
    println!("  .rdata  {}", analysis.sections.rdata);
    println!("  .data   {}", analysis.sections.data);
    println!("  .rsrc   {}", analysis.sections.rsrc);

    println!();
    match analysis.version {
        Some(version) => println!("EXE version: {}", version),
        None => println!("EXE version: unknown"),
    }
    println!("RTTI names harvested: {}", analysis.rtti.harvested_count());
    println!("Vtables recovered: {}", analysis.rtti.len());

    println!();
    println!("=== Settings ({}) ===", session.store().len());
    for origin in [OriginTag::Ini, OriginTag::IniPref, OriginTag::GameSetting] {
        let filter = SettingFilter::default().include(SettingProperties::from_origin(origin));
        println!("  {:<12} {}", origin.as_str(), session.search(&filter).len());
    }

    Ok(())
}
