//! Set and revert command implementations.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use super::{LiveSession, Target, find_record};

/// Run the set command
pub fn run(target: &Target, name: &str, value: &str) -> Result<()> {
    let process = target.open()?;
    let mut session = target.scanned(&process)?;

    let address = find_record(&session, name)?.address;
    session
        .set_value(address, value)
        .with_context(|| format!("Failed to set {}", name))?;
    report(&session, name)
}

/// Run the revert command
pub fn revert(target: &Target, name: &str, to_default: bool) -> Result<()> {
    let process = target.open()?;
    let mut session = target.scanned(&process)?;

    let address = find_record(&session, name)?.address;
    if to_default {
        session.store_mut().revert_to_default(address)?;
    } else {
        session.store_mut().revert_to_last_ini(address)?;
    }
    session
        .apply(address)
        .with_context(|| format!("Failed to revert {}", name))?;
    report(&session, name)
}

fn report(session: &LiveSession<'_>, name: &str) -> Result<()> {
    let record = find_record(session, name)?;
    println!(
        "{} {} = {}",
        "Applied".green(),
        record.name,
        session.stringify(record.active, record.value_type)
    );
    Ok(())
}
