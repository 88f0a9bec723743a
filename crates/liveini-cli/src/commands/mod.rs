//! CLI command implementations.
//!
//! Each subcommand attaches, runs one analysis and reports. `shell` keeps
//! the session open instead.

pub mod aob;
pub mod config;
pub mod dump;
pub mod heap;
pub mod method;
pub mod rtti;
pub mod scan;
pub mod set;
pub mod settings;
pub mod shell;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use liveini_core::{
    Address, Config, MemoryReader, ProcessHandle, Session, SettingFilter, SettingProperties,
    SettingRecord,
};
use owo_colors::OwoColorize;

pub type LiveSession<'a> = Session<MemoryReader<'a>>;

/// Which process to attach to and how to analyze it
pub struct Target {
    pub pid: Option<u32>,
    pub config: Config,
}

impl Target {
    pub fn open(&self) -> Result<ProcessHandle> {
        let process = match self.pid {
            Some(pid) => ProcessHandle::open(pid)?,
            None => ProcessHandle::find(&self.config.target).with_context(|| {
                format!(
                    "{} is not running (also tried window \"{}\")",
                    self.config.target.exe_name, self.config.target.window_title
                )
            })?,
        };

        println!(
            "Found process (PID: {}, Base: 0x{:X}, Size: 0x{:X})",
            process.pid, process.base_address, process.module_size
        );
        Ok(process)
    }

    /// A session over `process` with settings already scanned
    pub fn scanned<'a>(&self, process: &'a ProcessHandle) -> Result<LiveSession<'a>> {
        let mut session = Session::new(MemoryReader::new(process), self.config.clone());
        session.rescan().context("Scan failed")?;
        Ok(session)
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Failed to determine config directory")?;
    Ok(config_dir.join("liveini").join("config.toml"))
}

/// Parse `0x1234`, `1234` (hex) or `<exe>+<offset>` relative to `base`
pub fn parse_address(text: &str, base: u64) -> Result<Address> {
    let text = text.trim();
    if let Some((_, offset)) = text.split_once('+') {
        let offset = parse_hex(offset)?;
        return Address::new(base)
            .checked_add(offset)
            .ok_or_else(|| anyhow!("Address overflows: {}", text));
    }
    Ok(Address::new(parse_hex(text)?))
}

fn parse_hex(text: &str) -> Result<u64> {
    let digits = text
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u64::from_str_radix(digits, 16).with_context(|| format!("Invalid hex number: {}", text))
}

pub fn parse_properties(names: &[String]) -> Result<SettingProperties> {
    let mut props = SettingProperties::empty();
    for name in names {
        match SettingProperties::parse_name(name.trim()) {
            Some(p) => props |= p,
            None => bail!("Unknown property: {}", name),
        }
    }
    Ok(props)
}

pub fn build_filter(
    query: Option<&str>,
    include: &[String],
    exclude: &[String],
) -> Result<SettingFilter> {
    let mut filter = SettingFilter::new(query.unwrap_or(""));
    if !include.is_empty() {
        filter = filter.include(parse_properties(include)?);
    }
    filter = filter.exclude(parse_properties(exclude)?);
    Ok(filter)
}

/// Print records as an aligned table
pub fn print_records(session: &LiveSession<'_>, records: &[&SettingRecord], limit: usize) {
    let base = Address::new(session.memory().process().base_address);
    for record in records.iter().take(limit) {
        let value = session.stringify(record.current, record.value_type);
        let offset = record
            .image_offset(base)
            .map(|o| format!("+{:X}", o))
            .unwrap_or_else(|| record.address.to_string());
        let marker = if record.changed {
            "*".yellow().to_string()
        } else {
            " ".to_string()
        };

        println!(
            "{}{:>10}  {:<9} {:<11} {:<48} {}",
            marker,
            offset,
            record.value_type.as_str(),
            record.origin.as_str(),
            record.name,
            value.green()
        );
    }

    if records.len() > limit {
        println!("... and {} more", records.len() - limit);
    }
}

/// Find exactly one record by name
pub fn find_record<'s>(session: &'s LiveSession<'_>, name: &str) -> Result<&'s SettingRecord> {
    session
        .store()
        .find_by_name(name)
        .with_context(|| format!("No setting named {}", name))
}
