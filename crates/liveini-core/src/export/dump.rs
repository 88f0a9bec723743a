//! Flat text dump of setting records
//!
//! Columns are separated by `||` and lines end in CRLF. Header lines start
//! with `##`.

use std::io::Write;

use chrono::Local;

use crate::error::Result;
use crate::image::ImageVersion;
use crate::setting::{GameValue, SettingRecord, ValueType};

pub const DUMP_COLUMNS: [&str; 5] = [
    "Setting",
    "DefaultValue",
    "INIValue",
    "CurrentValue",
    "Origin",
];

const PROJECT_URL: &str = "https://www.nexusmods.com/starfield/mods/976";
const DELIMITER: &str = " || ";
const EOL: &str = "\r\n";

/// Write `records` in dump format.
///
/// `stringify` renders a value for its type; string values need the live
/// process, so the caller supplies the reader through it.
pub fn write_dump<W, F>(
    writer: &mut W,
    records: &[&SettingRecord],
    version: Option<ImageVersion>,
    stringify: F,
) -> Result<()>
where
    W: Write,
    F: Fn(GameValue, ValueType) -> String,
{
    let version = version
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    write!(writer, "## Generated by LiveINI - {}{}", PROJECT_URL, EOL)?;
    write!(
        writer,
        "## Captured {}{}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        EOL
    )?;
    write!(writer, "## Starfield EXE version: {}{}", version, EOL)?;
    write!(
        writer,
        "## Double pipe characters are used as the unique delimiter{}",
        EOL
    )?;
    write!(writer, "## {}{}", DUMP_COLUMNS.join(DELIMITER), EOL)?;

    for record in records {
        let ty = record.value_type;
        let row = [
            record.name.clone(),
            stringify(record.raw.default, ty),
            stringify(record.raw.active, ty),
            stringify(record.current, ty),
            record.origin.to_string(),
        ];
        write!(writer, "{}{}", row.join(DELIMITER), EOL)?;
    }

    writer.flush()?;
    Ok(())
}
