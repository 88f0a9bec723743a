//! JSON export of recovered RTTI classes

use std::io::Write;

use serde::Serialize;

use crate::address::Address;
use crate::error::Result;
use crate::rtti::RttiEntry;

#[derive(Serialize)]
struct RttiExport<'a> {
    base_address: Address,
    #[serde(flatten)]
    entry: &'a RttiEntry,
    vtable_address: Address,
}

/// Write `entries` as a pretty-printed JSON array, each entry carrying the
/// module base and the absolute vtable address
pub fn write_rtti_json<W: Write>(
    writer: &mut W,
    entries: &[&RttiEntry],
    base: Address,
) -> Result<()> {
    let export: Vec<RttiExport> = entries
        .iter()
        .filter_map(|&entry| {
            let vtable_address = Address::from_image_offset(base, entry.vtable_offset as u64)?;
            Some(RttiExport {
                base_address: base,
                entry,
                vtable_address,
            })
        })
        .collect();

    serde_json::to_writer_pretty(&mut *writer, &export)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtti_json_fields() {
        let entry = RttiEntry {
            name: "?AVFoo@@".to_string(),
            vtable_offset: 0x2408,
            method_count: 5,
        };

        let mut out = Vec::new();
        write_rtti_json(&mut out, &[&entry], Address::new(0x1_4000_0000)).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let first = &value[0];
        assert_eq!(first["name"], "?AVFoo@@");
        assert_eq!(first["method_count"], 5);
        assert_eq!(first["vtable_offset"], 0x2408);
        assert_eq!(first["base_address"], 0x1_4000_0000u64);
        assert_eq!(first["vtable_address"], 0x1_4000_2408u64);
    }

    #[test]
    fn test_rtti_json_write_failure_is_reported() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let entry = RttiEntry {
            name: "?AVFoo@@".to_string(),
            vtable_offset: 0x10,
            method_count: 1,
        };
        let err = write_rtti_json(&mut Broken, &[&entry], Address::new(0x1000)).unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));
    }
}
