use tracing::{debug, info, warn};

use crate::address::Address;
use crate::config::KnownClass;
use crate::image::{MemorySnapshot, SectionTable};
use crate::memory::ReadMemory;
use crate::memory::layout::setting;
use crate::rtti::RttiTable;

use super::record::{RawSetting, SettingRecord};
use super::value::OriginTag;

/// Resolve each known class to its vtable and collect every instance from
/// the snapshot, in class order.
///
/// Classes without a recovered vtable are skipped.
pub fn scan_settings<R: ReadMemory>(
    reader: &R,
    snapshot: &MemorySnapshot,
    sections: &SectionTable,
    rtti: &RttiTable,
    classes: &[KnownClass],
) -> Vec<SettingRecord> {
    let start = sections.rdata.offset as usize;
    let mut records = Vec::new();

    for class in classes {
        let Some(vtable) = rtti.find_vtable(&class.name) else {
            warn!("No vtable recovered for {}", class.name);
            continue;
        };

        let found = scan_instances(reader, snapshot, start, vtable, class.origin);
        info!("{}: {} settings", class.origin, found.len());
        records.extend(found);
    }

    records
}

/// Every 8-byte aligned cell from `start` on that holds `vtable`, decoded as
/// a setting object.
///
/// Names are read from the live process; a record whose name cannot be read
/// is dropped. After a hit the scan resumes past the whole object.
pub fn scan_instances<R: ReadMemory>(
    reader: &R,
    snapshot: &MemorySnapshot,
    start: usize,
    vtable: Address,
    origin: OriginTag,
) -> Vec<SettingRecord> {
    let mut records = Vec::new();
    let mut cursor = start;

    while let Some(offset) = snapshot.find_u64(cursor, vtable.value()) {
        cursor = offset + setting::SIZE;

        let Some(raw) = snapshot
            .bytes()
            .get(offset..offset + setting::SIZE)
            .and_then(RawSetting::from_bytes)
        else {
            break;
        };

        let address = snapshot.address_of(offset);
        let name = match reader.read_cstring(raw.name, setting::NAME_READ_LEN) {
            Ok(name) => name,
            Err(e) => {
                debug!("  Skipping {}: {}", address, e);
                continue;
            }
        };

        records.push(SettingRecord::new(address, raw, name, origin));
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Section;
    use crate::image::testing::put_u64;
    use crate::memory::MockMemory;
    use crate::rtti::RttiEntry;
    use crate::setting::value::ValueType;

    const BASE: u64 = 0x1_4000_0000;
    const VTABLE: u64 = BASE + 0x2408;

    fn plant_setting(image: &mut [u8], offset: usize, active: u64, default: u64, name: u64) {
        put_u64(image, offset, VTABLE);
        put_u64(image, offset + 8, active);
        put_u64(image, offset + 16, default);
        put_u64(image, offset + 24, name);
    }

    #[test]
    fn test_scan_two_instances() {
        let mut image = vec![0u8; 0x4000];
        plant_setting(&mut image, 0x3000, 1, 0, 0x9000);
        plant_setting(&mut image, 0x3040, 0x42B4_0000, 0x428C_0000, 0x9400);
        let snapshot = MemorySnapshot::from_bytes(Address::new(BASE), image);

        let mem = MockMemory::builder()
            .cstring(0x9000, "bShowHud:Interface")
            .cstring(0x9400, "fFOV:Camera")
            .build();

        let records = scan_instances(&mem, &snapshot, 0x2000, Address::new(VTABLE), OriginTag::Ini);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].address, Address::new(BASE + 0x3000));
        assert_eq!(records[0].value_type, ValueType::Bool);
        assert_eq!(records[1].address, Address::new(BASE + 0x3040));
        assert_eq!(records[1].value_type, ValueType::Float);
        assert_eq!(records[1].current.as_float(), 90.0);
        assert_eq!(records[1].origin, OriginTag::Ini);
    }

    #[test]
    fn test_scan_skips_unreadable_names() {
        let mut image = vec![0u8; 0x4000];
        plant_setting(&mut image, 0x3000, 1, 0, 0xDEAD_0000);
        plant_setting(&mut image, 0x3020, 1, 0, 0x9000);
        let snapshot = MemorySnapshot::from_bytes(Address::new(BASE), image);
        let mem = MockMemory::builder().cstring(0x9000, "iCount").build();

        let records = scan_instances(&mem, &snapshot, 0, Address::new(VTABLE), OriginTag::GameSetting);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "iCount");
    }

    #[test]
    fn test_scan_resumes_past_object() {
        // A second vtable value inside the first object is not a new record
        let mut image = vec![0u8; 0x4000];
        plant_setting(&mut image, 0x3000, VTABLE, VTABLE, 0x9000);
        let snapshot = MemorySnapshot::from_bytes(Address::new(BASE), image);
        let mem = MockMemory::builder().cstring(0x9000, "uMask").build();

        let records = scan_instances(&mem, &snapshot, 0, Address::new(VTABLE), OriginTag::Ini);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_scan_settings_by_class() {
        let mut image = vec![0u8; 0x4000];
        plant_setting(&mut image, 0x3000, 1, 0, 0x9000);
        let snapshot = MemorySnapshot::from_bytes(Address::new(BASE), image);
        let sections = SectionTable {
            rdata: Section::new(0x2000, 0x1000),
            ..Default::default()
        };
        let rtti = RttiTable::from_entries(
            Address::new(BASE),
            [RttiEntry {
                name: "?AV?$SettingT@VGameSettingCollection@@@@".to_string(),
                vtable_offset: 0x2408,
                method_count: 4,
            }],
        );
        let classes = vec![
            KnownClass::new(".?AVMissing@@", OriginTag::Ini),
            KnownClass::new(".?AV?$SettingT@VGameSettingCollection@@@@", OriginTag::GameSetting),
        ];
        let mem = MockMemory::builder().cstring(0x9000, "bFlag").build();

        let records = scan_settings(&mem, &snapshot, &sections, &rtti, &classes);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].origin, OriginTag::GameSetting);
    }
}
