use std::collections::BTreeMap;

use tracing::info;

use crate::image::{MemorySnapshot, SectionTable};

use super::layout::{CLASS_NAME_MARKER, NAME_ALIGN};
use super::normalize_name;

/// Collect every `.?AV` class name from the start of `.rdata` to the end of
/// the image, mapped to the image offset where the name starts.
///
/// The scan steps in 4-byte cells and skips each name rounded up to the next
/// multiple of four.
pub fn harvest_names(snapshot: &MemorySnapshot, sections: &SectionTable) -> BTreeMap<String, u32> {
    let marker = u32::from_le_bytes(*CLASS_NAME_MARKER);
    let mut names = BTreeMap::new();
    let mut cursor = sections.rdata.offset as usize;

    while let Some(pos) = snapshot.find_u32(cursor, marker) {
        let Some(name) = snapshot.cstr_at(pos) else {
            break;
        };

        let len = name.len().next_multiple_of(NAME_ALIGN);
        names.insert(normalize_name(&name).to_string(), pos as u32);
        cursor = pos + len;
    }

    info!("RTTI names found: {}", names.len());
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::image::Section;
    use crate::image::testing::put_bytes;

    fn table(rdata: Section) -> SectionTable {
        SectionTable {
            rdata,
            ..Default::default()
        }
    }

    #[test]
    fn test_harvest_padded_name() {
        let mut data = vec![0u8; 0x200];
        put_bytes(&mut data, 0x110, b".?AVFoo@@\0\0\0");
        put_bytes(&mut data, 0x11C, b".?AVBarBaz@@\0\0\0\0");
        let snapshot = MemorySnapshot::from_bytes(Address::new(0x1000), data);

        let names = harvest_names(&snapshot, &table(Section::new(0x100, 0x100)));
        assert_eq!(names.get("?AVFoo@@"), Some(&0x110));
        assert_eq!(names.get("?AVBarBaz@@"), Some(&0x11C));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_harvest_ignores_unaligned_and_earlier_names() {
        let mut data = vec![0u8; 0x200];
        put_bytes(&mut data, 0x20, b".?AVEarly@@\0");
        put_bytes(&mut data, 0x121, b".?AVOdd@@\0");
        let snapshot = MemorySnapshot::from_bytes(Address::new(0x1000), data);

        let names = harvest_names(&snapshot, &table(Section::new(0x100, 0x100)));
        assert!(names.is_empty());
    }

    #[test]
    fn test_harvest_continues_past_rdata() {
        let mut data = vec![0u8; 0x300];
        put_bytes(&mut data, 0x240, b".?AVInData@@\0");
        let snapshot = MemorySnapshot::from_bytes(Address::new(0x1000), data);

        let names = harvest_names(&snapshot, &table(Section::new(0x100, 0x100)));
        assert_eq!(names.get("?AVInData@@"), Some(&0x240));
    }
}
