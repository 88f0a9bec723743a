use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::address::Address;
use crate::error::{Error, Result};
use crate::memory::layout::setting;
use crate::memory::{ReadMemory, WriteMemory};

use super::filter::SettingFilter;
use super::record::{RawSetting, SettingRecord};

/// Settings recovered by the last scan, editable and writable back to the
/// live process
#[derive(Debug, Default)]
pub struct SettingStore {
    records: Vec<SettingRecord>,
    by_address: HashMap<Address, usize>,
}

impl SettingStore {
    /// Take ownership of scanned records. A repeated address keeps its
    /// first record.
    pub fn new(records: Vec<SettingRecord>) -> Self {
        let mut store = Self::default();
        for record in records {
            if store.by_address.contains_key(&record.address) {
                debug!("  Duplicate setting at {}, keeping first", record.address);
                continue;
            }
            store.by_address.insert(record.address, store.records.len());
            store.records.push(record);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SettingRecord] {
        &self.records
    }

    pub fn get(&self, address: Address) -> Option<&SettingRecord> {
        self.by_address.get(&address).and_then(|&i| self.records.get(i))
    }

    pub fn get_mut(&mut self, address: Address) -> Option<&mut SettingRecord> {
        let index = *self.by_address.get(&address)?;
        self.records.get_mut(index)
    }

    /// Look a record up by its exact name, ignoring case
    pub fn find_by_name(&self, name: &str) -> Option<&SettingRecord> {
        let key = name.to_lowercase();
        self.records.iter().find(|r| r.search_key == key)
    }

    /// Records passing `filter`, sorted by address
    pub fn filter(&self, filter: &SettingFilter) -> Vec<&SettingRecord> {
        let mut matches: Vec<&SettingRecord> =
            self.records.iter().filter(|r| filter.matches(r)).collect();
        matches.sort_by_key(|r| r.address);
        matches
    }

    fn record_mut(&mut self, address: Address) -> Result<&mut SettingRecord> {
        self.get_mut(address)
            .ok_or_else(|| Error::InvalidValue(format!("no setting at {}", address)))
    }

    /// Write the record's editable value to the live object
    pub fn apply<M: ReadMemory + WriteMemory>(&mut self, address: Address, memory: &M) -> Result<()> {
        let record = self.record_mut(address)?;
        apply_record(record, memory)
    }

    pub fn revert_to_default(&mut self, address: Address) -> Result<()> {
        self.record_mut(address)?.revert_to_default();
        Ok(())
    }

    pub fn revert_to_last_ini(&mut self, address: Address) -> Result<()> {
        self.record_mut(address)?.revert_to_last_ini();
        Ok(())
    }

    /// Restore every changed record to its scanned value and write it back.
    ///
    /// The changed flag is cleared whether or not the write succeeds. Returns
    /// the number of records written.
    pub fn reset_all_changed<M: ReadMemory + WriteMemory>(&mut self, memory: &M) -> usize {
        let mut restored = 0;
        for record in self.records.iter_mut().filter(|r| r.changed) {
            record.revert_to_last_ini();
            match apply_record(record, memory) {
                Ok(()) => restored += 1,
                Err(e) => warn!("Reset of {} failed: {}", record.name, e),
            }
            record.changed = false;
        }
        info!("Reset {} changed settings", restored);
        restored
    }
}

/// Re-read the live object and write the active value only if the object
/// still has the vtable, name pointer and default value seen at scan time
pub fn apply_record<M: ReadMemory + WriteMemory>(record: &mut SettingRecord, memory: &M) -> Result<()> {
    let address = record.address.value();
    debug!("-> {}", record.name);

    let bytes = memory.read_bytes(address, setting::SIZE)?;
    let live = RawSetting::from_bytes(&bytes)
        .ok_or_else(|| Error::read_failed(address, "short setting read"))?;

    let mismatch = if live.vtable != record.raw.vtable {
        Some("vtable")
    } else if live.name != record.raw.name {
        Some("name")
    } else if live.default != record.raw.default {
        Some("default")
    } else {
        None
    };
    if let Some(field) = mismatch {
        warn!("{}: {} mismatch, not writing", record.name, field);
        return Err(Error::StaleSetting { address, field });
    }

    memory.write_u64(address + setting::ACTIVE, record.current.raw())?;
    record.active = record.current;
    record.changed = record.current != record.raw.active;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemory;
    use crate::setting::filter::SettingProperties;
    use crate::setting::value::{GameValue, OriginTag};

    const ADDR: u64 = 0x1_4000_3000;
    const VTABLE: u64 = 0x1_4000_2408;
    const NAME: u64 = 0x9000;

    fn setup() -> (MockMemory, SettingStore) {
        let active = GameValue(0).with_float(90.0);
        let default = GameValue(0).with_float(70.0);
        let mem = MockMemory::builder()
            .bytes(ADDR, &[0u8; 0x40])
            .u64(ADDR, VTABLE)
            .u64(ADDR + 8, active.raw())
            .u64(ADDR + 16, default.raw())
            .u64(ADDR + 24, NAME)
            .cstring(NAME, "fFOV:Camera")
            .build();

        let raw = RawSetting {
            vtable: VTABLE,
            active,
            default,
            name: NAME,
        };
        let record = SettingRecord::new(
            Address::new(ADDR),
            raw,
            "fFOV:Camera".to_string(),
            OriginTag::Ini,
        );
        (mem, SettingStore::new(vec![record]))
    }

    #[test]
    fn test_apply_writes_active_field_only() {
        let (mem, mut store) = setup();
        let addr = Address::new(ADDR);

        store.get_mut(addr).unwrap().set_from_text("110").unwrap();
        store.apply(addr, &mem).unwrap();

        let writes = mem.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, ADDR + 8);
        assert_eq!(writes[0].1.len(), 8);
        assert_eq!(GameValue(mem.read_u64(ADDR + 8).unwrap()).as_float(), 110.0);

        let record = store.get(addr).unwrap();
        assert_eq!(record.active.as_float(), 110.0);
        assert!(record.changed);
    }

    #[test]
    fn test_apply_rejects_stale_object_without_writing() {
        for (offset, field) in [(0u64, "vtable"), (24, "name"), (16, "default")] {
            let (mem, mut store) = setup();
            let addr = Address::new(ADDR);
            mem.poke_u64(ADDR + offset, 0x1234);

            store.get_mut(addr).unwrap().set_from_text("110").unwrap();
            let err = store.apply(addr, &mem).unwrap_err();
            assert!(err.is_stale());
            assert!(matches!(err, Error::StaleSetting { field: f, .. } if f == field));
            assert_eq!(mem.write_count(), 0);
            assert_eq!(store.get(addr).unwrap().active.as_float(), 90.0);
        }
    }

    #[test]
    fn test_apply_reports_write_failure() {
        let (mem, mut store) = setup();
        let addr = Address::new(ADDR);
        mem.set_read_only(true);
        store.get_mut(addr).unwrap().set_from_text("110").unwrap();

        let err = store.apply(addr, &mem).unwrap_err();
        assert!(matches!(err, Error::MemoryWriteFailed { .. }));
        assert!(!store.get(addr).unwrap().changed);
    }

    #[test]
    fn test_revert_then_apply_clears_changed() {
        let (mem, mut store) = setup();
        let addr = Address::new(ADDR);

        store.revert_to_default(addr).unwrap();
        store.apply(addr, &mem).unwrap();
        assert!(store.get(addr).unwrap().changed);

        store.revert_to_last_ini(addr).unwrap();
        store.apply(addr, &mem).unwrap();
        assert!(!store.get(addr).unwrap().changed);
        assert_eq!(GameValue(mem.read_u64(ADDR + 8).unwrap()).as_float(), 90.0);
    }

    #[test]
    fn test_reset_all_changed_is_best_effort() {
        let (mem, mut store) = setup();
        let addr = Address::new(ADDR);
        store.get_mut(addr).unwrap().set_from_text("120").unwrap();
        store.apply(addr, &mem).unwrap();

        // Object moved: the reset write is rejected but the flag still clears
        mem.poke_u64(ADDR, 0);
        assert_eq!(store.reset_all_changed(&mem), 0);
        let record = store.get(addr).unwrap();
        assert!(!record.changed);
        assert_eq!(record.current.as_float(), 90.0);
        assert_eq!(mem.write_count(), 1);
    }

    #[test]
    fn test_filter_sorted_by_address() {
        let make = |addr: u64, name: &str| {
            SettingRecord::new(
                Address::new(addr),
                RawSetting::default(),
                name.to_string(),
                OriginTag::Ini,
            )
        };
        let store = SettingStore::new(vec![
            make(0x3000, "fB"),
            make(0x1000, "fA"),
            make(0x2000, "bC"),
            make(0x1000, "fDuplicate"),
        ]);
        assert_eq!(store.len(), 3);

        let floats = store.filter(&SettingFilter::new("").include(SettingProperties::TYPE_FLOAT));
        let addrs: Vec<u64> = floats.iter().map(|r| r.address.value()).collect();
        assert_eq!(addrs, vec![0x1000, 0x3000]);
        assert_eq!(store.find_by_name("FB").unwrap().address.value(), 0x3000);
    }
}
