//! A single attached target and everything recovered from it
//!
//! The session owns the memory accessor, the captured image and the tables
//! derived from it. `reset` discards all derived state; `rescan` rebuilds it
//! from a fresh capture.

use std::io::Write;

use tracing::{debug, info, warn};

use crate::address::Address;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::write_dump;
use crate::heap;
use crate::image::{self, ImageVersion, MemorySnapshot, SectionTable};
use crate::memory::{MemoryBlock, QueryRegions, ReadMemory, WriteMemory};
use crate::rtti::{MethodHit, RttiTable};
use crate::setting::{self, SettingFilter, SettingRecord, SettingStore};
use crate::signature;

/// Results of analyzing one capture of the module image
#[derive(Debug)]
pub struct Analysis {
    pub snapshot: MemorySnapshot,
    pub sections: SectionTable,
    pub version: Option<ImageVersion>,
    pub rtti: RttiTable,
}

/// References to an address found inside one large region
#[derive(Debug, Clone)]
pub struct HeapMatches {
    pub block: MemoryBlock,
    pub hits: Vec<Address>,
}

pub struct Session<M> {
    memory: M,
    config: Config,
    analysis: Option<Analysis>,
    store: SettingStore,
}

impl<M> Session<M>
where
    M: ReadMemory + WriteMemory + QueryRegions,
{
    pub fn new(memory: M, config: Config) -> Self {
        Self {
            memory,
            config,
            analysis: None,
            store: SettingStore::default(),
        }
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        self.analysis.as_ref()
    }

    pub fn store(&self) -> &SettingStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SettingStore {
        &mut self.store
    }

    fn require_analysis(&self) -> Result<&Analysis> {
        self.analysis.as_ref().ok_or(Error::NoActiveScan)
    }

    /// Drop the snapshot, section table, RTTI table and all settings
    pub fn reset(&mut self) {
        self.analysis = None;
        self.store = SettingStore::default();
    }

    /// Capture the module image and rebuild the section and RTTI tables.
    ///
    /// A capture that does not parse as a PE64 image aborts the scan and
    /// leaves the session empty.
    pub fn analyze(&mut self) -> Result<&Analysis> {
        self.reset();

        let snapshot = MemorySnapshot::capture(&self.memory)?;
        let sections = image::analyze(snapshot.bytes())?;

        let resource = &snapshot.bytes()[sections.rsrc.range_in(snapshot.len())];
        let version = image::locate_version_string(resource);
        match version {
            Some(v) => info!("EXE version: {}", v),
            None => warn!("EXE version not found"),
        }

        let rtti = RttiTable::build(&snapshot, &sections);

        Ok(&*self.analysis.insert(Analysis {
            snapshot,
            sections,
            version,
            rtti,
        }))
    }

    /// Find instances of the configured setting classes in the current
    /// analysis and replace the setting store with them
    pub fn scan_settings(&mut self) -> Result<usize> {
        let analysis = self.analysis.as_ref().ok_or(Error::NoActiveScan)?;
        let records = setting::scan_settings(
            &self.memory,
            &analysis.snapshot,
            &analysis.sections,
            &analysis.rtti,
            &self.config.classes,
        );
        self.store = SettingStore::new(records);
        info!("Settings found: {}", self.store.len());
        Ok(self.store.len())
    }

    /// Full scan: capture, analyze, then collect settings
    pub fn rescan(&mut self) -> Result<usize> {
        self.analyze()?;
        self.scan_settings()
    }

    /// Every match of `pattern` inside the code section, as live addresses
    pub fn aob_search(&self, pattern: &str) -> Result<Vec<Address>> {
        let sig = signature::compile(pattern)?;
        let analysis = self.require_analysis()?;
        let bytes = analysis.snapshot.bytes();
        let range = analysis.sections.code.range_in(bytes.len());

        let hits: Vec<Address> = signature::find_all(bytes, range.start, range.end, &sig)
            .into_iter()
            .map(|offset| analysis.snapshot.address_of(offset))
            .collect();
        info!("AOB matches for \"{}\": {}", signature::format(&sig), hits.len());
        Ok(hits)
    }

    /// Vtable slots that point at `function`
    pub fn find_methods(&self, function: Address) -> Result<Vec<MethodHit>> {
        let analysis = self.require_analysis()?;
        Ok(analysis
            .rtti
            .find_methods(&analysis.snapshot, &analysis.sections, function))
    }

    /// Large committed regions below the module base
    pub fn large_regions(&self) -> Vec<MemoryBlock> {
        heap::enumerate_large_regions(
            &self.memory,
            self.memory.base_address(),
            self.config.heap.min_region_size,
        )
    }

    /// Every aligned pointer to `target` inside the large regions.
    ///
    /// Regions without a hit are left out.
    pub fn find_heap_references(&self, target: Address) -> Vec<HeapMatches> {
        self.large_regions()
            .into_iter()
            .filter_map(|block| {
                let hits = heap::scan_region(
                    &self.memory,
                    &block,
                    target.value(),
                    self.config.heap.chunk_size,
                );
                (!hits.is_empty()).then_some(HeapMatches { block, hits })
            })
            .collect()
    }

    /// Display text for a record's value
    pub fn stringify(&self, value: setting::GameValue, ty: setting::ValueType) -> String {
        setting::stringify(value, ty, &self.memory)
    }

    /// Edit a record from operator text and write it to the live object
    pub fn set_value(&mut self, address: Address, text: &str) -> Result<()> {
        let record = self
            .store
            .get_mut(address)
            .ok_or_else(|| Error::InvalidValue(format!("no setting at {}", address)))?;
        record.set_from_text(text)?;
        self.store.apply(address, &self.memory)
    }

    pub fn apply(&mut self, address: Address) -> Result<()> {
        self.store.apply(address, &self.memory)
    }

    pub fn reset_all_changed(&mut self) -> usize {
        self.store.reset_all_changed(&self.memory)
    }

    /// Records passing `filter`, sorted by address
    pub fn search(&self, filter: &SettingFilter) -> Vec<&SettingRecord> {
        self.store.filter(filter)
    }

    /// Write the records passing `filter` in dump format
    pub fn dump<W: Write>(&self, writer: &mut W, filter: &SettingFilter) -> Result<usize> {
        let version = self.analysis.as_ref().and_then(|a| a.version);
        let records = self.store.filter(filter);
        write_dump(writer, &records, version, |value, ty| self.stringify(value, ty))?;
        debug!("Dumped {} settings", records.len());
        Ok(records.len())
    }
}
