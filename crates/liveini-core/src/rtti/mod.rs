//! RTTI recovery
//!
//! Two independent passes over the captured image: harvesting decorated
//! class names, and reconstructing vtables from pointer shapes. Names are
//! keyed without their leading `.`, so `.?AVFoo@@` and `?AVFoo@@` look up
//! the same entry.

mod harvest;
pub mod layout;
mod turbo;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::address::Address;
use crate::image::{MemorySnapshot, SectionTable};
use crate::query::TextQuery;

pub use harvest::harvest_names;
pub use turbo::reconstruct;

/// Strip the leading `.` of a decorated name
pub fn normalize_name(name: &str) -> &str {
    name.strip_prefix('.').unwrap_or(name)
}

/// A recovered class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RttiEntry {
    pub name: String,
    /// Image offset of the first method slot
    pub vtable_offset: u32,
    pub method_count: u32,
}

/// A vtable slot that points at a given function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodHit {
    pub class: String,
    pub index: u32,
    pub method_count: u32,
    /// Image offset of the slot itself
    pub slot_offset: u32,
}

/// Name table built once per scan
#[derive(Debug, Clone, Default)]
pub struct RttiTable {
    entries: BTreeMap<String, RttiEntry>,
    name_offsets: BTreeMap<String, u32>,
    base: Address,
}

impl RttiTable {
    /// Run both recovery passes over the snapshot
    pub fn build(snapshot: &MemorySnapshot, sections: &SectionTable) -> Self {
        Self {
            name_offsets: harvest_names(snapshot, sections),
            entries: reconstruct(snapshot, sections),
            base: snapshot.base(),
        }
    }

    pub fn from_entries(base: Address, entries: impl IntoIterator<Item = RttiEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (normalize_name(&e.name).to_string(), e))
                .collect(),
            name_offsets: BTreeMap::new(),
            base,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RttiEntry> {
        self.entries.get(normalize_name(name))
    }

    /// Entries sorted by name
    pub fn entries(&self) -> impl Iterator<Item = &RttiEntry> {
        self.entries.values()
    }

    /// Image offset of a harvested name string
    pub fn name_offset(&self, name: &str) -> Option<u32> {
        self.name_offsets.get(normalize_name(name)).copied()
    }

    pub fn harvested_count(&self) -> usize {
        self.name_offsets.len()
    }

    /// Live address of the vtable recovered for `name`
    pub fn find_vtable(&self, name: &str) -> Option<Address> {
        let entry = self.get(name)?;
        let vtable = Address::from_image_offset(self.base, entry.vtable_offset as u64)?;
        debug!("  {}: vtable {} ({} methods)", name, vtable, entry.method_count);
        Some(vtable)
    }

    /// Every recovered vtable slot holding `function`.
    ///
    /// Only addresses inside the code section are looked up. The bound is
    /// half-open, matching how method runs were collected, so the first byte
    /// past `.text` is rejected.
    pub fn find_methods(
        &self,
        snapshot: &MemorySnapshot,
        sections: &SectionTable,
        function: Address,
    ) -> Vec<MethodHit> {
        let in_code = function
            .offset_from(snapshot.base())
            .is_some_and(|offset| sections.code.contains(offset));
        if !in_code {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for entry in self.entries.values() {
            for index in 0..entry.method_count {
                let slot = entry.vtable_offset + index * layout::POINTER_SIZE as u32;
                if snapshot.u64_at(slot as usize) == Some(function.value()) {
                    hits.push(MethodHit {
                        class: entry.name.clone(),
                        index,
                        method_count: entry.method_count,
                        slot_offset: slot,
                    });
                }
            }
        }
        hits
    }

    /// Entries whose lower-cased name matches `query`, sorted by name
    pub fn search(&self, query: &str) -> Vec<&RttiEntry> {
        let query = TextQuery::new(query);
        self.entries
            .values()
            .filter(|e| query.matches(&e.name.to_lowercase()))
            .collect()
    }
}
