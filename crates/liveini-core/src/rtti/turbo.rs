//! Vtable reconstruction from pointer shapes
//!
//! An MSVC vtable is preceded by a pointer to its complete object locator,
//! which lives in `.rdata`, and consists of pointers into `.text`. Walking
//! `.rdata` as 8-byte cells and looking for "rdata pointer followed by code
//! pointers" finds vtable candidates without touching the live process. The
//! locator's type descriptor then names the class.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::image::{MemorySnapshot, Section, SectionTable};

use super::layout::{
    LOCATOR_TYPE_DESCRIPTOR_OFFSET, NAME_PREFIX, POINTER_SIZE, TYPE_DESCRIPTOR_NAME_OFFSET,
};
use super::{RttiEntry, normalize_name};

/// A vtable-shaped run of cells found in pass 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    /// Image offset of the locator's type descriptor field
    locator_field: u64,
    vtable_offset: u32,
    method_count: u32,
}

/// Recover `name -> (vtable offset, method count)` from the snapshot
pub fn reconstruct(snapshot: &MemorySnapshot, sections: &SectionTable) -> BTreeMap<String, RttiEntry> {
    let candidates = find_candidates(snapshot, sections);
    debug!("Vtable candidates: {}", candidates.len());

    let mut entries: BTreeMap<String, RttiEntry> = BTreeMap::new();
    for candidate in candidates {
        let Some(name) = resolve_name(snapshot, &sections.data, &candidate) else {
            continue;
        };

        let key = normalize_name(&name).to_string();
        let replace = entries
            .get(&key)
            .is_none_or(|existing| candidate.method_count > existing.method_count);
        if replace {
            entries.insert(
                key.clone(),
                RttiEntry {
                    name: key,
                    vtable_offset: candidate.vtable_offset,
                    method_count: candidate.method_count,
                },
            );
        }
    }

    info!("Vtables recovered: {}", entries.len());
    entries
}

/// Pass 1: cells whose value points into `.rdata` and whose next cell points
/// into `.text`
fn find_candidates(snapshot: &MemorySnapshot, sections: &SectionTable) -> Vec<Candidate> {
    let base = snapshot.base().value();
    let range = sections.rdata.range_in(snapshot.len());
    let cells: Vec<u64> = snapshot.bytes()[range.clone()]
        .chunks_exact(POINTER_SIZE)
        .map(|c| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(c);
            u64::from_le_bytes(raw)
        })
        .collect();

    let in_section = |value: u64, section: &Section| {
        value
            .checked_sub(base)
            .is_some_and(|offset| section.contains(offset))
    };

    let mut candidates = Vec::new();
    let mut i = 0;
    while i + 1 < cells.len() {
        let value = cells[i];
        if !in_section(value, &sections.rdata) || !in_section(cells[i + 1], &sections.code) {
            i += 1;
            continue;
        }

        let first = i + 1;
        let method_count = cells[first..]
            .iter()
            .take_while(|&&cell| in_section(cell, &sections.code))
            .count();

        candidates.push(Candidate {
            locator_field: (value - base) + LOCATOR_TYPE_DESCRIPTOR_OFFSET,
            vtable_offset: (range.start + first * POINTER_SIZE) as u32,
            method_count: method_count as u32,
        });

        i = first + method_count;
    }

    candidates
}

/// Pass 2: follow the locator to a type descriptor in `.data` and read its
/// name
fn resolve_name(snapshot: &MemorySnapshot, data: &Section, candidate: &Candidate) -> Option<String> {
    let descriptor = snapshot.u32_at(candidate.locator_field as usize)? as u64;
    if !data.contains(descriptor) {
        return None;
    }

    let name_offset = (descriptor + TYPE_DESCRIPTOR_NAME_OFFSET) as usize;
    if *snapshot.bytes().get(name_offset)? != NAME_PREFIX {
        return None;
    }

    snapshot.cstr_at(name_offset)
}
