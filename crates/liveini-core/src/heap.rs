//! Reverse pointer search over large heap regions
//!
//! Independent of the RTTI machinery: given any address, find every aligned
//! pointer to it inside the big committed regions below the module.

use tracing::{debug, info};

use crate::address::Address;
use crate::memory::layout::heap;
use crate::memory::{MemoryBlock, QueryRegions, ReadMemory};

/// Walk the address space from 0 and keep committed, readable regions of at
/// least `min_size` bytes whose base is at or below `ceiling`
pub fn enumerate_large_regions<Q: QueryRegions>(
    query: &Q,
    ceiling: u64,
    min_size: u64,
) -> Vec<MemoryBlock> {
    let mut blocks = Vec::new();
    let mut address = 0u64;

    while address < heap::USER_ADDRESS_LIMIT {
        let Some(region) = query.query_region(address) else {
            break;
        };
        if region.size == 0 {
            break;
        }

        if region.is_scannable() && region.size >= min_size && region.base <= ceiling {
            debug!(
                "  Heap: 0x{:X}, {} MiB",
                region.base,
                region.size / (1024 * 1024)
            );
            blocks.push(MemoryBlock::from(region));
        }

        match region.end() {
            next if next > address => address = next,
            _ => break,
        }
    }

    info!("Large regions found: {}", blocks.len());
    blocks
}

/// Every pointer-aligned cell in `block` equal to `needle`.
///
/// The region is streamed in chunks of `chunk_size` bytes; a failed read ends
/// the scan with whatever was found so far.
pub fn scan_region<R: ReadMemory>(
    reader: &R,
    block: &MemoryBlock,
    needle: u64,
    chunk_size: usize,
) -> Vec<Address> {
    let chunk_size = (chunk_size.max(8) / 8 * 8) as u64;
    let mut hits = Vec::new();
    let mut offset = 0u64;

    while offset < block.size {
        let len = chunk_size.min(block.size - offset) as usize;
        let address = block.address.value() + offset;
        let bytes = match reader.read_bytes(address, len) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Heap scan stopped at 0x{:X}: {}", address, e);
                break;
            }
        };

        let needle_bytes = needle.to_le_bytes();
        hits.extend(
            bytes
                .chunks_exact(8)
                .enumerate()
                .filter(|(_, cell)| *cell == needle_bytes)
                .map(|(i, _)| Address::new(address + (i * 8) as u64)),
        );

        offset += len as u64;
    }

    info!("Pointers to 0x{:X} found: {}", needle, hits.len());
    hits
}
