//! Mock memory for testing
//!
//! An in-memory stand-in for a target process. Bytes are planted at absolute
//! addresses; reads succeed only when the whole range lies inside one planted
//! segment, which mirrors how an unmapped page fails a remote read.

use std::cell::{Cell, RefCell};

use crate::error::{Error, Result};

use super::layout::setting::STRING_READ_LEN;
use super::reader::{QueryRegions, ReadMemory, WriteMemory};
use super::region::{RegionInfo, protect};

struct Segment {
    base: u64,
    data: Vec<u8>,
}

impl Segment {
    fn contains(&self, address: u64, len: usize) -> bool {
        address >= self.base
            && address
                .checked_add(len as u64)
                .is_some_and(|end| end <= self.base + self.data.len() as u64)
    }
}

/// A mock process with planted memory, a write log and a region list
pub struct MockMemory {
    base_address: u64,
    image_size: usize,
    segments: RefCell<Vec<Segment>>,
    regions: Vec<RegionInfo>,
    writes: RefCell<Vec<(u64, Vec<u8>)>>,
    read_only: Cell<bool>,
}

impl MockMemory {
    pub fn builder() -> MockMemoryBuilder {
        MockMemoryBuilder::default()
    }

    /// Every successful write, in order
    pub fn writes(&self) -> Vec<(u64, Vec<u8>)> {
        self.writes.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    /// Make every subsequent write fail
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    /// Patch memory directly without going through the write log, simulating
    /// the target changing an object behind our back
    pub fn poke(&self, address: u64, bytes: &[u8]) {
        let mut segments = self.segments.borrow_mut();
        if let Some(segment) = segments
            .iter_mut()
            .find(|s| s.contains(address, bytes.len()))
        {
            let start = (address - segment.base) as usize;
            segment.data[start..start + bytes.len()].copy_from_slice(bytes);
        }
    }

    pub fn poke_u64(&self, address: u64, value: u64) {
        self.poke(address, &value.to_le_bytes());
    }
}

impl ReadMemory for MockMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let segments = self.segments.borrow();
        let segment = segments
            .iter()
            .find(|s| s.contains(address, size))
            .ok_or_else(|| Error::read_failed(address, format!("{} bytes not mapped", size)))?;
        let start = (address - segment.base) as usize;
        Ok(segment.data[start..start + size].to_vec())
    }

    fn base_address(&self) -> u64 {
        self.base_address
    }

    fn image_size(&self) -> usize {
        self.image_size
    }
}

impl WriteMemory for MockMemory {
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        if self.read_only.get() {
            return Err(Error::write_failed(address, "access denied"));
        }
        {
            let mut segments = self.segments.borrow_mut();
            let segment = segments
                .iter_mut()
                .find(|s| s.contains(address, bytes.len()))
                .ok_or_else(|| Error::write_failed(address, "not mapped"))?;
            let start = (address - segment.base) as usize;
            segment.data[start..start + bytes.len()].copy_from_slice(bytes);
        }
        self.writes.borrow_mut().push((address, bytes.to_vec()));
        Ok(())
    }
}

impl QueryRegions for MockMemory {
    fn query_region(&self, address: u64) -> Option<RegionInfo> {
        if let Some(region) = self
            .regions
            .iter()
            .find(|r| address >= r.base && address < r.end())
        {
            return Some(*region);
        }

        // Report the gap up to the next described region as free memory
        let next = self
            .regions
            .iter()
            .filter(|r| r.base > address)
            .map(|r| r.base)
            .min()?;
        Some(RegionInfo {
            base: address,
            size: next - address,
            committed: false,
            protect: protect::NOACCESS,
        })
    }
}

/// Builder for [`MockMemory`]
#[derive(Default)]
pub struct MockMemoryBuilder {
    base_address: u64,
    image_size: usize,
    segments: Vec<Segment>,
    regions: Vec<RegionInfo>,
}

impl MockMemoryBuilder {
    pub fn base(mut self, base_address: u64) -> Self {
        self.base_address = base_address;
        self
    }

    pub fn image_size(mut self, size: usize) -> Self {
        self.image_size = size;
        self
    }

    /// Plant bytes at an absolute address. Bytes that land fully inside an
    /// already planted segment patch it in place.
    pub fn bytes(mut self, address: u64, bytes: &[u8]) -> Self {
        if let Some(segment) = self
            .segments
            .iter_mut()
            .find(|s| s.contains(address, bytes.len()))
        {
            let start = (address - segment.base) as usize;
            segment.data[start..start + bytes.len()].copy_from_slice(bytes);
        } else {
            self.segments.push(Segment {
                base: address,
                data: bytes.to_vec(),
            });
        }
        self
    }

    pub fn u64(self, address: u64, value: u64) -> Self {
        self.bytes(address, &value.to_le_bytes())
    }

    /// Plant a null-terminated string padded to the largest fixed-size read,
    /// so both name and string-value reads succeed
    pub fn cstring(self, address: u64, s: &str) -> Self {
        let mut data = vec![0u8; STRING_READ_LEN.max(s.len() + 1)];
        data[..s.len()].copy_from_slice(s.as_bytes());
        self.bytes(address, &data)
    }

    pub fn region(mut self, base: u64, size: u64, committed: bool, protect: u32) -> Self {
        self.regions.push(RegionInfo {
            base,
            size,
            committed,
            protect,
        });
        self
    }

    pub fn build(self) -> MockMemory {
        MockMemory {
            base_address: self.base_address,
            image_size: self.image_size,
            segments: RefCell::new(self.segments),
            regions: self.regions,
            writes: RefCell::new(Vec::new()),
            read_only: Cell::new(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_read_planted_values() {
        let mem = MockMemory::builder()
            .bytes(0x1000, &[0u8; 64])
            .u64(0x1008, 0x0807_0605_0403_0201)
            .cstring(0x5000, "fTest")
            .build();

        assert_eq!(mem.read_u64(0x1008).unwrap(), 0x0807_0605_0403_0201);
        assert_eq!(mem.read_u32(0x1008).unwrap(), 0x0403_0201);
        assert_eq!(mem.read_cstring(0x5000, 128).unwrap(), "fTest");
    }

    #[test]
    fn test_mock_unmapped_read_fails() {
        let mem = MockMemory::builder().bytes(0x1000, &[1, 2, 3, 4]).build();
        assert!(mem.read_bytes(0x1002, 4).is_err());
        assert!(mem.read_bytes(0x2000, 1).is_err());
    }

    #[test]
    fn test_mock_writes_are_logged() {
        let mem = MockMemory::builder().bytes(0x1000, &[0u8; 16]).build();
        mem.write_u64(0x1008, 42).unwrap();
        assert_eq!(mem.write_count(), 1);
        assert_eq!(mem.read_u64(0x1008).unwrap(), 42);

        mem.set_read_only(true);
        assert!(mem.write_u64(0x1000, 1).is_err());
        assert_eq!(mem.write_count(), 1);
    }

    #[test]
    fn test_mock_region_gaps() {
        let mem = MockMemory::builder()
            .region(0x10000, 0x1000, true, protect::READWRITE)
            .build();

        let gap = mem.query_region(0).unwrap();
        assert!(!gap.committed);
        assert_eq!(gap.end(), 0x10000);
        assert_eq!(mem.query_region(0x10800).unwrap().base, 0x10000);
        assert!(mem.query_region(0x20000).is_none());
    }
}
