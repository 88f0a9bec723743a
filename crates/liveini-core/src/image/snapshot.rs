use tracing::{debug, info, warn};

use crate::address::Address;
use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::memory::layout::page;

/// Local copy of the target's main module image
///
/// Offsets into the buffer equal image-relative virtual addresses, so a
/// snapshot offset plus the module base is a live address.
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    base: Address,
    data: Vec<u8>,
}

impl MemorySnapshot {
    /// Copy the whole module image out of the target.
    ///
    /// The size is the loader-reported image size rounded up to a page. If
    /// the image cannot be read in one call it is read page by page and
    /// unreadable pages are left zeroed.
    pub fn capture<R: ReadMemory>(reader: &R) -> Result<Self> {
        let base = reader.base_address();
        let size = page::round_up(reader.image_size());
        if size == 0 {
            return Err(Error::InvalidImage("module reports zero image size".to_string()));
        }

        match reader.read_bytes(base, size) {
            Ok(data) => {
                info!("Captured image: 0x{:X} bytes at 0x{:X}", size, base);
                return Ok(Self::from_bytes(Address::new(base), data));
            }
            Err(e) => debug!("Single read of image failed, reading by page: {}", e),
        }

        let mut data = vec![0u8; size];
        let mut missing = 0usize;
        for (i, chunk) in data.chunks_mut(page::SIZE).enumerate() {
            let address = base + (i * page::SIZE) as u64;
            match reader.read_bytes(address, chunk.len()) {
                Ok(bytes) => chunk.copy_from_slice(&bytes),
                Err(_) => missing += 1,
            }
        }

        let pages = size / page::SIZE;
        if missing == pages {
            return Err(Error::read_failed(base, "no page of the image is readable"));
        }
        if missing > 0 {
            warn!("{} of {} image pages unreadable, zero-filled", missing, pages);
        }

        info!("Captured image: 0x{:X} bytes at 0x{:X}", size, base);
        Ok(Self::from_bytes(Address::new(base), data))
    }

    pub fn from_bytes(base: Address, data: Vec<u8>) -> Self {
        Self { base, data }
    }

    pub fn base(&self) -> Address {
        self.base
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Live address of a snapshot offset
    pub fn address_of(&self, offset: usize) -> Address {
        Address::new(self.base.value() + offset as u64)
    }

    pub fn u32_at(&self, offset: usize) -> Option<u32> {
        let b = self.data.get(offset..offset.checked_add(4)?)?;
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u64_at(&self, offset: usize) -> Option<u64> {
        let b = self.data.get(offset..offset.checked_add(8)?)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Some(u64::from_le_bytes(raw))
    }

    /// Null-terminated string starting at `offset`
    pub fn cstr_at(&self, offset: usize) -> Option<String> {
        let rest = self.data.get(offset..)?;
        let end = memchr::memchr(0, rest)?;
        Some(String::from_utf8_lossy(&rest[..end]).into_owned())
    }

    /// First 4-byte cell at or after `cursor` equal to `needle`, stepping in
    /// whole cells from the cursor
    pub fn find_u32(&self, cursor: usize, needle: u32) -> Option<usize> {
        let rest = self.data.get(cursor..)?;
        rest.chunks_exact(4)
            .position(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) == needle)
            .map(|i| cursor + i * 4)
    }

    /// First 8-byte cell at or after `cursor` equal to `needle`, stepping in
    /// whole cells from the cursor
    pub fn find_u64(&self, cursor: usize, needle: u64) -> Option<usize> {
        let rest = self.data.get(cursor..)?;
        let bytes = needle.to_le_bytes();
        rest.chunks_exact(8)
            .position(|c| c == bytes)
            .map(|i| cursor + i * 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemory;

    #[test]
    fn test_capture_rounds_to_page() {
        let mem = MockMemory::builder()
            .base(0x1_4000_0000)
            .image_size(0x1800)
            .bytes(0x1_4000_0000, &[0xAB; 0x2000])
            .build();

        let snapshot = MemorySnapshot::capture(&mem).unwrap();
        assert_eq!(snapshot.len(), 0x2000);
        assert_eq!(snapshot.base().value(), 0x1_4000_0000);
        assert_eq!(snapshot.bytes()[0x1FFF], 0xAB);
    }

    #[test]
    fn test_capture_zero_fills_unreadable_pages() {
        let base = 0x1_4000_0000u64;
        let mem = MockMemory::builder()
            .base(base)
            .image_size(0x3000)
            .bytes(base, &[0x11; 0x1000])
            .bytes(base + 0x2000, &[0x33; 0x1000])
            .build();

        let snapshot = MemorySnapshot::capture(&mem).unwrap();
        assert_eq!(snapshot.len(), 0x3000);
        assert_eq!(snapshot.bytes()[0x0FFF], 0x11);
        assert_eq!(snapshot.bytes()[0x1000], 0x00);
        assert_eq!(snapshot.bytes()[0x2000], 0x33);
    }

    #[test]
    fn test_capture_fails_when_nothing_readable() {
        let mem = MockMemory::builder()
            .base(0x1000)
            .image_size(0x1000)
            .build();
        assert!(MemorySnapshot::capture(&mem).is_err());
    }

    #[test]
    fn test_find_cells_from_cursor() {
        let mut data = vec![0u8; 64];
        data[16..24].copy_from_slice(&0xDEAD_BEEF_u64.to_le_bytes());
        data[40..48].copy_from_slice(&0xDEAD_BEEF_u64.to_le_bytes());
        let snapshot = MemorySnapshot::from_bytes(Address::new(0x1000), data);

        assert_eq!(snapshot.find_u64(0, 0xDEAD_BEEF), Some(16));
        assert_eq!(snapshot.find_u64(24, 0xDEAD_BEEF), Some(40));
        assert_eq!(snapshot.find_u64(48, 0xDEAD_BEEF), None);
        assert_eq!(snapshot.find_u32(0, 0xDEAD_BEEF), Some(16));
        assert_eq!(snapshot.address_of(40).value(), 0x1028);
    }
}
