//! Remote memory access primitives

use crate::error::{Error, Result};

use super::process::ProcessHandle;
use super::region::RegionInfo;

/// Read access to the target process
///
/// Any call may fail (process exited, page unmapped, access denied). Callers
/// treat a failure as local to the current candidate.
pub trait ReadMemory {
    /// Read exactly `size` bytes at `address`
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Load address of the target's main module
    fn base_address(&self) -> u64;

    /// Size of the main module image as reported by the loader
    fn image_size(&self) -> usize;

    fn read_u32(&self, address: u64) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, 8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[..8]);
        Ok(u64::from_le_bytes(raw))
    }

    /// Read a fixed-size block and decode it as a null-terminated string.
    ///
    /// The last byte of the block is always treated as the terminator, so at
    /// most `max_len - 1` characters are returned.
    fn read_cstring(&self, address: u64, max_len: usize) -> Result<String> {
        let mut bytes = self.read_bytes(address, max_len)?;
        if let Some(last) = bytes.last_mut() {
            *last = 0;
        }
        let end = memchr::memchr(0, &bytes).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

/// Write access to the target process
pub trait WriteMemory {
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()>;

    fn write_u64(&self, address: u64, value: u64) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }
}

/// Virtual memory region query
pub trait QueryRegions {
    /// Describe the region containing `address`, or `None` past the end of
    /// the address space
    fn query_region(&self, address: u64) -> Option<RegionInfo>;
}

/// Memory access backed by an open process handle
pub struct MemoryReader<'a> {
    process: &'a ProcessHandle,
}

impl<'a> MemoryReader<'a> {
    pub fn new(process: &'a ProcessHandle) -> Self {
        Self { process }
    }

    pub fn process(&self) -> &ProcessHandle {
        self.process
    }
}

impl ReadMemory for MemoryReader<'_> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if address == 0 {
            return Err(Error::read_failed(address, "null address"));
        }
        let mut buffer = vec![0u8; size];
        self.process.read_into(address, &mut buffer)?;
        Ok(buffer)
    }

    fn base_address(&self) -> u64 {
        self.process.base_address
    }

    fn image_size(&self) -> usize {
        self.process.module_size as usize
    }
}

impl WriteMemory for MemoryReader<'_> {
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        if address == 0 {
            return Err(Error::write_failed(address, "null address"));
        }
        self.process.write_from(address, bytes)
    }
}

impl QueryRegions for MemoryReader<'_> {
    fn query_region(&self, address: u64) -> Option<RegionInfo> {
        self.process.query(address)
    }
}
