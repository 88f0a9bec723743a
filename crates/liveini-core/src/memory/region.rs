//! Virtual memory region descriptors

use serde::Serialize;

use crate::address::Address;

/// Win32 page protection bits, kept as raw values so region filtering works
/// the same against a live process and a mock.
pub mod protect {
    pub const NOACCESS: u32 = 0x01;
    pub const READONLY: u32 = 0x02;
    pub const READWRITE: u32 = 0x04;
    pub const WRITECOPY: u32 = 0x08;
    pub const EXECUTE: u32 = 0x10;
    pub const EXECUTE_READ: u32 = 0x20;
    pub const EXECUTE_READWRITE: u32 = 0x40;
    pub const EXECUTE_WRITECOPY: u32 = 0x80;
    pub const GUARD: u32 = 0x100;
    pub const NOCACHE: u32 = 0x200;
    pub const WRITECOMBINE: u32 = 0x400;

    /// Protections that make a region unsuitable for bulk reads
    pub const UNSCANNABLE: u32 = GUARD | NOCACHE | WRITECOMBINE | NOACCESS;
}

/// Result of a single region query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionInfo {
    pub base: u64,
    pub size: u64,
    pub committed: bool,
    pub protect: u32,
}

impl RegionInfo {
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.size)
    }

    /// Committed and not guard/nocache/writecombine/noaccess
    pub fn is_scannable(&self) -> bool {
        self.committed && (self.protect & protect::UNSCANNABLE) == 0
    }
}

/// A region selected for reverse pointer scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryBlock {
    pub address: Address,
    pub size: u64,
}

impl MemoryBlock {
    pub fn size_mib(&self) -> u64 {
        self.size / (1024 * 1024)
    }
}

impl From<RegionInfo> for MemoryBlock {
    fn from(info: RegionInfo) -> Self {
        Self {
            address: Address::new(info.base),
            size: info.size,
        }
    }
}
