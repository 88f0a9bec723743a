//! Captured module image and its section map

mod sections;
mod snapshot;
mod version;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::ops::Range;

use serde::Serialize;

pub use sections::analyze;
pub use snapshot::MemorySnapshot;
pub use version::{ImageVersion, locate_version_string};

/// Image-relative (offset, size) pair of one section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Section {
    pub offset: u32,
    pub size: u32,
}

impl Section {
    pub const fn new(offset: u32, size: u32) -> Self {
        Self { offset, size }
    }

    pub fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }

    pub fn contains(&self, image_offset: u64) -> bool {
        image_offset >= self.offset as u64 && image_offset < self.end()
    }

    /// Byte range of the section inside a snapshot of `len` bytes
    pub fn range_in(&self, len: usize) -> Range<usize> {
        let start = (self.offset as usize).min(len);
        let end = (self.end() as usize).min(len);
        start..end
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:8X} - {:8X}", self.offset, self.end())
    }
}

/// The four sections the analysis needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SectionTable {
    /// `.text`
    pub code: Section,
    /// `.rdata`
    pub rdata: Section,
    /// `.data`
    pub data: Section,
    /// `.rsrc`
    pub rsrc: Section,
}
