//! Memory layout constants for the structures read from the target
//!
//! This module centralizes the fixed sizes and field offsets used when
//! decoding the captured image and live objects. Constants are organized by
//! structure type.

/// Page granularity of the captured module image
pub mod page {
    pub const SIZE: usize = 4096;

    /// Round a byte count up to a whole number of pages
    pub const fn round_up(size: usize) -> usize {
        (size + SIZE - 1) & !(SIZE - 1)
    }
}

/// Game setting object: four pointer-sized fields
///
/// ```text
/// +0x00  vtable pointer
/// +0x08  active value   (value union, 8 bytes)
/// +0x10  default value  (value union, 8 bytes)
/// +0x18  name pointer   (char*)
/// ```
pub mod setting {
    /// Pointer size (8 bytes / 64-bit target)
    pub const WORD: u64 = 8;

    pub const VTABLE: u64 = 0;
    pub const ACTIVE: u64 = WORD;
    pub const DEFAULT: u64 = WORD * 2;
    pub const NAME: u64 = WORD * 3;

    /// Total object size; the instance scan resumes this far past each hit
    pub const SIZE: usize = (WORD * 4) as usize;

    /// Bytes read at the name pointer (127 characters plus terminator)
    pub const NAME_READ_LEN: usize = 128;

    /// Bytes read at a string value pointer (1023 characters plus terminator)
    pub const STRING_READ_LEN: usize = 1024;
}

/// PE32+ header offsets
pub mod pe {
    pub const DOS_MAGIC: &[u8; 2] = b"MZ";
    pub const NT_SIGNATURE: &[u8; 4] = b"PE\0\0";

    /// Offset of `e_lfanew` inside the DOS header
    pub const E_LFANEW: usize = 0x3C;
    pub const DOS_HEADER_SIZE: usize = 0x40;

    /// COFF file header, relative to the NT signature
    pub const FILE_HEADER: usize = 4;
    pub const FILE_HEADER_SIZE: usize = 20;
    pub const NUMBER_OF_SECTIONS: usize = FILE_HEADER + 2;
    pub const SIZE_OF_OPTIONAL_HEADER: usize = FILE_HEADER + 16;

    /// Optional header magic for PE32+
    pub const OPTIONAL_MAGIC_PE64: u16 = 0x20B;
    pub const OPTIONAL_HEADER: usize = FILE_HEADER + FILE_HEADER_SIZE;

    /// Section header fields
    pub const SECTION_HEADER_SIZE: usize = 40;
    pub const SECTION_NAME_LEN: usize = 8;
    pub const SECTION_VIRTUAL_ADDRESS: usize = 12;
    pub const SECTION_SIZE_OF_RAW_DATA: usize = 16;
}

/// Reverse pointer scan over large heap regions
pub mod heap {
    /// Only regions larger than this are considered (120 MiB)
    pub const MIN_REGION_SIZE: u64 = 120 * 1024 * 1024;

    /// Read buffer size when streaming a region (60 MiB)
    pub const SCAN_CHUNK_SIZE: usize = 60 * 1024 * 1024;

    /// Highest user-mode address walked by the region query
    pub const USER_ADDRESS_LIMIT: u64 = 0x7FFF_FFFF_FFFF;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_round_up() {
        assert_eq!(page::round_up(0), 0);
        assert_eq!(page::round_up(1), 4096);
        assert_eq!(page::round_up(4096), 4096);
        assert_eq!(page::round_up(4097), 8192);
    }

    #[test]
    fn test_setting_layout_is_contiguous() {
        assert_eq!(setting::NAME + setting::WORD, setting::SIZE as u64);
        assert_eq!(heap::SCAN_CHUNK_SIZE % 8, 0);
    }
}
