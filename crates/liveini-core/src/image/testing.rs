//! Synthetic PE images for tests

use crate::memory::layout::pe;

/// Writes a minimal DOS header, PE32+ NT headers and a section table into a
/// zeroed buffer
pub struct PeBuilder {
    size: usize,
    sections: Vec<(String, u32, u32)>,
}

impl PeBuilder {
    pub const NT_OFFSET: usize = 0x80;
    const OPTIONAL_HEADER_SIZE: usize = 240;

    pub fn new(size: usize) -> Self {
        Self {
            size,
            sections: Vec::new(),
        }
    }

    pub fn section(mut self, name: &str, offset: u32, size: u32) -> Self {
        self.sections.push((name.to_string(), offset, size));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut image = vec![0u8; self.size];
        image[..2].copy_from_slice(pe::DOS_MAGIC);
        image[pe::E_LFANEW..pe::E_LFANEW + 4]
            .copy_from_slice(&(Self::NT_OFFSET as u32).to_le_bytes());

        let nt = Self::NT_OFFSET;
        image[nt..nt + 4].copy_from_slice(pe::NT_SIGNATURE);
        image[nt + pe::FILE_HEADER..nt + pe::FILE_HEADER + 2]
            .copy_from_slice(&0x8664u16.to_le_bytes());
        image[nt + pe::NUMBER_OF_SECTIONS..nt + pe::NUMBER_OF_SECTIONS + 2]
            .copy_from_slice(&(self.sections.len() as u16).to_le_bytes());
        image[nt + pe::SIZE_OF_OPTIONAL_HEADER..nt + pe::SIZE_OF_OPTIONAL_HEADER + 2]
            .copy_from_slice(&(Self::OPTIONAL_HEADER_SIZE as u16).to_le_bytes());
        image[nt + pe::OPTIONAL_HEADER..nt + pe::OPTIONAL_HEADER + 2]
            .copy_from_slice(&pe::OPTIONAL_MAGIC_PE64.to_le_bytes());

        let first = nt + pe::OPTIONAL_HEADER + Self::OPTIONAL_HEADER_SIZE;
        for (i, (name, offset, size)) in self.sections.iter().enumerate() {
            let header = first + i * pe::SECTION_HEADER_SIZE;
            let name_bytes = name.as_bytes();
            let len = name_bytes.len().min(pe::SECTION_NAME_LEN);
            image[header..header + len].copy_from_slice(&name_bytes[..len]);
            let va = header + pe::SECTION_VIRTUAL_ADDRESS;
            image[va..va + 4].copy_from_slice(&offset.to_le_bytes());
            let raw = header + pe::SECTION_SIZE_OF_RAW_DATA;
            image[raw..raw + 4].copy_from_slice(&size.to_le_bytes());
        }

        image
    }
}

pub fn put_u32(image: &mut [u8], offset: usize, value: u32) {
    image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub fn put_u64(image: &mut [u8], offset: usize, value: u64) {
    image[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

pub fn put_bytes(image: &mut [u8], offset: usize, bytes: &[u8]) {
    image[offset..offset + bytes.len()].copy_from_slice(bytes);
}
