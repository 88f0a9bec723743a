use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::memory::layout::pe;

use super::{Section, SectionTable};

/// Parse the PE64 headers at the start of a captured image and pick out the
/// code, read-only data, data and resource sections.
///
/// Unknown sections are ignored. A missing section stays zero-sized.
pub fn analyze(image: &[u8]) -> Result<SectionTable> {
    if image.len() < pe::DOS_HEADER_SIZE {
        return Err(Error::InvalidImage(format!(
            "buffer too small for a DOS header ({} bytes)",
            image.len()
        )));
    }
    if &image[..2] != pe::DOS_MAGIC {
        return Err(Error::InvalidImage("missing MZ signature".to_string()));
    }

    let nt = read_u32(image, pe::E_LFANEW)? as usize;
    if image.get(nt..nt + 4) != Some(&pe::NT_SIGNATURE[..]) {
        return Err(Error::InvalidImage(format!(
            "missing PE signature at 0x{:X}",
            nt
        )));
    }

    let section_count = read_u16(image, nt + pe::NUMBER_OF_SECTIONS)? as usize;
    let optional_size = read_u16(image, nt + pe::SIZE_OF_OPTIONAL_HEADER)? as usize;
    let magic = read_u16(image, nt + pe::OPTIONAL_HEADER)?;
    if magic != pe::OPTIONAL_MAGIC_PE64 {
        return Err(Error::InvalidImage(format!(
            "not a PE32+ image (optional header magic 0x{:X})",
            magic
        )));
    }

    let first = nt + pe::OPTIONAL_HEADER + optional_size;
    let table_end = first + section_count * pe::SECTION_HEADER_SIZE;
    if table_end > image.len() {
        return Err(Error::InvalidImage(format!(
            "section table ({} entries) runs past the buffer",
            section_count
        )));
    }

    debug!("  NT headers: 0x{:X}, {} sections", nt, section_count);

    let mut table = SectionTable::default();
    for i in 0..section_count {
        let header = first + i * pe::SECTION_HEADER_SIZE;
        let raw_name = &image[header..header + pe::SECTION_NAME_LEN];
        let name_len = memchr::memchr(0, raw_name).unwrap_or(raw_name.len());
        let name = &raw_name[..name_len];

        let section = Section::new(
            read_u32(image, header + pe::SECTION_VIRTUAL_ADDRESS)?,
            read_u32(image, header + pe::SECTION_SIZE_OF_RAW_DATA)?,
        );

        let slot = match name {
            b".text" => &mut table.code,
            b".rdata" => &mut table.rdata,
            b".data" => &mut table.data,
            b".rsrc" => &mut table.rsrc,
            _ => continue,
        };
        *slot = section;

        info!("{:>8}: {}", String::from_utf8_lossy(name), section);
    }

    for (name, section) in [
        (".text", table.code),
        (".rdata", table.rdata),
        (".data", table.data),
        (".rsrc", table.rsrc),
    ] {
        if section.is_empty() {
            warn!("Section {} not found in image", name);
        }
    }

    Ok(table)
}

fn read_u16(image: &[u8], offset: usize) -> Result<u16> {
    image
        .get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| Error::InvalidImage(format!("header field at 0x{:X} out of range", offset)))
}

fn read_u32(image: &[u8], offset: usize) -> Result<u32> {
    image
        .get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| Error::InvalidImage(format!("header field at 0x{:X} out of range", offset)))
}
