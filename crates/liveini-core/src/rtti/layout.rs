//! MSVC x64 RTTI structure offsets
//!
//! ```text
//! vtable - 8      -> RTTICompleteObjectLocator*
//! vtable + 0..    -> method pointers into .text
//!
//! CompleteObjectLocator (x64, image-relative fields)
//! +0x00  signature
//! +0x04  offset
//! +0x08  cdOffset
//! +0x0C  pTypeDescriptor  (u32 image offset)
//! +0x10  pClassDescriptor
//! +0x14  pSelf
//!
//! TypeDescriptor
//! +0x00  pVFTable
//! +0x08  spare
//! +0x10  name[]            (".?AV...")
//! ```

/// Offset from the start of a complete object locator to its image-relative
/// type descriptor field. This is the MSVC x64 layout and is not validated
/// against the rest of the locator; a binary built by another compiler will
/// simply produce no candidates.
pub const LOCATOR_TYPE_DESCRIPTOR_OFFSET: u64 = 12;

/// Offset of the decorated name inside a type descriptor
pub const TYPE_DESCRIPTOR_NAME_OFFSET: u64 = 16;

/// Vtable slots are pointer-sized
pub const POINTER_SIZE: usize = 8;

/// First byte of every decorated type name
pub const NAME_PREFIX: u8 = b'.';

/// Marker of a class type descriptor name; names are 4-byte aligned in the
/// image so it is matched as one 32-bit cell
pub const CLASS_NAME_MARKER: &[u8; 4] = b".?AV";

pub const NAME_ALIGN: usize = 4;
