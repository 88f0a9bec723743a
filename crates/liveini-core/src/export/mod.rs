//! Export of scanned settings and recovered classes

mod dump;
mod json;

pub use dump::{DUMP_COLUMNS, write_dump};
pub use json::write_rtti_json;
