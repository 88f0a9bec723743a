use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::signature::{self, CompiledSignature, NOT_FOUND};

const VERSION_LABEL: &str = "ProductVersion";

/// Four-part file version of the target executable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImageVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}

impl fmt::Display for ImageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Find the `ProductVersion` entry in the resource section bytes and parse
/// the `a.b.c.d` value that follows it.
///
/// Resource strings are UTF-16LE, so only 2-byte aligned hits count.
pub fn locate_version_string(resource: &[u8]) -> Option<ImageVersion> {
    let label = CompiledSignature::wide_literal(VERSION_LABEL);
    let mut cursor = 0;

    loop {
        let hit = signature::scan(resource, cursor, &label);
        if hit == NOT_FOUND {
            debug!("{} not found in resources", VERSION_LABEL);
            return None;
        }
        cursor = hit + 1;
        if hit % 2 != 0 {
            continue;
        }

        if let Some(version) = parse_value(&resource[hit + label.len()..]) {
            return Some(version);
        }
    }
}

fn parse_value(bytes: &[u8]) -> Option<ImageVersion> {
    // Skip alignment padding between the key and the value
    let start = bytes
        .chunks_exact(2)
        .position(|unit| unit != [0, 0])?
        * 2;
    let rest = &bytes[start..];
    let end = rest
        .chunks_exact(2)
        .position(|unit| unit == [0, 0])
        .map(|i| i * 2)
        .unwrap_or(rest.len() & !1);

    let (text, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(&rest[..end]);
    parse_dotted(text.trim())
}

fn parse_dotted(text: &str) -> Option<ImageVersion> {
    let numeric: String = text
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let mut parts = numeric.split('.').map(|p| p.parse::<u32>().ok());

    Some(ImageVersion {
        major: parts.next()??,
        minor: parts.next()??,
        build: parts.next()??,
        revision: parts.next()??,
    })
}
