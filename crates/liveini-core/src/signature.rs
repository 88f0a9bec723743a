//! Wildcard byte signatures
//!
//! A signature is written as whitespace-separated two-character byte tokens.
//! Each character is a hex digit or `?`, so either nibble of a byte can be a
//! wildcard: `"48 8B ?5 ?? 90"`. Tokens are case-insensitive.
//!
//! Each byte compiles to a 16-bit cell: the high byte is the nibble mask and
//! the low byte the expected value after masking. A haystack byte `b` matches
//! a cell when `b & mask == value`.

use crate::error::{Error, Result};

/// Returned by [`scan`] when the signature does not occur. Offset 0 is a
/// valid match, so callers compare against this instead of testing for zero.
pub const NOT_FOUND: usize = usize::MAX;

/// Terminator cell. Its value has bits outside its mask, so no byte can ever
/// match it and no compiled token can produce it.
const END: u16 = 0x00FF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSignature {
    cells: Vec<u16>,
}

impl CompiledSignature {
    /// Compile a signature from its text form
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut cells = Vec::new();
        for token in pattern.split_whitespace() {
            cells.push(compile_token(token)?);
        }

        if cells.is_empty() {
            return Err(Error::InvalidSignature("pattern is empty".to_string()));
        }

        cells.push(END);
        Ok(Self { cells })
    }

    /// Signature matching `bytes` exactly
    pub fn literal(bytes: &[u8]) -> Self {
        let mut cells: Vec<u16> = bytes.iter().map(|&b| 0xFF00 | b as u16).collect();
        cells.push(END);
        Self { cells }
    }

    /// Signature matching `text` encoded as UTF-16LE, followed by a wide null
    pub fn wide_literal(text: &str) -> Self {
        let bytes: Vec<u8> = text
            .encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(u16::to_le_bytes)
            .collect();
        Self::literal(&bytes)
    }

    /// Number of bytes the signature spans
    pub fn len(&self) -> usize {
        self.cells.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pattern(&self) -> &[u16] {
        &self.cells[..self.cells.len() - 1]
    }

    fn matches_at(&self, buffer: &[u8], pos: usize) -> bool {
        let mut i = 0;
        loop {
            let cell = self.cells[i];
            if cell == END {
                return true;
            }
            let Some(&b) = buffer.get(pos + i) else {
                return false;
            };
            let mask = (cell >> 8) as u8;
            let value = cell as u8;
            if b & mask != value {
                return false;
            }
            i += 1;
        }
    }

    /// Exact first byte, used to skip ahead with memchr
    fn anchor(&self) -> Option<u8> {
        let cell = self.cells[0];
        (cell >> 8 == 0xFF).then_some(cell as u8)
    }
}

fn compile_token(token: &str) -> Result<u16> {
    let chars = token.as_bytes();
    if chars.len() != 2 {
        return Err(Error::InvalidSignature(format!(
            "token '{}' must be exactly two characters",
            token
        )));
    }

    let mut mask = 0u8;
    let mut value = 0u8;
    for (i, &c) in chars.iter().enumerate() {
        let shift = if i == 0 { 4 } else { 0 };
        if c == b'?' {
            continue;
        }
        let nibble = (c as char).to_digit(16).ok_or_else(|| {
            Error::InvalidSignature(format!("token '{}' has non-hex character", token))
        })? as u8;
        mask |= 0x0F << shift;
        value |= nibble << shift;
    }

    Ok(((mask as u16) << 8) | value as u16)
}

/// Compile a signature from its text form
pub fn compile(pattern: &str) -> Result<CompiledSignature> {
    CompiledSignature::compile(pattern)
}

/// First match at or after `start_offset`, or [`NOT_FOUND`]
///
/// A start offset at or past the end of the buffer yields [`NOT_FOUND`].
pub fn scan(buffer: &[u8], start_offset: usize, signature: &CompiledSignature) -> usize {
    if start_offset >= buffer.len() {
        return NOT_FOUND;
    }

    let mut pos = start_offset;
    match signature.anchor() {
        Some(first) => {
            while let Some(hit) = memchr::memchr(first, &buffer[pos..]) {
                let candidate = pos + hit;
                if signature.matches_at(buffer, candidate) {
                    return candidate;
                }
                pos = candidate + 1;
                if pos >= buffer.len() {
                    break;
                }
            }
        }
        None => {
            while pos < buffer.len() {
                if signature.matches_at(buffer, pos) {
                    return pos;
                }
                pos += 1;
            }
        }
    }

    NOT_FOUND
}

/// Every match lying entirely inside `[start, end)`, probing again one byte
/// past each hit
pub fn find_all(
    buffer: &[u8],
    start: usize,
    end: usize,
    signature: &CompiledSignature,
) -> Vec<usize> {
    let end = end.min(buffer.len());
    let mut results = Vec::new();
    let mut pos = start;

    while pos < end {
        let hit = scan(&buffer[..end], pos, signature);
        if hit == NOT_FOUND {
            break;
        }
        results.push(hit);
        pos = hit + 1;
    }

    results
}

/// Render a compiled signature back to its text form
pub fn format(signature: &CompiledSignature) -> String {
    signature
        .pattern()
        .iter()
        .map(|&cell| {
            let mask = (cell >> 8) as u8;
            let value = cell as u8;
            let hi = if mask & 0xF0 != 0 {
                format!("{:X}", value >> 4)
            } else {
                "?".to_string()
            };
            let lo = if mask & 0x0F != 0 {
                format!("{:X}", value & 0x0F)
            } else {
                "?".to_string()
            };
            format!("{}{}", hi, lo)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planted_match_offset() {
        let sig = compile("DE AD BE EF").unwrap();
        for k in [0usize, 1, 7, 60] {
            let mut buffer = vec![0u8; 64];
            buffer[k..k + 4].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
            assert_eq!(scan(&buffer, 0, &sig), k);
        }
        assert_eq!(scan(&[0u8; 64], 0, &sig), NOT_FOUND);
    }

    #[test]
    fn test_nibble_wildcards() {
        let sig = compile("4? ?8").unwrap();
        assert_eq!(scan(&[0x41, 0x28], 0, &sig), 0);
        assert_eq!(scan(&[0x4F, 0x18], 0, &sig), 0);
        assert_eq!(scan(&[0x51, 0x28], 0, &sig), NOT_FOUND);
    }

    #[test]
    fn test_full_wildcard_between_exact_bytes() {
        let sig = compile("90 90 ?? 90").unwrap();
        assert_eq!(scan(&[0x90, 0x90, 0x12, 0x90, 0x00], 0, &sig), 0);
        assert_eq!(scan(&[0x90, 0x91, 0x12, 0x90], 0, &sig), NOT_FOUND);
    }

    #[test]
    fn test_exact_ff_byte_matches() {
        let sig = compile("FF FF").unwrap();
        assert_eq!(sig.len(), 2);
        assert_eq!(scan(&[0x00, 0xFF, 0xFF], 0, &sig), 1);
    }

    #[test]
    fn test_match_must_fit_in_buffer() {
        let sig = compile("01 02 03").unwrap();
        assert_eq!(scan(&[0x00, 0x01, 0x02], 0, &sig), NOT_FOUND);
    }

    #[test]
    fn test_start_offset_bounds() {
        let sig = compile("01").unwrap();
        let buffer = [0x01, 0x00, 0x01];
        assert_eq!(scan(&buffer, 1, &sig), 2);
        assert_eq!(scan(&buffer, 3, &sig), NOT_FOUND);
        assert_eq!(scan(&[], 0, &sig), NOT_FOUND);
    }

    #[test]
    fn test_malformed_patterns() {
        assert!(compile("").is_err());
        assert!(compile("   ").is_err());
        assert!(compile("4").is_err());
        assert!(compile("123").is_err());
        assert!(compile("4G").is_err());
        assert!(compile("48 8B 0").is_err());
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let a = compile("48 8b ?5\t??  90").unwrap();
        let b = compile("48 8B ?5 ?? 90").unwrap();
        assert_eq!(a, b);
        assert_eq!(format(&a), "48 8B ?5 ?? 90");
    }

    #[test]
    fn test_compiles_do_not_share_state() {
        let first = compile("AA BB").unwrap();
        assert_eq!(scan(&[0u8; 16], 0, &first), NOT_FOUND);
        drop(first);

        let second = compile("CC").unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(scan(&[0x00, 0xCC], 0, &second), 1);
        assert!(compile("zz").is_err());
        let third = compile("AA BB").unwrap();
        assert_eq!(scan(&[0xAA, 0xBB], 0, &third), 0);
    }

    #[test]
    fn test_find_all_within_range() {
        let sig = compile("90 90").unwrap();
        let buffer = [0x90, 0x90, 0x90, 0x00, 0x90, 0x90];
        assert_eq!(find_all(&buffer, 0, buffer.len(), &sig), vec![0, 1, 4]);
        assert_eq!(find_all(&buffer, 1, 5, &sig), vec![1]);
    }

    #[test]
    fn test_wide_literal() {
        let sig = CompiledSignature::wide_literal("Ab");
        assert_eq!(sig.len(), 6);
        assert_eq!(scan(&[0x00, b'A', 0, b'b', 0, 0, 0], 0, &sig), 1);
    }
}
