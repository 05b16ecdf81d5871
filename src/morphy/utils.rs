//! Low-level byte reading utilities

use encoding_rs::Encoding;

use crate::morphy::types::error::{MorphyError, Result};

/// Fails unless `data` holds at least `needed` bytes.
///
/// Called before every fixed-layout decode so that truncated input is
/// reported as a format error rather than a short read.
pub fn ensure_len(data: &[u8], needed: usize, context: &str) -> Result<()> {
    if data.len() < needed {
        return Err(MorphyError::InvalidFormat(format!(
            "{} is truncated: expected at least {} bytes, found {}",
            context,
            needed,
            data.len()
        )));
    }
    Ok(())
}

/// Reads a string prefixed by a one-byte length and advances the slice.
///
/// Trailing whitespace and NUL padding are stripped.
pub fn read_short_string(reader: &mut &[u8], context: &str) -> Result<String> {
    ensure_len(reader, 1, context)?;
    let len = reader[0] as usize;
    ensure_len(&reader[1..], len, context)?;
    let raw = &reader[1..1 + len];
    *reader = &reader[1 + len..];

    let text = String::from_utf8_lossy(raw);
    Ok(text
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string())
}

/// Splits a NUL-separated byte string into its parts.
///
/// An empty input yields no parts at all, while a lone separator yields two
/// empty parts.
pub fn split_nul(data: &[u8]) -> Vec<Vec<u8>> {
    if data.is_empty() {
        return Vec::new();
    }
    data.split(|&b| b == 0).map(<[u8]>::to_vec).collect()
}

/// Length of the longest common prefix of two byte strings.
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Looks up a text encoding by label (`cp1251`, `windows-1251`, `koi8-r`, ...).
pub fn parse_encoding(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}
