//! Grammatical-information file header and entry header decoding.
//!
//! # File Header (128 bytes)
//! ```text
//! [u32] ver (must be 2)
//! [u32] is_be (big-endian files are valid but not readable here)
//! [u32] flex_count
//! [u32] flex_offset
//! [u32] flex_size
//! @20   [u8 len][len bytes] language
//!       [u8 len][len bytes] codepage
//! ```
//!
//! # Entry Layout
//! ```text
//! @offset      [u16 x 5] id, freq, ancodes_offset, full_size, base_size
//! @offset+10   full_size payload bytes:
//!                [0, base_size)          base flexions, NUL separated, NUL terminated
//!                [0, ancodes_offset)     all flexions, NUL separated, NUL terminated
//!                [ancodes_offset, full)  ancodes, NUL separated, NUL terminated
//!              [u8 pad_len][pad_len bytes]
//! ```

use byteorder::{LittleEndian, ReadBytesExt};
use log::trace;

use crate::morphy::types::error::{MorphyError, Result};
use crate::morphy::types::models::{EntryHeader, EntryLocation, GramInfoHeader};
use crate::morphy::utils;

pub const GRAMINFO_HEADER_SIZE: usize = 128;
pub const GRAMINFO_VERSION: u32 = 2;
pub const ENTRY_HEADER_SIZE: usize = 10;
const STRINGS_OFFSET: usize = 20;

/// Parses and validates the 128-byte file header.
pub fn parse_header(raw: &[u8]) -> Result<GramInfoHeader> {
    utils::ensure_len(raw, GRAMINFO_HEADER_SIZE, "Graminfo header")?;

    let mut reader = raw;
    let version = reader.read_u32::<LittleEndian>()?;
    let is_be = reader.read_u32::<LittleEndian>()?;
    let flex_count = reader.read_u32::<LittleEndian>()?;
    let flex_offset = reader.read_u32::<LittleEndian>()?;
    let flex_size = reader.read_u32::<LittleEndian>()?;

    if is_be != 0 {
        return Err(MorphyError::UnsupportedFormat(
            "well-formed graminfo file in big-endian byte order is not supported".to_string(),
        ));
    }
    if version != GRAMINFO_VERSION {
        return Err(MorphyError::UnsupportedVersion {
            what: "graminfo",
            version,
        });
    }

    let mut strings = &raw[STRINGS_OFFSET..GRAMINFO_HEADER_SIZE];
    let language = utils::read_short_string(&mut strings, "Graminfo language")?;
    let codepage = utils::read_short_string(&mut strings, "Graminfo codepage")?;

    trace!(
        "Graminfo header: entries={}, offset={}, size={}, lang={}, codepage={}",
        flex_count, flex_offset, flex_size, language, codepage
    );

    Ok(GramInfoHeader {
        version,
        flex_count,
        flex_offset,
        flex_size,
        language,
        codepage,
    })
}

/// Decodes the 10-byte header of the entry stored at `offset`.
pub fn parse_entry_header(offset: u32, raw: &[u8]) -> Result<EntryHeader> {
    utils::ensure_len(raw, ENTRY_HEADER_SIZE, "Graminfo entry header")?;

    let mut reader = raw;
    let id = reader.read_u16::<LittleEndian>()?;
    let freq = reader.read_u16::<LittleEndian>()?;
    let ancodes_offset = reader.read_u16::<LittleEndian>()?;
    let full_size = reader.read_u16::<LittleEndian>()?;
    let base_size = reader.read_u16::<LittleEndian>()?;

    if ancodes_offset > full_size || base_size > ancodes_offset {
        return Err(MorphyError::MalformedData(format!(
            "Entry at {} has inconsistent sizes: base={}, all={}, full={}",
            offset, base_size, ancodes_offset, full_size
        )));
    }

    Ok(EntryHeader {
        id,
        freq,
        full_size,
        location: EntryLocation {
            offset,
            base_size,
            all_size: ancodes_offset,
            ancodes_size: full_size - ancodes_offset,
        },
    })
}
