//! Automaton file header parsing and validation.
//!
//! # Header Structure
//! ```text
//! [4 bytes]  Magic "meal"
//! [u32 x 14] ver, flags,
//!            alphabet_offset, fsa_offset, annot_offset,
//!            alphabet_size, transes_count,
//!            annot_size_len, annot_chunk_size, annot_chunks_count,
//!            char_size, padding_size, dest_size, hash_size
//! ```
//! All fields are little-endian.

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, trace};

use crate::morphy::types::error::{MorphyError, Result};
use crate::morphy::types::models::{FsaFlags, FsaHeader, FsaLayout};
use crate::morphy::utils;

pub const FSA_HEADER_SIZE: usize = 60;
pub const FSA_MAGIC: &[u8; 4] = b"meal";
pub const FSA_VERSION: u32 = 2;

/// Parses the 60-byte header and rejects anything this reader cannot walk.
pub fn parse_header(raw: &[u8]) -> Result<FsaHeader> {
    utils::ensure_len(raw, FSA_HEADER_SIZE, "Automaton header")?;

    if &raw[0..4] != FSA_MAGIC {
        return Err(MorphyError::InvalidFormat(format!(
            "Bad automaton magic {:?}, expected {:?}",
            String::from_utf8_lossy(&raw[0..4]),
            "meal"
        )));
    }

    let mut reader = &raw[4..FSA_HEADER_SIZE];
    let version = reader.read_u32::<LittleEndian>()?;
    let raw_flags = reader.read_u32::<LittleEndian>()?;
    let alphabet_offset = reader.read_u32::<LittleEndian>()?;
    let fsa_offset = reader.read_u32::<LittleEndian>()?;
    let annot_offset = reader.read_u32::<LittleEndian>()?;
    let alphabet_size = reader.read_u32::<LittleEndian>()?;
    let transes_count = reader.read_u32::<LittleEndian>()?;
    let annot_size_len = reader.read_u32::<LittleEndian>()?;
    let annot_chunk_size = reader.read_u32::<LittleEndian>()?;
    let annot_chunks_count = reader.read_u32::<LittleEndian>()?;
    let char_size = reader.read_u32::<LittleEndian>()?;
    let padding_size = reader.read_u32::<LittleEndian>()?;
    let dest_size = reader.read_u32::<LittleEndian>()?;
    let hash_size = reader.read_u32::<LittleEndian>()?;

    trace!(
        "Automaton header: ver={}, flags={:#06x}, alphabet@{}, fsa@{}, annot@{}, transes={}",
        version, raw_flags, alphabet_offset, fsa_offset, annot_offset, transes_count
    );

    if version != FSA_VERSION {
        return Err(MorphyError::UnsupportedVersion {
            what: "automaton",
            version,
        });
    }

    let flags = FsaFlags::from(raw_flags);
    if flags.is_hash {
        return Err(MorphyError::UnsupportedFormat(
            "hash automata are not supported".to_string(),
        ));
    }
    if flags.is_be {
        return Err(MorphyError::UnsupportedFormat(
            "big-endian automata are not supported".to_string(),
        ));
    }

    let constants = [
        ("char_size", char_size, 1),
        ("padding_size", padding_size, 0),
        ("dest_size", dest_size, 3),
        ("hash_size", hash_size, 0),
        ("annot_size_len", annot_size_len, 1),
        ("annot_chunk_size", annot_chunk_size, 1),
    ];
    for (name, actual, expected) in constants {
        if actual != expected {
            return Err(MorphyError::UnsupportedFormat(format!(
                "{} must be {}, found {}",
                name, expected, actual
            )));
        }
    }

    let layout = match (flags.is_sparse, flags.is_tree) {
        (true, false) => FsaLayout::Sparse,
        (false, true) => FsaLayout::Tree,
        _ => {
            return Err(MorphyError::UnsupportedFormat(format!(
                "exactly one of the sparse or tree flags must be set (flags={:#x})",
                raw_flags
            )))
        }
    };
    debug!("Automaton layout: {}", layout);

    Ok(FsaHeader {
        layout,
        flags,
        alphabet_offset,
        fsa_offset,
        annot_offset,
        alphabet_size,
        transes_count,
        annot_chunks_count,
    })
}
