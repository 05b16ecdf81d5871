//! Packed annotation records stored in the automata.
//!
//! # Dictionary record (15 bytes)
//! ```text
//! [u32] offset  [u16] base_size  [u16] all_size  [u16] ancodes_size
//! [2]   ancode  [u8]  flen       [u8]  plen      [u8]  cplen
//! ```
//!
//! # Prediction record (16 bytes)
//! ```text
//! [u32] offset  [u16] base_size  [u16] all_size  [u16] ancodes_size
//! [2]   ancode  [u16] freq       [u8]  flen      [u8]  pos_id
//! ```

use byteorder::{LittleEndian, ReadBytesExt};

use crate::morphy::types::error::{MorphyError, Result};
use crate::morphy::types::models::{AnnotRecord, EntryLocation};

pub const COMMON_ANNOT_SIZE: usize = 15;
pub const PREDICT_ANNOT_SIZE: usize = 16;

fn check_blob(raw: &[u8], record_size: usize) -> Result<()> {
    if raw.is_empty() || raw.len() % record_size != 0 {
        return Err(MorphyError::MalformedAnnotation {
            len: raw.len(),
            record_size,
        });
    }
    Ok(())
}

fn read_location(reader: &mut &[u8]) -> Result<EntryLocation> {
    Ok(EntryLocation {
        offset: reader.read_u32::<LittleEndian>()?,
        base_size: reader.read_u16::<LittleEndian>()?,
        all_size: reader.read_u16::<LittleEndian>()?,
        ancodes_size: reader.read_u16::<LittleEndian>()?,
    })
}

/// Decodes a blob of 15-byte dictionary records.
pub fn decode_common(raw: &[u8]) -> Result<Vec<AnnotRecord>> {
    check_blob(raw, COMMON_ANNOT_SIZE)?;

    raw.chunks_exact(COMMON_ANNOT_SIZE)
        .map(|mut chunk| {
            let location = read_location(&mut chunk)?;
            Ok(AnnotRecord {
                location,
                ancode: [chunk[0], chunk[1]],
                flen: chunk[2],
                plen: chunk[3],
                cplen: chunk[4],
                freq: 0,
                pos_id: 0,
            })
        })
        .collect()
}

/// Decodes a blob of 16-byte prediction records.
///
/// Prefix lengths are not stored for predicted entries and come back as zero.
pub fn decode_predict(raw: &[u8]) -> Result<Vec<AnnotRecord>> {
    check_blob(raw, PREDICT_ANNOT_SIZE)?;

    raw.chunks_exact(PREDICT_ANNOT_SIZE)
        .map(|mut chunk| {
            let location = read_location(&mut chunk)?;
            let ancode = [chunk[0], chunk[1]];
            let mut tail = &chunk[2..];
            let freq = tail.read_u16::<LittleEndian>()?;
            Ok(AnnotRecord {
                location,
                ancode,
                flen: tail[0],
                plen: 0,
                cplen: 0,
                freq,
                pos_id: tail[1],
            })
        })
        .collect()
}
