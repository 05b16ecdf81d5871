//! # GramInfo Store
//!
//! Reads grammatical-information entries (flexion endings and ancodes) that
//! annotation records point at, plus a memoizing decorator for the flexion
//! reads on the query hot path.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use log::{info, trace};

use crate::morphy::format::graminfo::{
    parse_entry_header, parse_header, ENTRY_HEADER_SIZE, GRAMINFO_HEADER_SIZE,
};
use crate::morphy::storage::ByteStore;
use crate::morphy::types::error::{MorphyError, Result};
use crate::morphy::types::models::{EntryHeader, EntryLocation, GramInfoHeader};
use crate::morphy::utils;

/// Access to grammatical-information entries.
pub trait GramInfoSource: Send + Sync + fmt::Debug {
    fn header(&self) -> &GramInfoHeader;

    /// Reads the 10-byte header of the entry at `offset`.
    fn read_header(&self, offset: u32) -> Result<EntryHeader>;

    /// NUL-separated ancode strings of an entry.
    fn read_ancodes(&self, location: &EntryLocation) -> Result<Vec<Vec<u8>>>;

    /// Flexion endings as consecutive `(before stem, after stem)` pairs.
    ///
    /// With `only_base` only the pairs producing base forms are returned.
    fn read_flexia_data(&self, location: &EntryLocation, only_base: bool)
        -> Result<Arc<Vec<Vec<u8>>>>;

    /// Offsets of all entries, found by a linear scan of the file.
    fn read_all_offsets(&self) -> Result<Vec<u32>>;

    fn language(&self) -> &str {
        &self.header().language
    }

    fn codepage(&self) -> &str {
        &self.header().codepage
    }
}

/// Reader over a grammatical-information file.
#[derive(Debug)]
pub struct GramInfo {
    store: Arc<dyn ByteStore>,
    header: GramInfoHeader,
}

impl GramInfo {
    pub fn open(store: Arc<dyn ByteStore>) -> Result<Self> {
        let header_len = store.size().min(GRAMINFO_HEADER_SIZE as u64);
        let header = parse_header(&store.read(0, header_len)?)?;

        info!(
            "Graminfo opened: {} entries, language={}, codepage={}",
            header.flex_count, header.language, header.codepage
        );
        Ok(Self { store, header })
    }

    /// Reads `len` payload bytes starting `skip` bytes past the entry header,
    /// dropping the region's trailing NUL.
    fn read_region(&self, location: &EntryLocation, skip: u64, len: u16) -> Result<Vec<Vec<u8>>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let start = u64::from(location.offset) + ENTRY_HEADER_SIZE as u64 + skip;
        let len = u64::from(len);
        if !self.store.contains(start, len) {
            return Err(MorphyError::MalformedData(format!(
                "Entry at {} reaches past the end of the file ([{}..{}], size {})",
                location.offset,
                start,
                start + len,
                self.store.size()
            )));
        }
        let raw = self.store.read(start, len - 1)?;
        Ok(utils::split_nul(&raw))
    }
}

impl GramInfoSource for GramInfo {
    fn header(&self) -> &GramInfoHeader {
        &self.header
    }

    fn read_header(&self, offset: u32) -> Result<EntryHeader> {
        let start = u64::from(offset);
        if !self.store.contains(start, ENTRY_HEADER_SIZE as u64) {
            return Err(MorphyError::MalformedData(format!(
                "Entry header at {} lies outside the file",
                offset
            )));
        }
        let raw = self.store.read(start, ENTRY_HEADER_SIZE as u64)?;
        parse_entry_header(offset, &raw)
    }

    fn read_ancodes(&self, location: &EntryLocation) -> Result<Vec<Vec<u8>>> {
        self.read_region(location, u64::from(location.all_size), location.ancodes_size)
    }

    fn read_flexia_data(
        &self,
        location: &EntryLocation,
        only_base: bool,
    ) -> Result<Arc<Vec<Vec<u8>>>> {
        let size = if only_base {
            location.base_size
        } else {
            location.all_size
        };
        let flexias = self.read_region(location, 0, size)?;
        if flexias.len() % 2 != 0 {
            return Err(MorphyError::MalformedData(format!(
                "Entry at {} has an odd number ({}) of flexion endings",
                location.offset,
                flexias.len()
            )));
        }
        Ok(Arc::new(flexias))
    }

    fn read_all_offsets(&self) -> Result<Vec<u32>> {
        let mut offsets = Vec::with_capacity(self.header.flex_count as usize);
        let mut offset = u64::from(self.header.flex_offset);

        for _ in 0..self.header.flex_count {
            let current = u32::try_from(offset).map_err(|_| {
                MorphyError::MalformedData(format!("Entry offset {} overflows", offset))
            })?;
            let entry = self.read_header(current)?;
            offsets.push(current);

            let pad_at = offset + ENTRY_HEADER_SIZE as u64 + u64::from(entry.full_size);
            if !self.store.contains(pad_at, 1) {
                return Err(MorphyError::MalformedData(format!(
                    "Entry at {} has no padding byte",
                    current
                )));
            }
            let pad_len = u64::from(self.store.read(pad_at, 1)?[0]);
            offset = pad_at + 1 + pad_len;
        }

        trace!("Scanned {} graminfo entries", offsets.len());
        Ok(offsets)
    }
}

/// Memoizes [`GramInfoSource::read_flexia_data`] per `(offset, only_base)`.
///
/// Entries are never evicted: dictionaries are immutable and have a finite
/// number of entries, so the cache is bounded by the dictionary itself.
#[derive(Debug)]
pub struct CachedGramInfo<G> {
    inner: G,
    flexias: Mutex<HashMap<(u32, bool), Arc<Vec<Vec<u8>>>>>,
}

impl<G: GramInfoSource> CachedGramInfo<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            flexias: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Number of memoized flexion lists.
    pub fn cached_len(&self) -> usize {
        self.flexias.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl<G: GramInfoSource> GramInfoSource for CachedGramInfo<G> {
    fn header(&self) -> &GramInfoHeader {
        self.inner.header()
    }

    fn read_header(&self, offset: u32) -> Result<EntryHeader> {
        self.inner.read_header(offset)
    }

    fn read_ancodes(&self, location: &EntryLocation) -> Result<Vec<Vec<u8>>> {
        self.inner.read_ancodes(location)
    }

    fn read_flexia_data(
        &self,
        location: &EntryLocation,
        only_base: bool,
    ) -> Result<Arc<Vec<Vec<u8>>>> {
        let key = (location.offset, only_base);
        {
            let cache = self.flexias.lock().map_err(|_| MorphyError::LockPoisoned)?;
            if let Some(hit) = cache.get(&key) {
                trace!("Flexion cache hit for entry {} (base={})", key.0, only_base);
                return Ok(Arc::clone(hit));
            }
        }

        let flexias = self.inner.read_flexia_data(location, only_base)?;
        let mut cache = self.flexias.lock().map_err(|_| MorphyError::LockPoisoned)?;
        Ok(Arc::clone(cache.entry(key).or_insert(flexias)))
    }

    fn read_all_offsets(&self) -> Result<Vec<u32>> {
        self.inner.read_all_offsets()
    }
}
