//! # GramTab Resolver
//!
//! Renders 2-byte ancodes as part-of-speech and grammeme tags.

use std::fmt;

use log::info;

use crate::morphy::format::gramtab::{self, GramTabData};
use crate::morphy::storage::ByteStore;
use crate::morphy::types::error::{MorphyError, Result};

/// Formats one `(pos, grammems)` pair and joins the formatted pairs.
pub trait TagBuilder: Send + Sync + fmt::Debug {
    fn build(&self, pos: &[u8], grammems: &[u8]) -> Vec<u8>;
    fn join(&self, parts: Vec<Vec<u8>>) -> Vec<u8>;
}

/// `"<pos> <grammems>"`, or just the grammems when there is no part of speech,
/// joined with a separator (`;` by default).
#[derive(Debug, Clone)]
pub struct StandardTagBuilder {
    separator: Vec<u8>,
}

impl StandardTagBuilder {
    pub fn new(separator: impl Into<Vec<u8>>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for StandardTagBuilder {
    fn default() -> Self {
        Self::new(";")
    }
}

impl TagBuilder for StandardTagBuilder {
    fn build(&self, pos: &[u8], grammems: &[u8]) -> Vec<u8> {
        if pos.is_empty() {
            return grammems.to_vec();
        }
        let mut tag = Vec::with_capacity(pos.len() + 1 + grammems.len());
        tag.extend_from_slice(pos);
        tag.push(b' ');
        tag.extend_from_slice(grammems);
        tag
    }

    fn join(&self, parts: Vec<Vec<u8>>) -> Vec<u8> {
        parts.join(self.separator.as_slice())
    }
}

#[derive(Debug)]
pub struct GramTab {
    data: GramTabData,
    builder: Box<dyn TagBuilder>,
}

impl GramTab {
    pub fn new(data: GramTabData, builder: Box<dyn TagBuilder>) -> Self {
        Self { data, builder }
    }

    /// Deserializes a gramtab blob.
    pub fn from_bytes(raw: &[u8], builder: Box<dyn TagBuilder>) -> Result<Self> {
        Ok(Self::new(gramtab::decode(raw)?, builder))
    }

    /// Reads and deserializes the whole store.
    pub fn open(store: &dyn ByteStore, builder: Box<dyn TagBuilder>) -> Result<Self> {
        let raw = store.read(0, store.size())?;
        let gramtab = Self::from_bytes(&raw, builder)?;
        info!(
            "Gramtab loaded: {} ancodes, {} parts of speech, {} grammeme sets",
            gramtab.data.index.len(),
            gramtab.data.poses.len(),
            gramtab.data.grammems.len()
        );
        Ok(gramtab)
    }

    /// Renders a concatenation of 2-byte ancodes.
    ///
    /// Empty input renders as an empty string. An ancode missing from the
    /// index is an error: the gramtab does not belong to the dictionary.
    pub fn resolve(&self, ancodes: &[u8]) -> Result<Vec<u8>> {
        if ancodes.is_empty() {
            return Ok(Vec::new());
        }

        let parts = ancodes
            .chunks(2)
            .map(|ancode| {
                let combined = *self
                    .data
                    .index
                    .get(ancode)
                    .ok_or_else(|| MorphyError::UnknownAncode(ancode.to_vec()))?;
                let pos = self.lookup_pos(usize::from(combined & 0xFF));
                let grammems = self.lookup_grammems(usize::from(combined >> 8));
                Ok(self.builder.build(pos, grammems))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self.builder.join(parts))
    }

    // A missing entry renders as empty, the way the compiler's own reader does.
    fn lookup_pos(&self, idx: usize) -> &[u8] {
        self.data.poses.get(&idx).map(Vec::as_slice).unwrap_or_default()
    }

    fn lookup_grammems(&self, idx: usize) -> &[u8] {
        self.data
            .grammems
            .get(&idx)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
