//! Data structures representing the dictionary file components and query results.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Flag bits of the automaton header.
///
/// Bit 0x01: tree layout
/// Bit 0x02: hash layout (unsupported)
/// Bit 0x04: sparse layout
/// Bit 0x08: big-endian transitions (unsupported)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FsaFlags {
    pub is_tree: bool,
    pub is_hash: bool,
    pub is_sparse: bool,
    pub is_be: bool,
}

impl From<u32> for FsaFlags {
    fn from(raw: u32) -> Self {
        Self {
            is_tree: raw & 0x01 != 0,
            is_hash: raw & 0x02 != 0,
            is_sparse: raw & 0x04 != 0,
            is_be: raw & 0x08 != 0,
        }
    }
}

/// On-disk encoding of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsaLayout {
    Sparse,
    Tree,
}

impl fmt::Display for FsaLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsaLayout::Sparse => write!(f, "sparse"),
            FsaLayout::Tree => write!(f, "tree"),
        }
    }
}

/// Parsed and validated 60-byte automaton header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsaHeader {
    pub layout: FsaLayout,
    pub flags: FsaFlags,
    pub alphabet_offset: u32,
    pub fsa_offset: u32,
    pub annot_offset: u32,
    pub alphabet_size: u32,
    pub transes_count: u32,
    pub annot_chunks_count: u32,
}

/// Parsed 128-byte grammatical-information file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GramInfoHeader {
    pub version: u32,
    pub flex_count: u32,
    pub flex_offset: u32,
    pub flex_size: u32,
    pub language: String,
    pub codepage: String,
}

/// Where a grammatical-information entry lives and how its payload is split.
///
/// Both annotation records and entry headers carry one of these; it is all the
/// store needs to read flexions or ancodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryLocation {
    pub offset: u32,
    pub base_size: u16,
    pub all_size: u16,
    pub ancodes_size: u16,
}

/// The 10-byte header stored in front of every grammatical-information entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    pub id: u16,
    pub freq: u16,
    pub full_size: u16,
    pub location: EntryLocation,
}

/// One decoded annotation record.
///
/// Dictionary automata store 15-byte records; prediction automata store 16-byte
/// records that carry `freq` and `pos_id` instead of the prefix lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotRecord {
    pub location: EntryLocation,
    pub ancode: [u8; 2],
    /// Length of the trailing inflection removed to expose the stem.
    pub flen: u8,
    /// Length of the known prefix consumed before the stem.
    pub plen: u8,
    /// Length of the unknown/common prefix (prediction only).
    pub cplen: u8,
    pub freq: u16,
    pub pos_id: u8,
}

/// Deduplicated set of surface forms, in dictionary codepage bytes.
pub type FormSet = BTreeSet<Vec<u8>>;

/// Per-word results of a batch query; `None` marks a word that was not found.
pub type BatchResult<T> = BTreeMap<Vec<u8>, Option<T>>;

/// Forms and grammatical codes produced by one annotation record.
///
/// `common` and `all` hold raw ancode strings until a gramtab decorator
/// replaces them with rendered tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormsWithGramInfo {
    pub common: Vec<u8>,
    pub all: Vec<Vec<u8>>,
    pub forms: FormSet,
}

/// Decoded form of [`FormsWithGramInfo`] handed out by the facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordGramInfo {
    pub common: String,
    pub all: Vec<String>,
    pub forms: Vec<String>,
}
