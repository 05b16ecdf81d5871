//! In-process writer for small synthetic dictionaries.
//!
//! Produces the same on-disk layouts the reader consumes: automata in either
//! transition layout, grammatical-information files and serialized gramtabs.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use encoding_rs::Encoding;
use morphy_reader::morphy::fsa::{self, Fsa};
use morphy_reader::morphy::graminfo::GramInfo;
use morphy_reader::morphy::storage::MemStore;
use morphy_reader::morphy::types::models::EntryLocation;

pub const LANG: &str = "test";
pub const CODEPAGE: &str = "windows-1251";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Sparse,
    Tree,
}

pub const LAYOUTS: [Layout; 2] = [Layout::Sparse, Layout::Tree];

// =============================================================================
// AUTOMATON
// =============================================================================

const TERM: u32 = 0x0100;
const SPARSE_EMPTY: u32 = 0x0200;
const TREE_NO_LEFT: u32 = 0x0200;
const TREE_NO_RIGHT: u32 = 0x0400;
const SPARSE_BLOCK: usize = 257;

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<u8, usize>,
    annot: Option<Vec<u8>>,
}

/// Trie of words, each carrying a concatenation of annotation records.
#[derive(Debug)]
pub struct FsaWriter {
    nodes: Vec<Node>,
}

impl Default for FsaWriter {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }
}

impl FsaWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `records` to the annotation of `word`.
    pub fn insert(&mut self, word: &[u8], records: &[u8]) -> &mut Self {
        let mut node = 0;
        for &byte in word {
            node = match self.nodes[node].children.get(&byte) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].children.insert(byte, child);
                    child
                }
            };
        }
        self.nodes[node]
            .annot
            .get_or_insert_with(Vec::new)
            .extend_from_slice(records);
        self
    }

    pub fn build(&self, layout: Layout) -> Vec<u8> {
        let alphabet: Vec<u8> = self
            .nodes
            .iter()
            .flat_map(|node| node.children.keys().copied())
            .collect::<BTreeSet<u8>>()
            .into_iter()
            .collect();

        let mut annots = Vec::new();
        let annot_rel: Vec<Option<u32>> = self
            .nodes
            .iter()
            .map(|node| {
                node.annot.as_ref().map(|annot| {
                    let rel = annots.len() as u32;
                    annots.push(annot.len() as u8);
                    annots.extend_from_slice(annot);
                    rel
                })
            })
            .collect();

        let transes = match layout {
            Layout::Sparse => self.sparse_transes(&annot_rel),
            Layout::Tree => self.tree_transes(&annot_rel),
        };

        let fsa_offset = 60 + alphabet.len();
        let annot_offset = fsa_offset + transes.len() * 4;
        let flags = match layout {
            Layout::Sparse => 0x04,
            Layout::Tree => 0x01,
        };

        let mut out = b"meal".to_vec();
        let fields = [
            2,
            flags,
            60,
            fsa_offset as u32,
            annot_offset as u32,
            alphabet.len() as u32,
            transes.len() as u32,
            1,
            1,
            annot_rel.iter().flatten().count() as u32,
            1,
            0,
            3,
            0,
        ];
        for field in fields {
            out.extend_from_slice(&field.to_le_bytes());
        }
        out.extend_from_slice(&alphabet);
        for trans in transes {
            out.extend_from_slice(&trans.to_le_bytes());
        }
        out.extend_from_slice(&annots);
        out
    }

    /// One 257-slot block per state, starting at slot 2.
    fn sparse_transes(&self, annot_rel: &[Option<u32>]) -> Vec<u32> {
        let start = |node: usize| (2 + node * SPARSE_BLOCK) as u32;
        let mut transes = vec![SPARSE_EMPTY; 2 + self.nodes.len() * SPARSE_BLOCK];
        transes[0] = 0;
        transes[1] = start(0) << 10;

        for (idx, node) in self.nodes.iter().enumerate() {
            let base = start(idx) as usize;
            if let Some(rel) = annot_rel[idx] {
                transes[base] = TERM | ((rel >> 22) & 0xFF) | ((rel & 0x3F_FFFF) << 10);
            }
            for (&label, &child) in &node.children {
                transes[base + 1 + label as usize] = (start(child) << 10) | u32::from(label);
            }
        }
        transes
    }

    /// Optional terminal transition followed by a balanced search tree in
    /// implicit-heap order.
    fn tree_transes(&self, annot_rel: &[Option<u32>]) -> Vec<u32> {
        let placements: Vec<Vec<Placed>> = self
            .nodes
            .iter()
            .map(|node| {
                let children: Vec<(u8, usize)> =
                    node.children.iter().map(|(&l, &c)| (l, c)).collect();
                let mut placed = Vec::new();
                place(&children, 1, &mut placed);
                placed
            })
            .collect();

        let mut starts = Vec::with_capacity(self.nodes.len());
        let mut next = 2usize;
        for (idx, placed) in placements.iter().enumerate() {
            starts.push(next);
            let tree_len = placed.iter().map(|p| p.idx).max().unwrap_or(0);
            next += usize::from(annot_rel[idx].is_some()) + tree_len;
        }

        let mut transes = vec![TREE_NO_LEFT | TREE_NO_RIGHT; next];
        transes[0] = 0;
        transes[1] = (starts[0] as u32) << 11;

        for (idx, placed) in placements.iter().enumerate() {
            let mut pos = starts[idx];
            if let Some(rel) = annot_rel[idx] {
                let mut term = TERM | ((rel >> 21) & 0xFF) | ((rel & 0x1F_FFFF) << 11);
                if placed.is_empty() {
                    term |= TREE_NO_LEFT;
                }
                transes[pos] = term;
                pos += 1;
            }
            for p in placed {
                let mut trans = ((starts[p.child] as u32) << 11) | u32::from(p.label);
                if !p.has_left {
                    trans |= TREE_NO_LEFT;
                }
                if !p.has_right {
                    trans |= TREE_NO_RIGHT;
                }
                transes[pos + p.idx - 1] = trans;
            }
        }
        transes
    }
}

struct Placed {
    idx: usize,
    label: u8,
    child: usize,
    has_left: bool,
    has_right: bool,
}

fn place(sorted: &[(u8, usize)], idx: usize, out: &mut Vec<Placed>) {
    if sorted.is_empty() {
        return;
    }
    let mid = sorted.len() / 2;
    let (label, child) = sorted[mid];
    out.push(Placed {
        idx,
        label,
        child,
        has_left: mid > 0,
        has_right: mid + 1 < sorted.len(),
    });
    place(&sorted[..mid], idx * 2, out);
    place(&sorted[mid + 1..], idx * 2 + 1, out);
}

// =============================================================================
// ANNOTATION RECORDS
// =============================================================================

fn push_location(out: &mut Vec<u8>, location: &EntryLocation) {
    out.extend_from_slice(&location.offset.to_le_bytes());
    out.extend_from_slice(&location.base_size.to_le_bytes());
    out.extend_from_slice(&location.all_size.to_le_bytes());
    out.extend_from_slice(&location.ancodes_size.to_le_bytes());
}

/// 15-byte dictionary record.
pub fn common_record(
    location: &EntryLocation,
    ancode: &str,
    flen: u8,
    plen: u8,
    cplen: u8,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(15);
    push_location(&mut out, location);
    out.extend_from_slice(ancode.as_bytes());
    out.extend_from_slice(&[flen, plen, cplen]);
    out
}

/// 16-byte prediction record.
pub fn predict_record(
    location: &EntryLocation,
    ancode: &str,
    freq: u16,
    flen: u8,
    pos_id: u8,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    push_location(&mut out, location);
    out.extend_from_slice(ancode.as_bytes());
    out.extend_from_slice(&freq.to_le_bytes());
    out.extend_from_slice(&[flen, pos_id]);
    out
}

// =============================================================================
// GRAMINFO
// =============================================================================

/// Writes a grammatical-information file; strings go through `encoding`.
pub struct GramInfoWriter {
    encoding: &'static Encoding,
    language: String,
    codepage: String,
    body: Vec<u8>,
    count: u32,
}

impl GramInfoWriter {
    pub const HEADER_SIZE: usize = 128;

    pub fn new(encoding: &'static Encoding, language: &str, codepage: &str) -> Self {
        Self {
            encoding,
            language: language.to_string(),
            codepage: codepage.to_string(),
            body: Vec::new(),
            count: 0,
        }
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        self.encoding.encode(text).0.into_owned()
    }

    fn region<'a>(&self, parts: impl IntoIterator<Item = &'a str>) -> Vec<u8> {
        let mut out = Vec::new();
        for part in parts {
            out.extend(self.encode(part));
            out.push(0);
        }
        out
    }

    /// Adds an entry and returns where it lives.
    pub fn add(
        &mut self,
        base: &[(&str, &str)],
        others: &[(&str, &str)],
        ancodes: &[&str],
    ) -> EntryLocation {
        let base_region = self.region(base.iter().flat_map(|&(b, a)| [b, a]));
        let other_region = self.region(others.iter().flat_map(|&(b, a)| [b, a]));
        let ancodes_region = self.region(ancodes.iter().copied());

        let base_size = base_region.len() as u16;
        let all_size = (base_region.len() + other_region.len()) as u16;
        let ancodes_size = ancodes_region.len() as u16;
        let full_size = all_size + ancodes_size;

        let offset = (Self::HEADER_SIZE + self.body.len()) as u32;
        let id = self.count as u16;
        for field in [id, 1, all_size, full_size, base_size] {
            self.body.extend_from_slice(&field.to_le_bytes());
        }
        self.body.extend(base_region);
        self.body.extend(other_region);
        self.body.extend(ancodes_region);

        let pad = (4 - (10 + usize::from(full_size) + 1) % 4) % 4;
        self.body.push(pad as u8);
        self.body.extend(std::iter::repeat(0xEE).take(pad));
        self.count += 1;

        EntryLocation {
            offset,
            base_size,
            all_size,
            ancodes_size,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::HEADER_SIZE];
        out[0..4].copy_from_slice(&2u32.to_le_bytes());
        out[8..12].copy_from_slice(&self.count.to_le_bytes());
        out[12..16].copy_from_slice(&(Self::HEADER_SIZE as u32).to_le_bytes());
        out[16..20].copy_from_slice(&(self.body.len() as u32).to_le_bytes());

        let mut pos = 20;
        for text in [&self.language, &self.codepage] {
            out[pos] = text.len() as u8;
            out[pos + 1..pos + 1 + text.len()].copy_from_slice(text.as_bytes());
            pos += 1 + text.len();
        }
        out.extend_from_slice(&self.body);
        out
    }
}

// =============================================================================
// GRAMTAB
// =============================================================================

fn php_string(out: &mut Vec<u8>, value: &[u8]) {
    out.extend_from_slice(format!("s:{}:\"", value.len()).as_bytes());
    out.extend_from_slice(value);
    out.extend_from_slice(b"\";");
}

fn php_table(out: &mut Vec<u8>, name: &str, items: &[(usize, &str)]) {
    php_string(out, name.as_bytes());
    out.extend_from_slice(format!("a:{}:{{", items.len()).as_bytes());
    for (idx, text) in items {
        out.extend_from_slice(format!("i:{};", idx).as_bytes());
        php_string(out, text.as_bytes());
    }
    out.push(b'}');
}

/// Serializes a gramtab the way the dictionary compiler does.
pub fn gramtab_blob(
    index: &[(&str, u16)],
    poses: &[(usize, &str)],
    grammems: &[(usize, &str)],
) -> Vec<u8> {
    let mut out = b"a:3:{".to_vec();
    php_string(&mut out, b"index");
    out.extend_from_slice(format!("a:{}:{{", index.len()).as_bytes());
    for (ancode, combined) in index {
        php_string(&mut out, ancode.as_bytes());
        out.extend_from_slice(format!("i:{};", combined).as_bytes());
    }
    out.push(b'}');
    php_table(&mut out, "poses", poses);
    php_table(&mut out, "grammems", grammems);
    out.push(b'}');
    out
}

// =============================================================================
// SAMPLE DICTIONARY
// =============================================================================

/// Entries of the sample dictionary.
#[derive(Debug, Clone, Copy)]
pub struct Entries {
    /// `X`, `XS`
    pub noun: EntryLocation,
    /// `X`, `XS`, `XED`, `XING`
    pub regular_verb: EntryLocation,
    /// `SEE`, `SEES`, `SAW`, `SEEN` around the stem `S`
    pub see: EntryLocation,
    /// `X`, `NAIX`
    pub prefixed: EntryLocation,
    /// `X`, `XА`, `XЫ`
    pub cyrillic_noun: EntryLocation,
}

/// The four files of a compiled dictionary.
#[derive(Debug, Clone)]
pub struct Dictionary {
    pub common: Vec<u8>,
    pub predict: Vec<u8>,
    pub graminfo: Vec<u8>,
    pub gramtab: Vec<u8>,
    pub entries: Entries,
}

/// Every word stored in the sample dictionary.
pub const DICT_WORDS: &[&str] = &[
    "CAT", "CATS", "DOG", "DOGS", "KING", "KINGS", "WALK", "WALKS", "WALKED", "WALKING", "TALK",
    "TALKS", "TALKED", "TALKING", "SEE", "SEES", "SAW", "SEEN", "SAWS", "BOL", "NAIBOL", "КОТ",
    "КОТА", "КОТЫ",
];

pub fn encode(text: &str) -> Vec<u8> {
    encoding_rs::WINDOWS_1251.encode(text).0.into_owned()
}

pub fn sample_dictionary(layout: Layout) -> Dictionary {
    let mut graminfo = GramInfoWriter::new(encoding_rs::WINDOWS_1251, LANG, CODEPAGE);
    let entries = Entries {
        noun: graminfo.add(&[("", "")], &[("", "S")], &["aa", "ab"]),
        regular_verb: graminfo.add(
            &[("", "")],
            &[("", "S"), ("", "ED"), ("", "ING")],
            &["ba", "bb", "bc", "bd"],
        ),
        see: graminfo.add(
            &[("", "EE")],
            &[("", "EES"), ("", "AW"), ("", "EEN")],
            &["ba", "bb", "bc", "be"],
        ),
        prefixed: graminfo.add(&[("", "")], &[("NAI", "")], &["ca", "cb"]),
        cyrillic_noun: graminfo.add(&[("", "")], &[("", "А"), ("", "Ы")], &["aa", "ac", "ab"]),
    };

    let Entries {
        noun,
        regular_verb: verb,
        see,
        prefixed,
        cyrillic_noun: kot,
    } = entries;

    let mut common = FsaWriter::new();
    for stem in ["CAT", "DOG", "KING"] {
        common.insert(stem.as_bytes(), &common_record(&noun, "aa", 0, 0, 0));
        common.insert(format!("{}S", stem).as_bytes(), &common_record(&noun, "ab", 1, 0, 0));
    }
    for stem in ["WALK", "TALK"] {
        common.insert(stem.as_bytes(), &common_record(&verb, "ba", 0, 0, 0));
        common.insert(format!("{}S", stem).as_bytes(), &common_record(&verb, "bb", 1, 0, 0));
        common.insert(format!("{}ED", stem).as_bytes(), &common_record(&verb, "bc", 2, 0, 0));
        common.insert(format!("{}ING", stem).as_bytes(), &common_record(&verb, "bd", 3, 0, 0));
    }
    common
        .insert(b"SEE", &common_record(&see, "ba", 2, 0, 0))
        .insert(b"SEES", &common_record(&see, "bb", 3, 0, 0))
        .insert(b"SAW", &common_record(&see, "bc", 2, 0, 0))
        .insert(b"SAW", &common_record(&noun, "aa", 0, 0, 0))
        .insert(b"SEEN", &common_record(&see, "be", 3, 0, 0))
        .insert(b"SAWS", &common_record(&noun, "ab", 1, 0, 0))
        .insert(b"BOL", &common_record(&prefixed, "ca", 0, 0, 0))
        .insert(b"NAIBOL", &common_record(&prefixed, "cb", 0, 3, 0))
        .insert(&encode("КОТ"), &common_record(&kot, "aa", 0, 0, 0))
        .insert(&encode("КОТА"), &common_record(&kot, "ac", 1, 0, 0))
        .insert(&encode("КОТЫ"), &common_record(&kot, "ab", 1, 0, 0));

    let mut predict = FsaWriter::new();
    predict
        .insert(b"GNIKLAW", &predict_record(&verb, "bd", 10, 3, 1))
        .insert(b"GNIKLAT", &predict_record(&verb, "bd", 5, 3, 1))
        .insert(b"DEKLAW", &predict_record(&verb, "bc", 4, 2, 1))
        .insert(b"GNIK", &predict_record(&noun, "aa", 3, 0, 2))
        .insert(b"STAC", &predict_record(&noun, "ab", 7, 1, 2));

    let gramtab = gramtab_blob(
        &[
            ("aa", 0x0001),
            ("ab", 0x0101),
            ("ac", 0x0201),
            ("ba", 0x0302),
            ("bb", 0x0402),
            ("bc", 0x0502),
            ("bd", 0x0602),
            ("be", 0x0702),
            ("ca", 0x0001),
            ("cb", 0x0800),
        ],
        &[(0, ""), (1, "NOUN"), (2, "VERB")],
        &[
            (0, "sg,nom"),
            (1, "pl,nom"),
            (2, "sg,gen"),
            (3, "inf"),
            (4, "pres,3p"),
            (5, "past"),
            (6, "ger"),
            (7, "part"),
            (8, "perf"),
        ],
    );

    Dictionary {
        common: common.build(layout),
        predict: predict.build(layout),
        graminfo: graminfo.build(),
        gramtab,
        entries,
    }
}

/// Writes the dictionary as `<kind>.<lang>.bin` files into `dir`.
pub fn write_bundle(dir: &Path, dict: &Dictionary) {
    for (kind, bytes) in [
        ("common_aut", &dict.common),
        ("predict_aut", &dict.predict),
        ("morph_data", &dict.graminfo),
        ("gramtab", &dict.gramtab),
    ] {
        fs::write(dir.join(format!("{}.{}.bin", kind, LANG)), bytes).unwrap();
    }
}

pub fn open_fsa(bytes: &[u8]) -> Arc<dyn Fsa> {
    fsa::open(Arc::new(MemStore::new(bytes.to_vec()))).unwrap()
}

pub fn open_graminfo(bytes: &[u8]) -> GramInfo {
    GramInfo::open(Arc::new(MemStore::new(bytes.to_vec()))).unwrap()
}

pub fn words(list: &[&str]) -> Vec<Vec<u8>> {
    list.iter().map(|word| encode(word)).collect()
}
