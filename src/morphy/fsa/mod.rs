//! # Automaton Engine
//!
//! Walks the finite-state automaton that maps dictionary words to their packed
//! annotations. Two transition-table layouts exist on disk; both implement
//! [`Fsa`] and are chosen once, from the header flags, by [`open`].
//!
//! A state is identified by the transition leading into it: the destination
//! field of a [`Trans`] is the state's index in the transition table. The
//! automaton's root is the destination of the transition stored in slot 1.
//!
//! ```text
//! Transition word (u32, little-endian):
//!   bits 0..8    label (or high bits of the annotation offset when terminal)
//!   bit  8       terminal: the transition points at an annotation
//!   sparse:      bit 9 empty slot,  bits 10..32 destination
//!   tree:        bit 9 no left,     bit 10 no right,   bits 11..32 destination
//! ```

use std::fmt;
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info, trace, warn};

use crate::morphy::format::fsa::{parse_header, FSA_HEADER_SIZE};
use crate::morphy::storage::ByteStore;
use crate::morphy::types::error::{MorphyError, Result};
use crate::morphy::types::models::{FsaHeader, FsaLayout};

mod sparse;
mod tree;

pub use sparse::SparseFsa;
pub use tree::TreeFsa;

const TERM_FLAG: u32 = 0x0100;
const ROOT_TRANS_INDEX: u64 = 1;

/// Depth limit for [`Fsa::collect`]; deeper paths are not enumerated.
pub const MAX_COLLECT_DEPTH: usize = 256;

/// A raw transition word.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Trans(pub u32);

impl Trans {
    pub fn label(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// True if this transition points at an annotation rather than a state.
    pub fn is_term(self) -> bool {
        self.0 & TERM_FLAG != 0
    }
}

impl fmt::Debug for Trans {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trans({:#010x})", self.0)
    }
}

/// Outcome of [`Fsa::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkResult {
    /// Every input byte was consumed.
    pub matched: bool,
    /// Number of bytes consumed before the walk stopped.
    pub consumed: usize,
    /// Deepest state reached, even when the walk failed.
    pub last: Trans,
    /// Annotation stored at the final state. `None` for a matched walk means
    /// the input is a known prefix but not a dictionary word.
    pub annot: Option<Vec<u8>>,
}

/// Read-only view of a compiled automaton.
///
/// Layouts implement the four primitive accessors; traversal is shared.
pub trait Fsa: Send + Sync + fmt::Debug {
    fn header(&self) -> &FsaHeader;

    /// Bytes of the alphabet section.
    fn alphabet(&self) -> &[u8];

    /// Transition leading into the root state.
    fn root(&self) -> Trans;

    /// Follows the outgoing transition of `state` labelled `label`.
    ///
    /// Returns `None` if there is none, including when a corrupt pointer
    /// leads outside the transition table.
    fn step(&self, state: Trans, label: u8) -> Result<Option<Trans>>;

    /// Terminal transition of `state`, if the state carries an annotation.
    fn annot_trans(&self, state: Trans) -> Result<Option<Trans>>;

    /// Annotation payload referenced by a terminal transition.
    fn read_annot(&self, trans: Trans) -> Result<Option<Vec<u8>>>;

    /// All transitions of `state`: the terminal one first, then outgoing
    /// transitions in label order.
    fn read_state(&self, state: Trans) -> Result<Vec<Trans>>;

    /// Consumes `word` byte by byte starting at `start`.
    fn walk(&self, start: Trans, word: &[u8], read_annot: bool) -> Result<WalkResult> {
        let mut last = start;
        for (consumed, &byte) in word.iter().enumerate() {
            match self.step(last, byte)? {
                Some(next) => last = next,
                None => {
                    return Ok(WalkResult {
                        matched: false,
                        consumed,
                        last,
                        annot: None,
                    })
                }
            }
        }

        let annot = if read_annot {
            self.get_annot(last)?
        } else {
            None
        };
        Ok(WalkResult {
            matched: true,
            consumed: word.len(),
            last,
            annot,
        })
    }

    /// Annotation payload stored at `state`, without walking.
    fn get_annot(&self, state: Trans) -> Result<Option<Vec<u8>>> {
        match self.annot_trans(state)? {
            Some(trans) => self.read_annot(trans),
            None => Ok(None),
        }
    }

    /// Depth-first enumeration of every annotated state reachable from `state`.
    ///
    /// `callback` receives the path from `state` (appended to `prefix`) and the
    /// annotation, which is `None` when `read_annot` is false. Enumeration
    /// stops as soon as the callback returns false. Returns the number of
    /// annotated states visited.
    fn collect(
        &self,
        state: Trans,
        callback: &mut dyn FnMut(&[u8], Option<&[u8]>) -> bool,
        read_annot: bool,
        prefix: &[u8],
    ) -> Result<usize> {
        struct Frame {
            transes: Vec<Trans>,
            next: usize,
        }

        let mut total = 0;
        let mut path = prefix.to_vec();
        let mut stack = vec![Frame {
            transes: self.read_state(state)?,
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(&trans) = frame.transes.get(frame.next) else {
                stack.pop();
                if !stack.is_empty() {
                    path.pop();
                }
                continue;
            };
            frame.next += 1;

            if trans.is_term() {
                total += 1;
                let annot = if read_annot {
                    self.read_annot(trans)?
                } else {
                    None
                };
                if !callback(&path, annot.as_deref()) {
                    trace!("Collection stopped by callback after {} items", total);
                    return Ok(total);
                }
            } else if stack.len() <= MAX_COLLECT_DEPTH {
                let transes = self.read_state(trans)?;
                path.push(trans.label());
                stack.push(Frame { transes, next: 0 });
            }
        }

        Ok(total)
    }
}

/// Opens an automaton, validating its header and dispatching on the layout flag.
pub fn open(store: Arc<dyn ByteStore>) -> Result<Arc<dyn Fsa>> {
    let header_len = store.size().min(FSA_HEADER_SIZE as u64);
    let header = parse_header(&store.read(0, header_len)?)?;
    let core = FsaCore::load(store, header)?;

    info!(
        "Automaton opened: {} layout, {} transitions, alphabet of {} bytes",
        core.header.layout,
        core.header.transes_count,
        core.alphabet.len()
    );

    Ok(match core.header.layout {
        FsaLayout::Sparse => Arc::new(SparseFsa::new(core)),
        FsaLayout::Tree => Arc::new(TreeFsa::new(core)),
    })
}

/// Storage access shared by both layouts, with bounds checks on every read.
#[derive(Debug)]
pub(crate) struct FsaCore {
    store: Arc<dyn ByteStore>,
    header: FsaHeader,
    alphabet: Vec<u8>,
    root: Trans,
    fsa_end: u64,
}

impl FsaCore {
    fn load(store: Arc<dyn ByteStore>, header: FsaHeader) -> Result<Self> {
        let alphabet_offset = u64::from(header.alphabet_offset);
        let alphabet_size = u64::from(header.alphabet_size);
        if !store.contains(alphabet_offset, alphabet_size) {
            return Err(MorphyError::InvalidFormat(format!(
                "Alphabet section [{}..{}] exceeds file size {}",
                alphabet_offset,
                alphabet_offset + alphabet_size,
                store.size()
            )));
        }
        let alphabet = store.read(alphabet_offset, alphabet_size)?.into_owned();

        let fsa_offset = u64::from(header.fsa_offset);
        let annot_offset = u64::from(header.annot_offset);
        let fsa_end = if annot_offset > fsa_offset {
            annot_offset.min(store.size())
        } else {
            store.size()
        };

        let mut core = Self {
            store,
            header,
            alphabet,
            root: Trans(0),
            fsa_end,
        };
        core.root = core.read_trans(ROOT_TRANS_INDEX)?.ok_or_else(|| {
            MorphyError::InvalidFormat("Automaton has no root transition".to_string())
        })?;
        debug!("Root transition: {:?}", core.root);

        Ok(core)
    }

    /// Reads the transition in slot `index`, or `None` if the slot lies
    /// outside the transition table.
    fn read_trans(&self, index: u64) -> Result<Option<Trans>> {
        let offset = index
            .checked_mul(4)
            .and_then(|rel| rel.checked_add(u64::from(self.header.fsa_offset)));
        let offset = match offset {
            Some(offset) if offset.saturating_add(4) <= self.fsa_end => offset,
            _ => {
                warn!("Transition slot {} lies outside the automaton", index);
                return Ok(None);
            }
        };
        let raw = self.store.read(offset, 4)?;
        Ok(Some(Trans(LittleEndian::read_u32(&raw))))
    }

    /// Reads the length-prefixed annotation at `rel` bytes into the annotation section.
    fn read_annot_at(&self, rel: u64) -> Result<Option<Vec<u8>>> {
        let offset = u64::from(self.header.annot_offset) + rel;
        if !self.store.contains(offset, 1) {
            warn!("Annotation offset {} lies outside the automaton", offset);
            return Ok(None);
        }
        let len = u64::from(self.store.read(offset, 1)?[0]);
        if len == 0 {
            return Ok(None);
        }
        if !self.store.contains(offset + 1, len) {
            warn!("Annotation at {} ({} bytes) is truncated", offset, len);
            return Ok(None);
        }
        Ok(Some(self.store.read(offset + 1, len)?.into_owned()))
    }
}
