//! Tree transition layout.
//!
//! A state's block optionally starts with its terminal transition (with the
//! no-left flag set when the state has no outgoing transitions), followed by
//! its outgoing transitions arranged as a binary search tree on the label in
//! implicit-heap order: node `idx` (1-based) has children `2 * idx` and
//! `2 * idx + 1`, and per-node flags say whether each child exists.

use log::warn;

use super::{Fsa, FsaCore, Trans};
use crate::morphy::types::error::Result;
use crate::morphy::types::models::FsaHeader;

const NO_LEFT_FLAG: u32 = 0x0200;
const NO_RIGHT_FLAG: u32 = 0x0400;
const DEST_SHIFT: u32 = 11;
const DEST_MASK: u32 = 0x1F_FFFF;
const MAX_PROBES: usize = 256;

fn dest(trans: Trans) -> u64 {
    u64::from((trans.0 >> DEST_SHIFT) & DEST_MASK)
}

fn has_left(trans: Trans) -> bool {
    trans.0 & NO_LEFT_FLAG == 0
}

fn has_right(trans: Trans) -> bool {
    trans.0 & NO_RIGHT_FLAG == 0
}

#[derive(Debug)]
pub struct TreeFsa {
    core: FsaCore,
}

impl TreeFsa {
    pub(crate) fn new(core: FsaCore) -> Self {
        Self { core }
    }

    /// Slot of the search tree's root node, skipping the terminal transition.
    /// `None` when the state has no outgoing transitions.
    fn tree_start(&self, state: Trans) -> Result<Option<u64>> {
        let start = dest(state);
        match self.core.read_trans(start)? {
            Some(first) if first.is_term() => {
                if has_left(first) {
                    Ok(Some(start + 1))
                } else {
                    Ok(None)
                }
            }
            Some(_) => Ok(Some(start)),
            None => Ok(None),
        }
    }

    fn node_slot(start: u64, idx: u64) -> Option<u64> {
        start.checked_add(idx - 1)
    }

    fn push_in_order(&self, start: u64, idx: u64, out: &mut Vec<Trans>) -> Result<()> {
        let Some(trans) = Self::node_slot(start, idx)
            .map(|slot| self.core.read_trans(slot))
            .transpose()?
            .flatten()
        else {
            return Ok(());
        };

        if has_left(trans) {
            if let Some(left) = idx.checked_mul(2) {
                self.push_in_order(start, left, out)?;
            }
        }
        out.push(trans);
        if has_right(trans) {
            if let Some(right) = idx.checked_mul(2).and_then(|i| i.checked_add(1)) {
                self.push_in_order(start, right, out)?;
            }
        }
        Ok(())
    }
}

impl Fsa for TreeFsa {
    fn header(&self) -> &FsaHeader {
        &self.core.header
    }

    fn alphabet(&self) -> &[u8] {
        &self.core.alphabet
    }

    fn root(&self) -> Trans {
        self.core.root
    }

    fn step(&self, state: Trans, label: u8) -> Result<Option<Trans>> {
        let Some(start) = self.tree_start(state)? else {
            return Ok(None);
        };

        let mut idx: u64 = 1;
        for _ in 0..MAX_PROBES {
            let Some(trans) = Self::node_slot(start, idx)
                .map(|slot| self.core.read_trans(slot))
                .transpose()?
                .flatten()
            else {
                return Ok(None);
            };

            let next = match trans.label().cmp(&label) {
                std::cmp::Ordering::Equal => return Ok(Some(trans)),
                std::cmp::Ordering::Greater if has_left(trans) => idx.checked_mul(2),
                std::cmp::Ordering::Less if has_right(trans) => {
                    idx.checked_mul(2).and_then(|i| i.checked_add(1))
                }
                _ => return Ok(None),
            };
            match next {
                Some(next) => idx = next,
                None => break,
            }
        }

        warn!("Search tree of state {:?} is corrupt", state);
        Ok(None)
    }

    fn annot_trans(&self, state: Trans) -> Result<Option<Trans>> {
        Ok(self.core.read_trans(dest(state))?.filter(|trans| trans.is_term()))
    }

    fn read_annot(&self, trans: Trans) -> Result<Option<Vec<u8>>> {
        if !trans.is_term() {
            return Ok(None);
        }
        let rel = (u64::from(trans.label()) << 21) | dest(trans);
        self.core.read_annot_at(rel)
    }

    fn read_state(&self, state: Trans) -> Result<Vec<Trans>> {
        let mut transes = Vec::new();
        if let Some(term) = self.annot_trans(state)? {
            transes.push(term);
        }
        if let Some(start) = self.tree_start(state)? {
            self.push_in_order(start, 1, &mut transes)?;
        }
        Ok(transes)
    }
}
