//! Sparse transition layout.
//!
//! A state at index `s` owns slot `s`, holding its terminal transition, and
//! slot `s + 1 + c` for every byte `c`. Slots are shared between states, so a
//! slot only belongs to the state when it is not marked empty and its label
//! equals `c`.

use super::{Fsa, FsaCore, Trans};
use crate::morphy::types::error::Result;
use crate::morphy::types::models::FsaHeader;

const EMPTY_FLAG: u32 = 0x0200;
const DEST_SHIFT: u32 = 10;
const DEST_MASK: u32 = 0x3F_FFFF;

fn dest(trans: Trans) -> u64 {
    u64::from((trans.0 >> DEST_SHIFT) & DEST_MASK)
}

#[derive(Debug)]
pub struct SparseFsa {
    core: FsaCore,
}

impl SparseFsa {
    pub(crate) fn new(core: FsaCore) -> Self {
        Self { core }
    }
}

impl Fsa for SparseFsa {
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
        let slot = dest(state) + 1 + u64::from(label);
        Ok(self.core.read_trans(slot)?.filter(|trans| {
            trans.0 & EMPTY_FLAG == 0 && !trans.is_term() && trans.label() == label
        }))
    }

    fn annot_trans(&self, state: Trans) -> Result<Option<Trans>> {
        Ok(self
            .core
            .read_trans(dest(state))?
            .filter(|trans| trans.0 & EMPTY_FLAG == 0 && trans.is_term()))
    }

    fn read_annot(&self, trans: Trans) -> Result<Option<Vec<u8>>> {
        if !trans.is_term() {
            return Ok(None);
        }
        let rel = (u64::from(trans.label()) << 22) | dest(trans);
        self.core.read_annot_at(rel)
    }

    fn read_state(&self, state: Trans) -> Result<Vec<Trans>> {
        let mut transes = Vec::new();
        if let Some(term) = self.annot_trans(state)? {
            transes.push(term);
        }
        for &label in self.alphabet() {
            if let Some(trans) = self.step(state, label)? {
                transes.push(trans);
            }
        }
        Ok(transes)
    }
}
