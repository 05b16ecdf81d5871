//! Prediction for words missing from the dictionary.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};

use super::RecordFinder;
use crate::morphy::format::annot::{decode_common, decode_predict};
use crate::morphy::fsa::{Fsa, Trans};
use crate::morphy::graminfo::GramInfoSource;
use crate::morphy::types::error::{MorphyError, Result};
use crate::morphy::types::models::AnnotRecord;

/// Guesses by dropping leading bytes until the rest is a dictionary word.
///
/// The dropped bytes become the unknown prefix (`cplen`) of every record, so
/// composed forms keep them in front.
#[derive(Debug, Clone)]
pub struct PredictBySuffix {
    fsa: Arc<dyn Fsa>,
    graminfo: Arc<dyn GramInfoSource>,
    root: Trans,
    min_suffix_len: usize,
}

impl PredictBySuffix {
    pub const DEFAULT_MIN_SUFFIX_LEN: usize = 4;

    pub fn new(
        fsa: Arc<dyn Fsa>,
        graminfo: Arc<dyn GramInfoSource>,
        min_suffix_len: usize,
    ) -> Self {
        let root = fsa.root();
        Self {
            fsa,
            graminfo,
            root,
            min_suffix_len,
        }
    }
}

impl RecordFinder for PredictBySuffix {
    fn graminfo(&self) -> &dyn GramInfoSource {
        self.graminfo.as_ref()
    }

    fn find_records(&self, word: &[u8]) -> Result<Option<Vec<AnnotRecord>>> {
        for skip in 1..word.len() {
            if word.len() - skip < self.min_suffix_len {
                break;
            }
            // cplen is a single byte
            let Ok(cplen) = u8::try_from(skip) else {
                break;
            };

            let walk = self.fsa.walk(self.root, &word[skip..], true)?;
            let Some(annot) = walk.annot.filter(|_| walk.matched) else {
                continue;
            };

            trace!("Suffix prediction matched after skipping {} bytes", skip);
            let mut records = decode_common(&annot)?;
            for record in &mut records {
                record.cplen = cplen;
            }
            return Ok(Some(records));
        }
        Ok(None)
    }
}

/// Accumulates prediction records found by [`Fsa::collect`].
///
/// Keeps one record per part of speech, the most frequent one, and at most
/// `limit` records in total. Stops the enumeration once more than `limit`
/// annotations have been visited.
#[derive(Debug)]
pub struct Collector {
    limit: usize,
    collected: usize,
    items: Vec<AnnotRecord>,
    used_poses: HashMap<u8, usize>,
    error: Option<MorphyError>,
}

impl Collector {
    pub const DEFAULT_LIMIT: usize = 32;

    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            collected: 0,
            items: Vec::new(),
            used_poses: HashMap::new(),
            error: None,
        }
    }

    /// Callback for [`Fsa::collect`]. Returns false to stop the enumeration.
    pub fn collect(&mut self, annot: Option<&[u8]>) -> bool {
        if self.collected > self.limit {
            return false;
        }
        let Some(annot) = annot else {
            return true;
        };

        let records = match decode_predict(annot) {
            Ok(records) => records,
            Err(err) => {
                self.error = Some(err);
                return false;
            }
        };

        for mut record in records {
            record.cplen = 0;
            record.plen = 0;

            match self.used_poses.get(&record.pos_id) {
                Some(&idx) => {
                    if record.freq > self.items[idx].freq {
                        self.items[idx] = record;
                    }
                }
                None if self.items.len() < self.limit => {
                    self.used_poses.insert(record.pos_id, self.items.len());
                    self.items.push(record);
                }
                None => {}
            }
        }

        self.collected += 1;
        true
    }

    pub fn items(&self) -> &[AnnotRecord] {
        &self.items
    }

    /// The collected records, or the decoding error that stopped collection.
    pub fn into_items(self) -> Result<Vec<AnnotRecord>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.items),
        }
    }
}

/// Guesses from an automaton compiled over reversed dictionary words.
///
/// The annotation of the deepest state reached by the reversed word is used
/// as is, whether or not the whole word matched. Only when that state carries
/// none and at least `min_postfix_match` trailing bytes matched are the
/// annotations below it collected.
#[derive(Debug, Clone)]
pub struct PredictByDatabase {
    fsa: Arc<dyn Fsa>,
    graminfo: Arc<dyn GramInfoSource>,
    root: Trans,
    min_postfix_match: usize,
    collect_limit: usize,
}

impl PredictByDatabase {
    pub const DEFAULT_MIN_POSTFIX_MATCH: usize = 2;

    pub fn new(
        fsa: Arc<dyn Fsa>,
        graminfo: Arc<dyn GramInfoSource>,
        min_postfix_match: usize,
        collect_limit: usize,
    ) -> Self {
        let root = fsa.root();
        Self {
            fsa,
            graminfo,
            root,
            min_postfix_match,
            collect_limit,
        }
    }

    fn collect_nearby(&self, state: Trans) -> Result<Vec<AnnotRecord>> {
        let mut collector = Collector::new(self.collect_limit);
        let visited = self.fsa.collect(
            state,
            &mut |_path, annot| collector.collect(annot),
            true,
            &[],
        )?;
        debug!(
            "Collected {} records from {} annotated states",
            collector.items().len(),
            visited
        );
        collector.into_items()
    }
}

impl RecordFinder for PredictByDatabase {
    fn graminfo(&self) -> &dyn GramInfoSource {
        self.graminfo.as_ref()
    }

    fn find_records(&self, word: &[u8]) -> Result<Option<Vec<AnnotRecord>>> {
        let reversed: Vec<u8> = word.iter().rev().copied().collect();
        let walk = self.fsa.walk(self.root, &reversed, true)?;

        let annot = if walk.matched {
            walk.annot
        } else {
            self.fsa.get_annot(walk.last)?
        };
        let records = match annot {
            Some(annot) => decode_predict(&annot)?,
            None if walk.consumed >= self.min_postfix_match => self.collect_nearby(walk.last)?,
            None => return Ok(None),
        };

        Ok(Some(records).filter(|records| !records.is_empty()))
    }
}
