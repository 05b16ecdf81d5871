//! # Morphier Family
//!
//! Query strategies answering "base form", "all forms" and "all forms with
//! grammatical information" for a word or a batch of words.
//!
//! - [`DictSingle`] and [`DictBulk`] look words up in the dictionary automaton.
//!   [`DictBulk`] walks shared prefixes of a sorted batch only once.
//! - [`PredictBySuffix`] and [`PredictByDatabase`] guess annotations for words
//!   the dictionary does not know.
//! - [`Chain`] tries several morphiers in order. [`WithGramTab`] renders
//!   ancodes as readable tags.
//!
//! Every query returns `Ok(None)` for an unknown word; errors are reserved for
//! corrupt dictionary data.

use std::fmt;

use crate::morphy::graminfo::GramInfoSource;
use crate::morphy::types::error::Result;
use crate::morphy::types::models::{AnnotRecord, BatchResult, FormSet, FormsWithGramInfo};

mod chain;
mod dict;
mod predict;
mod with_gramtab;

pub use chain::Chain;
pub use dict::{DictBulk, DictSingle};
pub use predict::{Collector, PredictByDatabase, PredictBySuffix};
pub use with_gramtab::WithGramTab;

/// A word-form query strategy.
///
/// The batch methods default to looping over the single-word ones; strategies
/// with a cheaper batch path override them.
pub trait Morphier: Send + Sync + fmt::Debug {
    fn base_form(&self, word: &[u8]) -> Result<Option<FormSet>>;

    fn all_forms(&self, word: &[u8]) -> Result<Option<FormSet>>;

    fn all_forms_with_gram_info(&self, word: &[u8]) -> Result<Option<Vec<FormsWithGramInfo>>>;

    fn base_form_batch(&self, words: &[Vec<u8>]) -> Result<BatchResult<FormSet>> {
        words
            .iter()
            .map(|word| Ok((word.clone(), self.base_form(word)?)))
            .collect()
    }

    fn all_forms_batch(&self, words: &[Vec<u8>]) -> Result<BatchResult<FormSet>> {
        words
            .iter()
            .map(|word| Ok((word.clone(), self.all_forms(word)?)))
            .collect()
    }

    fn all_forms_with_gram_info_batch(
        &self,
        words: &[Vec<u8>],
    ) -> Result<BatchResult<Vec<FormsWithGramInfo>>> {
        words
            .iter()
            .map(|word| Ok((word.clone(), self.all_forms_with_gram_info(word)?)))
            .collect()
    }
}

/// Splits `word` into `(prefix, stem)` according to a record's prefix and
/// suffix lengths. Lengths reaching past the word are clamped.
pub(crate) fn split_word<'a>(word: &'a [u8], record: &AnnotRecord) -> (&'a [u8], &'a [u8]) {
    let len = word.len();
    let prefix_len = usize::from(record.cplen).min(len);
    let stem_start = (usize::from(record.cplen) + usize::from(record.plen)).min(len);
    let stem_end = len.saturating_sub(usize::from(record.flen)).max(stem_start);
    (&word[..prefix_len], &word[stem_start..stem_end])
}

/// Adds `prefix + before + stem + after` to `forms` for every flexion pair.
pub(crate) fn push_forms(
    forms: &mut FormSet,
    word: &[u8],
    record: &AnnotRecord,
    flexias: &[Vec<u8>],
) {
    let (prefix, stem) = split_word(word, record);
    for pair in flexias.chunks_exact(2) {
        let (before, after) = (&pair[0], &pair[1]);
        let mut form = Vec::with_capacity(prefix.len() + before.len() + stem.len() + after.len());
        form.extend_from_slice(prefix);
        form.extend_from_slice(before);
        form.extend_from_slice(stem);
        form.extend_from_slice(after);
        forms.insert(form);
    }
}

/// Builds every form of `word` that the records describe.
pub(crate) fn compose_forms(
    word: &[u8],
    records: &[AnnotRecord],
    graminfo: &dyn GramInfoSource,
    only_base: bool,
) -> Result<FormSet> {
    let mut forms = FormSet::new();
    for record in records {
        let flexias = graminfo.read_flexia_data(&record.location, only_base)?;
        push_forms(&mut forms, word, record, &flexias);
    }
    Ok(forms)
}

/// One [`FormsWithGramInfo`] per record: the record's own ancode, all ancodes
/// of its entry and the forms built from it alone.
pub(crate) fn compose_gram_info(
    word: &[u8],
    records: &[AnnotRecord],
    graminfo: &dyn GramInfoSource,
) -> Result<Vec<FormsWithGramInfo>> {
    records
        .iter()
        .map(|record| {
            Ok(FormsWithGramInfo {
                common: record.ancode.to_vec(),
                all: graminfo.read_ancodes(&record.location)?,
                forms: compose_forms(word, std::slice::from_ref(record), graminfo, false)?,
            })
        })
        .collect()
}

/// A morphier that resolves a word to a list of annotation records.
///
/// Implementors get [`Morphier`] for free; forms are composed from the records.
pub trait RecordFinder: Send + Sync + fmt::Debug {
    fn graminfo(&self) -> &dyn GramInfoSource;

    /// Records describing `word`, or `None` if the word is unknown.
    fn find_records(&self, word: &[u8]) -> Result<Option<Vec<AnnotRecord>>>;
}

impl<T: RecordFinder> Morphier for T {
    fn base_form(&self, word: &[u8]) -> Result<Option<FormSet>> {
        self.find_records(word)?
            .map(|records| compose_forms(word, &records, self.graminfo(), true))
            .transpose()
    }

    fn all_forms(&self, word: &[u8]) -> Result<Option<FormSet>> {
        self.find_records(word)?
            .map(|records| compose_forms(word, &records, self.graminfo(), false))
            .transpose()
    }

    fn all_forms_with_gram_info(&self, word: &[u8]) -> Result<Option<Vec<FormsWithGramInfo>>> {
        self.find_records(word)?
            .map(|records| compose_gram_info(word, &records, self.graminfo()))
            .transpose()
    }
}
