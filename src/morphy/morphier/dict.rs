//! Dictionary lookup, one word at a time or a whole batch at once.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, trace};

use super::{compose_gram_info, push_forms, Morphier, RecordFinder};
use crate::morphy::format::annot::decode_common;
use crate::morphy::fsa::{Fsa, Trans};
use crate::morphy::graminfo::GramInfoSource;
use crate::morphy::types::error::Result;
use crate::morphy::types::models::{AnnotRecord, BatchResult, FormSet, FormsWithGramInfo};
use crate::morphy::utils;

/// Looks a single word up by walking it from the automaton root.
#[derive(Debug, Clone)]
pub struct DictSingle {
    fsa: Arc<dyn Fsa>,
    graminfo: Arc<dyn GramInfoSource>,
    root: Trans,
}

impl DictSingle {
    pub fn new(fsa: Arc<dyn Fsa>, graminfo: Arc<dyn GramInfoSource>) -> Self {
        let root = fsa.root();
        Self {
            fsa,
            graminfo,
            root,
        }
    }

    pub fn fsa(&self) -> &Arc<dyn Fsa> {
        &self.fsa
    }
}

impl RecordFinder for DictSingle {
    fn graminfo(&self) -> &dyn GramInfoSource {
        self.graminfo.as_ref()
    }

    fn find_records(&self, word: &[u8]) -> Result<Option<Vec<AnnotRecord>>> {
        let walk = self.fsa.walk(self.root, word, true)?;
        match walk.annot {
            Some(annot) if walk.matched => Ok(Some(decode_common(&annot)?)),
            _ => Ok(None),
        }
    }
}

/// Words of a batch grouped by the raw annotation they resolved to.
#[derive(Debug, Default)]
struct Lookup {
    found: BTreeMap<Vec<u8>, Vec<Vec<u8>>>,
    unknown: Vec<Vec<u8>>,
}

/// Batch lookup that walks each shared prefix of the sorted batch once.
///
/// Words the dictionary does not know are handed to `predictor` one by one,
/// or reported as `None` without one. Single-word queries behave the same way.
#[derive(Debug, Clone)]
pub struct DictBulk {
    single: DictSingle,
    predictor: Option<Arc<dyn Morphier>>,
}

impl DictBulk {
    pub fn new(
        fsa: Arc<dyn Fsa>,
        graminfo: Arc<dyn GramInfoSource>,
        predictor: Option<Arc<dyn Morphier>>,
    ) -> Self {
        Self {
            single: DictSingle::new(fsa, graminfo),
            predictor,
        }
    }

    /// Groups sorted, deduplicated words by their common prefix with the
    /// preceding word. Values are the remaining suffixes.
    fn build_prefix_tree(words: &[Vec<u8>]) -> BTreeMap<&[u8], Vec<&[u8]>> {
        let mut sorted: Vec<&[u8]> = words.iter().map(Vec::as_slice).collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut tree: BTreeMap<&[u8], Vec<&[u8]>> = BTreeMap::new();
        let mut prev: &[u8] = &[];
        for word in sorted {
            let idx = utils::common_prefix_len(prev, word);
            let (prefix, suffix) = word.split_at(idx);
            tree.entry(prefix).or_default().push(suffix);
            prev = word;
        }
        tree
    }

    fn find_words(&self, words: &[Vec<u8>]) -> Result<Lookup> {
        let fsa = &self.single.fsa;
        let mut lookup = Lookup::default();

        let tree = Self::build_prefix_tree(words);
        trace!("Batch of {} words split into {} prefixes", words.len(), tree.len());

        for (prefix, suffixes) in tree {
            let prefix_walk = fsa.walk(self.single.root, prefix, false)?;

            for suffix in suffixes {
                let word = [prefix, suffix].concat();
                if !prefix_walk.matched {
                    lookup.unknown.push(word);
                    continue;
                }
                let walk = fsa.walk(prefix_walk.last, suffix, true)?;
                match walk.annot {
                    Some(annot) if walk.matched => {
                        lookup.found.entry(annot).or_default().push(word)
                    }
                    _ => lookup.unknown.push(word),
                }
            }
        }

        debug!(
            "Batch lookup: {} annotation groups, {} unknown words",
            lookup.found.len(),
            lookup.unknown.len()
        );
        Ok(lookup)
    }

    fn predict<T>(
        &self,
        unknown: Vec<Vec<u8>>,
        result: &mut BatchResult<T>,
        query: impl Fn(&dyn Morphier, &[u8]) -> Result<Option<T>>,
    ) -> Result<()> {
        for word in unknown {
            let predicted = match &self.predictor {
                Some(predictor) => query(predictor.as_ref(), &word)?,
                None => None,
            };
            result.insert(word, predicted);
        }
        Ok(())
    }

    fn forms_batch(&self, words: &[Vec<u8>], only_base: bool) -> Result<BatchResult<FormSet>> {
        let Lookup { found, unknown } = self.find_words(words)?;
        let graminfo = self.single.graminfo.as_ref();
        let mut result = BatchResult::new();

        for (annot, group) in found {
            let records = decode_common(&annot)?;
            let mut forms: Vec<FormSet> = vec![FormSet::new(); group.len()];
            for record in &records {
                let flexias = graminfo.read_flexia_data(&record.location, only_base)?;
                for (word, word_forms) in group.iter().zip(forms.iter_mut()) {
                    push_forms(word_forms, word, record, &flexias);
                }
            }
            result.extend(group.into_iter().zip(forms.into_iter().map(Some)));
        }

        self.predict(unknown, &mut result, |predictor, word| {
            if only_base {
                predictor.base_form(word)
            } else {
                predictor.all_forms(word)
            }
        })?;
        Ok(result)
    }

    fn or_predict<T>(
        &self,
        found: Option<T>,
        word: &[u8],
        query: impl Fn(&dyn Morphier, &[u8]) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        match (found, &self.predictor) {
            (Some(found), _) => Ok(Some(found)),
            (None, Some(predictor)) => query(predictor.as_ref(), word),
            (None, None) => Ok(None),
        }
    }
}

impl Morphier for DictBulk {
    fn base_form(&self, word: &[u8]) -> Result<Option<FormSet>> {
        let found = self.single.base_form(word)?;
        self.or_predict(found, word, |predictor, word| predictor.base_form(word))
    }

    fn all_forms(&self, word: &[u8]) -> Result<Option<FormSet>> {
        let found = self.single.all_forms(word)?;
        self.or_predict(found, word, |predictor, word| predictor.all_forms(word))
    }

    fn all_forms_with_gram_info(&self, word: &[u8]) -> Result<Option<Vec<FormsWithGramInfo>>> {
        let found = self.single.all_forms_with_gram_info(word)?;
        self.or_predict(found, word, |predictor, word| {
            predictor.all_forms_with_gram_info(word)
        })
    }

    fn base_form_batch(&self, words: &[Vec<u8>]) -> Result<BatchResult<FormSet>> {
        self.forms_batch(words, true)
    }

    fn all_forms_batch(&self, words: &[Vec<u8>]) -> Result<BatchResult<FormSet>> {
        self.forms_batch(words, false)
    }

    fn all_forms_with_gram_info_batch(
        &self,
        words: &[Vec<u8>],
    ) -> Result<BatchResult<Vec<FormsWithGramInfo>>> {
        let Lookup { found, unknown } = self.find_words(words)?;
        let graminfo = self.single.graminfo.as_ref();
        let mut result = BatchResult::new();

        for (annot, group) in found {
            let records = decode_common(&annot)?;
            for word in group {
                let infos = compose_gram_info(&word, &records, graminfo)?;
                result.insert(word, Some(infos));
            }
        }

        self.predict(unknown, &mut result, |predictor, word| {
            predictor.all_forms_with_gram_info(word)
        })?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<Vec<u8>> {
        list.iter().map(|w| w.as_bytes().to_vec()).collect()
    }

    #[test]
    fn prefix_tree_groups_by_previous_word() {
        let input = words(&["cats", "cat", "dog", "cat", "car"]);
        let tree = DictBulk::build_prefix_tree(&input);

        // Sorted: car, cat, cats, dog
        let expected: BTreeMap<&[u8], Vec<&[u8]>> = BTreeMap::from([
            (&b""[..], vec![&b"car"[..], &b"dog"[..]]),
            (&b"ca"[..], vec![&b"t"[..]]),
            (&b"cat"[..], vec![&b"s"[..]]),
        ]);
        assert_eq!(tree, expected);
    }

    #[test]
    fn prefix_tree_of_empty_batch() {
        assert!(DictBulk::build_prefix_tree(&[]).is_empty());
    }
}
